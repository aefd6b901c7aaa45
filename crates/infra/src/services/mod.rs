//! Application services: one atomic unit of work per user action.

pub mod catalog;
pub mod consumption;

use thiserror::Error;

use matcon_auth::AuthzError;
use matcon_core::DomainError;

use crate::store::StoreError;

pub use catalog::CatalogService;
pub use consumption::{AdjustmentOutcome, ConsumptionService, NewConsumption};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The unit of work committed but tracking events could not be published.
    #[error("event publication failed: {0}")]
    Publish(String),
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        ServiceError::Domain(value.into())
    }
}

impl ServiceError {
    pub fn domain(&self) -> Option<&DomainError> {
        match self {
            ServiceError::Domain(e) => Some(e),
            _ => None,
        }
    }
}

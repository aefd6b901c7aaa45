//! `matcon-core` — domain foundation building blocks.
//!
//! Identifiers, the domain error taxonomy, aggregate/entity traits and
//! unit-of-measure quantity helpers. No infrastructure concerns.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod quantity;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, CompanyId, UserId};
pub use quantity::UomRounding;
pub use value_object::ValueObject;

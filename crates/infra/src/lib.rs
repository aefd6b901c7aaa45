//! Infrastructure layer: repository, configuration, sequences and the
//! application services driving the consumption workflow.

pub mod config;
pub mod sequence;
pub mod services;
pub mod store;


pub use config::{LogFormat, Settings};
pub use sequence::{
    CONSUMPTION_SEQUENCE, STOCK_MOVE_SEQUENCE, SequenceFormat, SequenceGenerator, Sequences,
};
pub use services::{AdjustmentOutcome, CatalogService, ConsumptionService, NewConsumption, ServiceError};
pub use store::{CompanyTable, Database, InMemoryDatabase, StoreError, Tables};

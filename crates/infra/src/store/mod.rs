//! In-memory repository: tables, company isolation and units of work.

pub mod company_table;
pub mod database;
pub mod tables;

pub use company_table::CompanyTable;
pub use database::{Database, InMemoryDatabase, StoreError};
pub use tables::Tables;

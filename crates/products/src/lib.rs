//! Product catalog as seen by the consumption workflow.
//!
//! Products are owned by the host catalog; this crate only models the fields
//! the workflow reads: storability, unit of measure, cost and the category
//! accounts used for valuation.

pub mod category;
pub mod product;

pub use category::{CategoryAccounts, ProductCategory, ProductCategoryId};
pub use product::{Product, ProductId, ProductKind};

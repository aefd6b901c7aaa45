use serde::{Deserialize, Serialize};

use matcon_accounting::{AccountId, JournalId};
use matcon_core::aggregate_id;

aggregate_id!(
    /// Product category.
    ProductCategoryId
);

/// Accounts a category posts stock valuation to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryAccounts {
    /// Expense account consumed goods are charged to.
    pub expense: AccountId,
    /// Interim account credited when goods come in.
    pub stock_input: AccountId,
    /// Interim account debited when goods go out.
    pub stock_output: AccountId,
    pub stock_valuation: AccountId,
    pub stock_journal: JournalId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductCategory {
    pub id: ProductCategoryId,
    pub name: String,
    pub accounts: CategoryAccounts,
}

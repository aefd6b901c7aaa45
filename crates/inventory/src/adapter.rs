//! Expense routing of consumption moves.
//!
//! Wraps a [`ValuationEngine`]: moves that belong to a consumption get an
//! extra entry moving their value onto an expense account, chosen by the
//! consumption's op type.

use chrono::{DateTime, Utc};

use matcon_accounting::{AccountId, AccountMoveDraft, AnalyticAccountId, without_account};
use matcon_products::Product;

use crate::consumption::{ConsumptionRequest, OpType};
use crate::stock_move::StockMove;
use crate::valuation::{ValuationEngine, expense_redirect};

/// What the adapter needs to know about the owning consumption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConsumptionContext {
    pub op_type: OpType,
    pub expense_account_id: Option<AccountId>,
    pub analytic_account_id: Option<AnalyticAccountId>,
    /// Accounting date of the redirect entries.
    pub date: DateTime<Utc>,
}

impl From<&ConsumptionRequest> for ConsumptionContext {
    fn from(request: &ConsumptionRequest) -> Self {
        Self {
            op_type: request.op_type(),
            expense_account_id: request.expense_account_id(),
            analytic_account_id: request.analytic_account_id(),
            date: request.date(),
        }
    }
}

/// Where the expense side of a consumption move ends up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpenseRoute {
    /// Category expense account, final.
    CategoryExpense,
    /// Nothing posted to expense until an adjustment picks the account.
    Deferred,
    /// Request-level expense account, final.
    OverrideExpense(AccountId),
}

impl ExpenseRoute {
    pub fn select(op_type: OpType, expense_account_id: Option<AccountId>) -> Self {
        match (op_type, expense_account_id) {
            (OpType::Wip, _) => ExpenseRoute::Deferred,
            (OpType::DirectExpense, Some(account)) => ExpenseRoute::OverrideExpense(account),
            (OpType::DirectExpense, None) | (OpType::None, _) => ExpenseRoute::CategoryExpense,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ConsumptionValuationAdapter<E> {
    engine: E,
}

impl<E: ValuationEngine> ConsumptionValuationAdapter<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Journal payloads for a posted move. Moves without a consumption get
    /// the engine's payloads unchanged.
    pub fn journal_payloads(
        &self,
        stock_move: &StockMove,
        product: &Product,
        consumption: Option<&ConsumptionContext>,
    ) -> Vec<AccountMoveDraft> {
        let mut drafts = self.engine.journal_payloads(stock_move, product);
        let Some(consumption) = consumption else {
            return drafts;
        };
        if drafts.is_empty() {
            return drafts;
        }

        let category_expense = product.accounts().expense;
        let amount = stock_move.valued_amount();
        let date = consumption.date.date_naive();
        let analytic = consumption.analytic_account_id;

        drafts.extend(expense_redirect(stock_move, product, category_expense, amount, date, analytic));

        match ExpenseRoute::select(consumption.op_type, consumption.expense_account_id) {
            ExpenseRoute::CategoryExpense => drafts,
            ExpenseRoute::Deferred => without_account(drafts, &category_expense),
            ExpenseRoute::OverrideExpense(account) => {
                let mut kept = without_account(drafts, &category_expense);
                kept.extend(expense_redirect(stock_move, product, account, amount, date, analytic));
                kept
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stock_move::MoveDirection;
    use crate::valuation::StandardValuation;
    use crate::valuation::fixtures::{posted_move, product};
    use matcon_accounting::touches_account;
    use matcon_products::ProductKind;
    use rust_decimal_macros::dec;

    fn context(op_type: OpType, expense_account_id: Option<AccountId>) -> ConsumptionContext {
        ConsumptionContext {
            op_type,
            expense_account_id,
            analytic_account_id: None,
            date: DateTime::<Utc>::from_timestamp(1_650_000_000, 0).unwrap(),
        }
    }

    fn adapter() -> ConsumptionValuationAdapter<StandardValuation> {
        ConsumptionValuationAdapter::new(StandardValuation)
    }

    #[test]
    fn route_selection_by_op_type() {
        let account = AccountId::generate();
        assert_eq!(ExpenseRoute::select(OpType::None, Some(account)), ExpenseRoute::CategoryExpense);
        assert_eq!(ExpenseRoute::select(OpType::DirectExpense, None), ExpenseRoute::CategoryExpense);
        assert_eq!(
            ExpenseRoute::select(OpType::DirectExpense, Some(account)),
            ExpenseRoute::OverrideExpense(account)
        );
        assert_eq!(ExpenseRoute::select(OpType::Wip, Some(account)), ExpenseRoute::Deferred);
    }

    #[test]
    fn moves_without_consumption_fall_through() {
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Outbound, dec!(2));
        let drafts = adapter().journal_payloads(&stock_move, &product, None);
        assert_eq!(drafts, StandardValuation.journal_payloads(&stock_move, &product));
    }

    #[test]
    fn category_expense_is_charged_for_plain_consumption() {
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Outbound, dec!(2));
        let ctx = context(OpType::None, None);
        let drafts = adapter().journal_payloads(&stock_move, &product, Some(&ctx));

        assert_eq!(drafts.len(), 2);
        assert!(touches_account(&drafts, &product.accounts().expense));
        assert_eq!(drafts[1].date, ctx.date.date_naive());
        assert!(drafts.iter().all(|d| d.validate().is_ok()));
    }

    #[test]
    fn wip_defers_the_expense_entry() {
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Outbound, dec!(2));
        let ctx = context(OpType::Wip, None);
        let drafts = adapter().journal_payloads(&stock_move, &product, Some(&ctx));

        assert_eq!(drafts.len(), 1);
        assert!(!touches_account(&drafts, &product.accounts().expense));
        assert!(touches_account(&drafts, &product.accounts().stock_valuation));
    }

    #[test]
    fn direct_expense_override_replaces_category_expense() {
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Inbound, dec!(3));
        let override_account = AccountId::generate();
        let analytic = AnalyticAccountId::generate();
        let ctx = ConsumptionContext {
            analytic_account_id: Some(analytic),
            ..context(OpType::DirectExpense, Some(override_account))
        };
        let drafts = adapter().journal_payloads(&stock_move, &product, Some(&ctx));

        assert_eq!(drafts.len(), 2);
        assert!(!touches_account(&drafts, &product.accounts().expense));
        let line = drafts[1]
            .lines
            .iter()
            .find(|l| l.account_id == override_account)
            .unwrap();
        assert!(!line.is_debit);
        assert_eq!(line.amount, dec!(37.5));
        assert!(line.analytic_distribution.is_some());
    }

    #[test]
    fn non_storable_consumption_posts_nothing() {
        let product = product(ProductKind::Consumable);
        let stock_move = posted_move(&product, MoveDirection::Outbound, dec!(2));
        let ctx = context(OpType::None, None);
        assert!(adapter().journal_payloads(&stock_move, &product, Some(&ctx)).is_empty());
    }
}

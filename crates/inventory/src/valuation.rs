//! Stock valuation: layers for posted moves and the journal payloads that
//! value them.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use matcon_accounting::{
    AccountId, AccountMoveDraft, AnalyticAccountId, AnalyticDistribution, JournalItem,
    tag_account_lines,
};
use matcon_products::Product;

use crate::stock_move::{MoveDirection, StockMove, StockMoveDraft, ValuationLayer};

/// Valuation of stock moves (the host engine).
pub trait ValuationEngine {
    /// Layer recorded when `draft` is posted. Reverse moves are valued at
    /// the cost of the move they revert.
    fn value(&self, draft: &StockMoveDraft, product: &Product, origin: Option<&StockMove>) -> Option<ValuationLayer>;

    /// Journal payloads valuing a posted move.
    fn journal_payloads(&self, stock_move: &StockMove, product: &Product) -> Vec<AccountMoveDraft>;
}

/// Standard-price valuation.
///
/// Inbound: debit stock valuation / credit stock input.
/// Outbound: debit stock output / credit stock valuation.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardValuation;

impl ValuationEngine for StandardValuation {
    fn value(&self, draft: &StockMoveDraft, product: &Product, origin: Option<&StockMove>) -> Option<ValuationLayer> {
        if !product.is_storable() {
            return None;
        }
        let unit_cost = origin
            .and_then(|m| m.valuation.as_ref())
            .map(|layer| layer.unit_cost)
            .unwrap_or(product.standard_price);
        Some(ValuationLayer::new(draft.direction, draft.product_uom_qty, unit_cost))
    }

    fn journal_payloads(&self, stock_move: &StockMove, product: &Product) -> Vec<AccountMoveDraft> {
        let amount = stock_move.valued_amount();
        if !product.is_storable() || amount.is_zero() {
            return Vec::new();
        }
        let accounts = product.accounts();
        let (debit, credit) = match stock_move.direction {
            MoveDirection::Inbound => (accounts.stock_valuation, accounts.stock_input),
            MoveDirection::Outbound => (accounts.stock_output, accounts.stock_valuation),
        };
        vec![entry(
            stock_move,
            product,
            debit,
            credit,
            amount,
            stock_move.date.date_naive(),
        )]
    }
}

/// Entry moving the valued amount between the interim stock account and
/// `expense_account`.
///
/// Inbound: debit stock input / credit expense. Outbound: debit expense /
/// credit stock output. Lines on `expense_account` carry the analytic
/// distribution when one is given. `None` for a zero amount.
pub fn expense_redirect(
    stock_move: &StockMove,
    product: &Product,
    expense_account: AccountId,
    amount: Decimal,
    date: NaiveDate,
    analytic_account: Option<AnalyticAccountId>,
) -> Option<AccountMoveDraft> {
    let amount = amount.abs();
    if amount.is_zero() {
        return None;
    }
    let accounts = product.accounts();
    let (debit, credit) = match stock_move.direction {
        MoveDirection::Inbound => (accounts.stock_input, expense_account),
        MoveDirection::Outbound => (expense_account, accounts.stock_output),
    };
    let mut drafts = [entry(stock_move, product, debit, credit, amount, date)];
    if let Some(analytic) = analytic_account {
        tag_account_lines(&mut drafts, &expense_account, &AnalyticDistribution::full(analytic));
    }
    let [draft] = drafts;
    Some(draft)
}

fn entry(
    stock_move: &StockMove,
    product: &Product,
    debit: AccountId,
    credit: AccountId,
    amount: Decimal,
    date: NaiveDate,
) -> AccountMoveDraft {
    let label = format!("{} - {}", stock_move.reference, product.display_name());
    AccountMoveDraft {
        company_id: stock_move.company_id,
        journal_id: product.accounts().stock_journal,
        date,
        reference: stock_move.reference.clone(),
        stock_move_id: Some(stock_move.id.0),
        lines: vec![
            JournalItem::debit(debit, label.clone(), amount, stock_move.quantity),
            JournalItem::credit(credit, label, amount, stock_move.quantity),
        ],
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::{posted_move, product};
    use super::*;
    use matcon_products::ProductKind;
    use rust_decimal_macros::dec;

    #[test]
    fn outbound_move_credits_valuation() {
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Outbound, dec!(4));
        let drafts = StandardValuation.journal_payloads(&stock_move, &product);

        assert_eq!(drafts.len(), 1);
        let entry = &drafts[0];
        assert!(entry.validate().is_ok());
        assert_eq!(entry.total_debit(), dec!(50));
        assert_eq!(entry.lines[0].account_id, product.accounts().stock_output);
        assert_eq!(entry.lines[1].account_id, product.accounts().stock_valuation);
        assert_eq!(entry.stock_move_id, Some(stock_move.id.0));
    }

    #[test]
    fn non_storable_products_are_not_valued() {
        let product = product(ProductKind::Consumable);
        let stock_move = posted_move(&product, MoveDirection::Inbound, dec!(1));
        assert!(StandardValuation.journal_payloads(&stock_move, &product).is_empty());
        assert!(StandardValuation.value(&stock_move.revert_payload(stock_move.date), &product, None).is_none());
    }

    #[test]
    fn reverse_move_is_valued_at_origin_cost() {
        let mut product = product(ProductKind::Storable);
        let original = posted_move(&product, MoveDirection::Outbound, dec!(2));
        product.standard_price = dec!(99);

        let reverse = original.revert_payload(original.date);
        let layer = StandardValuation.value(&reverse, &product, Some(&original)).unwrap();
        assert_eq!(layer.unit_cost, dec!(12.5));
        assert_eq!(layer.value, dec!(25));
    }

    #[test]
    fn inbound_redirect_credits_expense_with_analytic_tag() {
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Inbound, dec!(2));
        let expense = AccountId::generate();
        let analytic = AnalyticAccountId::generate();

        let redirect = expense_redirect(
            &stock_move,
            &product,
            expense,
            dec!(-25),
            stock_move.date.date_naive(),
            Some(analytic),
        )
        .unwrap();

        assert!(redirect.validate().is_ok());
        let debit = &redirect.lines[0];
        let credit = &redirect.lines[1];
        assert_eq!(debit.account_id, product.accounts().stock_input);
        assert!(debit.analytic_distribution.is_none());
        assert_eq!(credit.account_id, expense);
        assert_eq!(credit.amount, dec!(25));
        assert_eq!(
            credit.analytic_distribution.as_ref().and_then(|d| d.weight(&analytic)),
            Some(dec!(100))
        );
    }

    #[test]
    fn zero_amount_redirect_is_skipped() {
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Outbound, dec!(1));
        let date = stock_move.date.date_naive();
        assert!(expense_redirect(&stock_move, &product, AccountId::generate(), dec!(0), date, None).is_none());
    }
}

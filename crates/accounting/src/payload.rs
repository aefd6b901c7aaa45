//! Post-hoc edits applied to generated journal payloads before posting.

use crate::account::AccountId;
use crate::entry::{AccountMoveDraft, AnalyticDistribution};

/// Whether any draft has a line on `account_id`.
pub fn touches_account(drafts: &[AccountMoveDraft], account_id: &AccountId) -> bool {
    drafts.iter().any(|d| d.touches(account_id))
}

/// Drop every draft that has at least one line on `account_id`.
///
/// Whole entries are removed, never single lines, so what remains stays
/// balanced.
pub fn without_account(drafts: Vec<AccountMoveDraft>, account_id: &AccountId) -> Vec<AccountMoveDraft> {
    drafts.into_iter().filter(|d| !d.touches(account_id)).collect()
}

/// Attach `distribution` to every line posted on `account_id`.
pub fn tag_account_lines(
    drafts: &mut [AccountMoveDraft],
    account_id: &AccountId,
    distribution: &AnalyticDistribution,
) {
    drafts
        .iter_mut()
        .flat_map(|d| d.lines.iter_mut())
        .filter(|line| &line.account_id == account_id)
        .for_each(|line| line.analytic_distribution = Some(distribution.clone()));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnalyticAccountId, JournalId, JournalItem};
    use chrono::NaiveDate;
    use matcon_core::CompanyId;
    use rust_decimal_macros::dec;

    fn entry(debit: AccountId, credit: AccountId) -> AccountMoveDraft {
        AccountMoveDraft {
            company_id: CompanyId::new(),
            journal_id: JournalId::generate(),
            date: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
            reference: "ref".into(),
            stock_move_id: None,
            lines: vec![
                JournalItem::debit(debit, "ref", dec!(5), dec!(1)),
                JournalItem::credit(credit, "ref", dec!(5), dec!(1)),
            ],
        }
    }

    #[test]
    fn drafts_touching_the_account_are_dropped_whole() {
        let (expense, output, valuation) =
            (AccountId::generate(), AccountId::generate(), AccountId::generate());
        let drafts = vec![entry(output, valuation), entry(expense, output)];

        let kept = without_account(drafts, &expense);
        assert_eq!(kept.len(), 1);
        assert!(!touches_account(&kept, &expense));
        assert!(kept[0].validate().is_ok());
    }

    #[test]
    fn only_lines_on_the_account_are_tagged() {
        let (expense, output) = (AccountId::generate(), AccountId::generate());
        let analytic = AnalyticAccountId::generate();
        let mut drafts = vec![entry(expense, output)];

        tag_account_lines(&mut drafts, &expense, &AnalyticDistribution::full(analytic));

        let lines = &drafts[0].lines;
        assert_eq!(
            lines[0].analytic_distribution.as_ref().and_then(|d| d.weight(&analytic)),
            Some(dec!(100))
        );
        assert!(lines[1].analytic_distribution.is_none());
    }
}

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matcon_core::{AggregateId, CompanyId, DomainError, DomainResult, Entity, ValueObject, aggregate_id};

use crate::account::{AccountId, AnalyticAccountId, JournalId};

aggregate_id!(
    /// Posted journal entry.
    AccountMoveId
);

/// Percentage split of a journal line over analytic accounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalyticDistribution(BTreeMap<AnalyticAccountId, Decimal>);

impl AnalyticDistribution {
    /// 100% on a single analytic account.
    pub fn full(account: AnalyticAccountId) -> Self {
        let mut map = BTreeMap::new();
        map.insert(account, Decimal::ONE_HUNDRED);
        Self(map)
    }

    pub fn weight(&self, account: &AnalyticAccountId) -> Option<Decimal> {
        self.0.get(account).copied()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &AnalyticAccountId> {
        self.0.keys()
    }
}

impl ValueObject for AnalyticDistribution {}

/// One side of a journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalItem {
    pub account_id: AccountId,
    pub name: String,
    /// Positive amount in company currency.
    pub amount: Decimal,
    /// true = debit, false = credit.
    pub is_debit: bool,
    pub quantity: Decimal,
    pub analytic_distribution: Option<AnalyticDistribution>,
}

impl JournalItem {
    pub fn debit(account_id: AccountId, name: impl Into<String>, amount: Decimal, quantity: Decimal) -> Self {
        Self {
            account_id,
            name: name.into(),
            amount,
            is_debit: true,
            quantity,
            analytic_distribution: None,
        }
    }

    pub fn credit(account_id: AccountId, name: impl Into<String>, amount: Decimal, quantity: Decimal) -> Self {
        Self {
            account_id,
            name: name.into(),
            amount,
            is_debit: false,
            quantity,
            analytic_distribution: None,
        }
    }

    /// Signed balance: debit positive, credit negative.
    pub fn balance(&self) -> Decimal {
        if self.is_debit { self.amount } else { -self.amount }
    }
}

/// Journal entry payload, not yet posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMoveDraft {
    pub company_id: CompanyId,
    pub journal_id: JournalId,
    pub date: NaiveDate,
    pub reference: String,
    /// Stock move this entry values, if any.
    pub stock_move_id: Option<AggregateId>,
    pub lines: Vec<JournalItem>,
}

impl AccountMoveDraft {
    pub fn touches(&self, account_id: &AccountId) -> bool {
        self.lines.iter().any(|l| &l.account_id == account_id)
    }

    pub fn total_debit(&self) -> Decimal {
        self.lines.iter().filter(|l| l.is_debit).map(|l| l.amount).sum()
    }

    pub fn total_credit(&self) -> Decimal {
        self.lines.iter().filter(|l| !l.is_debit).map(|l| l.amount).sum()
    }

    /// Posting preconditions: at least one line, positive amounts, balanced.
    pub fn validate(&self) -> DomainResult<()> {
        if self.lines.is_empty() {
            return Err(DomainError::validation("journal entry must have lines"));
        }
        if self.lines.iter().any(|l| l.amount <= Decimal::ZERO) {
            return Err(DomainError::validation("amount must be positive"));
        }
        if self.total_debit() != self.total_credit() {
            return Err(DomainError::invariant("debits must equal credits"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountMoveState {
    Posted,
}

/// Posted journal entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMove {
    pub id: AccountMoveId,
    pub company_id: CompanyId,
    pub journal_id: JournalId,
    pub date: NaiveDate,
    pub reference: String,
    pub stock_move_id: Option<AggregateId>,
    pub lines: Vec<JournalItem>,
    pub state: AccountMoveState,
    pub posted_at: DateTime<Utc>,
}

impl AccountMove {
    /// Validate and post a draft.
    pub fn post(id: AccountMoveId, draft: AccountMoveDraft, posted_at: DateTime<Utc>) -> DomainResult<Self> {
        draft.validate()?;
        Ok(Self {
            id,
            company_id: draft.company_id,
            journal_id: draft.journal_id,
            date: draft.date,
            reference: draft.reference,
            stock_move_id: draft.stock_move_id,
            lines: draft.lines,
            state: AccountMoveState::Posted,
            posted_at,
        })
    }

    /// First line posted on any of `accounts`.
    pub fn line_on(&self, accounts: &[AccountId]) -> Option<&JournalItem> {
        self.lines.iter().find(|l| accounts.contains(&l.account_id))
    }
}

impl Entity for AccountMove {
    type Id = AccountMoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

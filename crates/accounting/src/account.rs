use serde::{Deserialize, Serialize};

use matcon_core::{CompanyId, aggregate_id};

aggregate_id!(
    /// General ledger account.
    AccountId
);

aggregate_id!(
    /// Accounting journal (e.g. the stock journal of a product category).
    JournalId
);

aggregate_id!(
    /// Analytic (cost-center) account.
    AnalyticAccountId
);

/// High-level account kind (determines normal balance side).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

/// Account identifier + metadata.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub code: String, // e.g. "610000"
    pub name: String,
    pub kind: AccountKind,
    /// `None` for accounts shared by every company.
    #[serde(default)]
    pub company_id: Option<CompanyId>,
}

impl Account {
    /// Account visible to `company` (own or shared).
    pub fn is_available_to(&self, company: CompanyId) -> bool {
        self.company_id.is_none_or(|c| c == company)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(company_id: Option<CompanyId>) -> Account {
        Account {
            id: AccountId::generate(),
            code: "6100".into(),
            name: "Project expenses".into(),
            kind: AccountKind::Expense,
            company_id,
        }
    }

    #[test]
    fn shared_accounts_are_visible_to_every_company() {
        let company = CompanyId::new();
        assert!(account(None).is_available_to(company));
        assert!(account(Some(company)).is_available_to(company));
        assert!(!account(Some(CompanyId::new())).is_available_to(company));
    }

    #[test]
    fn company_defaults_to_shared_when_omitted() {
        let json = r#"{"id":"0190a6a4-7c3e-7cc2-9b1e-5a4d3c2b1a00","code":"6100","name":"Expenses","kind":"expense"}"#;
        let account: Account = serde_json::from_str(json).unwrap();
        assert_eq!(account.company_id, None);
    }
}

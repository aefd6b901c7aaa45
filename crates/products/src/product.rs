use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matcon_core::{CompanyId, Entity, UomRounding, aggregate_id};

use crate::category::{CategoryAccounts, ProductCategory};

aggregate_id!(
    /// Product variant.
    ProductId
);

/// Product type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    /// Tracked and valued in stock.
    Storable,
    /// Tracked but not valued.
    Consumable,
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    /// `None` = shared between companies.
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub default_code: Option<String>,
    pub kind: ProductKind,
    pub uom_rounding: UomRounding,
    /// Unit cost in company currency.
    pub standard_price: Decimal,
    pub category: ProductCategory,
}

impl Product {
    pub fn is_storable(&self) -> bool {
        self.kind == ProductKind::Storable
    }

    /// Product visible to `company` (own or shared).
    pub fn is_available_to(&self, company: CompanyId) -> bool {
        self.company_id.is_none_or(|c| c == company)
    }

    /// Storable product selectable on a consumption request of `company`.
    pub fn is_consumable_by(&self, company: CompanyId) -> bool {
        self.is_storable() && self.is_available_to(company)
    }

    pub fn accounts(&self) -> &CategoryAccounts {
        &self.category.accounts
    }

    /// `[CODE] Name` when a reference code is set.
    pub fn display_name(&self) -> String {
        match &self.default_code {
            Some(code) => format!("[{code}] {}", self.name),
            None => self.name.clone(),
        }
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::ProductCategoryId;
    use matcon_accounting::{AccountId, JournalId};
    use rust_decimal_macros::dec;

    fn product(kind: ProductKind, company_id: Option<CompanyId>) -> Product {
        Product {
            id: ProductId::generate(),
            company_id,
            name: "Steel sheet".into(),
            default_code: Some("STL-01".into()),
            kind,
            uom_rounding: UomRounding::UNIT,
            standard_price: dec!(4.20),
            category: ProductCategory {
                id: ProductCategoryId::generate(),
                name: "Raw".into(),
                accounts: CategoryAccounts {
                    expense: AccountId::generate(),
                    stock_input: AccountId::generate(),
                    stock_output: AccountId::generate(),
                    stock_valuation: AccountId::generate(),
                    stock_journal: JournalId::generate(),
                },
            },
        }
    }

    #[test]
    fn only_storable_products_of_the_company_are_consumable() {
        let company = CompanyId::new();
        assert!(product(ProductKind::Storable, None).is_consumable_by(company));
        assert!(product(ProductKind::Storable, Some(company)).is_consumable_by(company));
        assert!(!product(ProductKind::Storable, Some(CompanyId::new())).is_consumable_by(company));
        assert!(!product(ProductKind::Consumable, None).is_consumable_by(company));
    }

    #[test]
    fn display_name_includes_code() {
        assert_eq!(product(ProductKind::Storable, None).display_name(), "[STL-01] Steel sheet");
    }
}

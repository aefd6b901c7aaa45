//! On-hand stock as seen by the workflow (read-only).

use rust_decimal::Decimal;

use matcon_core::CompanyId;
use matcon_products::ProductId;

use crate::location::LocationId;

/// Live on-hand quantity query, provided by the stock collaborator.
pub trait QuantityOnHand {
    fn quantity_on_hand(&self, company: CompanyId, product: ProductId, location: LocationId) -> Decimal;
}

impl<T: QuantityOnHand + ?Sized> QuantityOnHand for &T {
    fn quantity_on_hand(&self, company: CompanyId, product: ProductId, location: LocationId) -> Decimal {
        (**self).quantity_on_hand(company, product, location)
    }
}

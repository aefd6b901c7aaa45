use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matcon_core::{CompanyId, Entity, UomRounding, aggregate_id};
use matcon_products::ProductId;

use crate::consumption::ConsumptionRequestId;
use crate::location::LocationId;
use crate::stock::QuantityOnHand;
use crate::stock_move::{MoveDirection, StockMoveDraft, StockMoveLine};

aggregate_id!(
    /// Consumption line.
    ConsumptionLineId
);

/// Name of a move that confirms the on-hand quantity.
pub const QUANTITY_CONFIRMED: &str = "Product Quantity Confirmed";
/// Name of a move that changes the on-hand quantity.
pub const QUANTITY_UPDATED: &str = "Product Quantity Updated";

/// One (location, product) pairing of a consumption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionLine {
    pub id: ConsumptionLineId,
    pub consumption_id: ConsumptionRequestId,
    pub company_id: CompanyId,
    pub product_id: ProductId,
    pub location_id: LocationId,
    /// Quantity declared as consumed. Negative values return goods to stock.
    pub consume_qty: Decimal,
}

/// Quantities derived from the live on-hand stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineQuantities {
    pub theoretical_qty: Decimal,
    pub counted_qty: Decimal,
    pub variance: Decimal,
}

impl LineQuantities {
    pub fn derive(theoretical_qty: Decimal, consume_qty: Decimal) -> Self {
        let counted_qty = theoretical_qty - consume_qty;
        Self {
            theoretical_qty,
            counted_qty,
            variance: counted_qty - theoretical_qty,
        }
    }
}

/// Options for move construction (date override, explicit name).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveContext {
    pub today: DateTime<Utc>,
    pub force_period_date: Option<DateTime<Utc>>,
    pub inventory_name: Option<String>,
}

impl MoveContext {
    pub fn at(today: DateTime<Utc>) -> Self {
        Self {
            today,
            force_period_date: None,
            inventory_name: None,
        }
    }

    pub fn with_period_date(mut self, date: DateTime<Utc>) -> Self {
        self.force_period_date = Some(date);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.inventory_name = Some(name.into());
        self
    }

    fn date(&self) -> DateTime<Utc> {
        self.force_period_date.unwrap_or(self.today)
    }
}

impl ConsumptionLine {
    pub fn new(
        consumption_id: ConsumptionRequestId,
        company_id: CompanyId,
        product_id: ProductId,
        location_id: LocationId,
    ) -> Self {
        Self {
            id: ConsumptionLineId::generate(),
            consumption_id,
            company_id,
            product_id,
            location_id,
            consume_qty: Decimal::ZERO,
        }
    }

    /// One line per (location, product): locations outer, products inner.
    pub fn cross_product(
        consumption_id: ConsumptionRequestId,
        company_id: CompanyId,
        location_ids: &[LocationId],
        product_ids: &[ProductId],
    ) -> Vec<Self> {
        location_ids
            .iter()
            .flat_map(|location_id| {
                product_ids
                    .iter()
                    .map(move |product_id| Self::new(consumption_id, company_id, *product_id, *location_id))
            })
            .collect()
    }

    /// Theoretical quantity is read from current stock on every call.
    pub fn quantities(&self, stock: &impl QuantityOnHand) -> LineQuantities {
        let theoretical = stock.quantity_on_hand(self.company_id, self.product_id, self.location_id);
        LineQuantities::derive(theoretical, self.consume_qty)
    }

    /// Move + move-line values for moving `qty` from `location_id` to
    /// `location_dest_id`.
    pub fn build_move_payload(
        &self,
        qty: Decimal,
        location_id: LocationId,
        location_dest_id: LocationId,
        is_outbound: bool,
        ctx: &MoveContext,
    ) -> StockMoveDraft {
        let name = ctx.inventory_name.clone().unwrap_or_else(|| {
            if qty.is_zero() {
                QUANTITY_CONFIRMED.to_string()
            } else {
                QUANTITY_UPDATED.to_string()
            }
        });
        let date = ctx.date();
        let direction = if is_outbound {
            MoveDirection::Outbound
        } else {
            MoveDirection::Inbound
        };

        StockMoveDraft {
            name,
            product_id: self.product_id,
            product_uom_qty: qty,
            company_id: self.company_id,
            location_id,
            location_dest_id,
            direction,
            is_inventory: true,
            date,
            consumption_id: Some(self.consumption_id),
            origin_move_id: None,
            move_line: StockMoveLine {
                product_id: self.product_id,
                qty_done: qty,
                location_id,
                location_dest_id,
                company_id: self.company_id,
                date,
            },
        }
    }

    /// Move settling the variance, `None` when it rounds to zero.
    ///
    /// Negative variance moves stock out to `consumption_location`, positive
    /// variance brings it back.
    pub fn variance_move(
        &self,
        quantities: &LineQuantities,
        rounding: UomRounding,
        consumption_location: LocationId,
        ctx: &MoveContext,
    ) -> Option<StockMoveDraft> {
        if rounding.is_zero(quantities.variance) {
            return None;
        }
        let qty = rounding.round(quantities.variance.abs());
        let draft = if quantities.variance.is_sign_negative() {
            self.build_move_payload(qty, self.location_id, consumption_location, true, ctx)
        } else {
            self.build_move_payload(qty, consumption_location, self.location_id, false, ctx)
        };
        Some(draft)
    }
}

impl Entity for ConsumptionLine {
    type Id = ConsumptionLineId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// A line as presented to users, with its derived quantities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionLineView {
    #[serde(flatten)]
    pub line: ConsumptionLine,
    #[serde(flatten)]
    pub quantities: LineQuantities,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    struct FixedStock(Decimal);

    impl QuantityOnHand for FixedStock {
        fn quantity_on_hand(&self, _: CompanyId, _: ProductId, _: LocationId) -> Decimal {
            self.0
        }
    }

    fn line(consume_qty: Decimal) -> ConsumptionLine {
        let mut line = ConsumptionLine::new(
            ConsumptionRequestId::generate(),
            CompanyId::new(),
            ProductId::generate(),
            LocationId::generate(),
        );
        line.consume_qty = consume_qty;
        line
    }

    fn today() -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn consumption_becomes_outbound_move_to_consumption_location() {
        let line = line(dec!(3));
        let q = line.quantities(&FixedStock(dec!(10)));
        assert_eq!(q.counted_qty, dec!(7));
        assert_eq!(q.variance, dec!(-3));

        let consumed = LocationId::generate();
        let draft = line
            .variance_move(&q, UomRounding::UNIT, consumed, &MoveContext::at(today()))
            .unwrap();
        assert_eq!(draft.direction, MoveDirection::Outbound);
        assert_eq!(draft.product_uom_qty, dec!(3));
        assert_eq!(draft.location_id, line.location_id);
        assert_eq!(draft.location_dest_id, consumed);
        assert_eq!(draft.name, QUANTITY_UPDATED);
        assert_eq!(draft.consumption_id, Some(line.consumption_id));
    }

    #[test]
    fn zero_variance_produces_no_move() {
        let line = line(Decimal::ZERO);
        let q = line.quantities(&FixedStock(dec!(5)));
        assert_eq!(q.counted_qty, dec!(5));
        let ctx = MoveContext::at(today());
        assert!(line.variance_move(&q, UomRounding::UNIT, LocationId::generate(), &ctx).is_none());
    }

    #[test]
    fn variance_below_rounding_is_ignored() {
        let line = line(dec!(0.0004));
        let q = line.quantities(&FixedStock(dec!(2)));
        let rounding = UomRounding::new(dec!(0.001)).unwrap();
        let ctx = MoveContext::at(today());
        assert!(line.variance_move(&q, rounding, LocationId::generate(), &ctx).is_none());
    }

    #[test]
    fn payload_name_and_date_follow_context() {
        let line = line(Decimal::ZERO);
        let (a, b) = (LocationId::generate(), LocationId::generate());
        let period = DateTime::<Utc>::from_timestamp(1_600_000_000, 0).unwrap();

        let confirmed = line.build_move_payload(Decimal::ZERO, a, b, false, &MoveContext::at(today()));
        assert_eq!(confirmed.name, QUANTITY_CONFIRMED);
        assert_eq!(confirmed.date, today());
        assert!(confirmed.is_inventory);

        let ctx = MoveContext::at(today()).with_period_date(period).with_name("Year-end count");
        let named = line.build_move_payload(dec!(1), a, b, true, &ctx);
        assert_eq!(named.name, "Year-end count");
        assert_eq!(named.date, period);
        assert_eq!(named.move_line.date, period);
        assert_eq!(named.move_line.qty_done, dec!(1));
    }

    #[test]
    fn cross_product_iterates_locations_then_products() {
        let (l1, l2) = (LocationId::generate(), LocationId::generate());
        let (p1, p2) = (ProductId::generate(), ProductId::generate());
        let lines = ConsumptionLine::cross_product(
            ConsumptionRequestId::generate(),
            CompanyId::new(),
            &[l1, l2],
            &[p1, p2],
        );
        let pairs: Vec<_> = lines.iter().map(|l| (l.location_id, l.product_id)).collect();
        assert_eq!(pairs, vec![(l1, p1), (l1, p2), (l2, p1), (l2, p2)]);
    }

    proptest! {
        #[test]
        fn cross_product_has_one_line_per_pair(locations in 0usize..6, products in 0usize..6) {
            let location_ids: Vec<_> = (0..locations).map(|_| LocationId::generate()).collect();
            let product_ids: Vec<_> = (0..products).map(|_| ProductId::generate()).collect();
            let lines = ConsumptionLine::cross_product(
                ConsumptionRequestId::generate(),
                CompanyId::new(),
                &location_ids,
                &product_ids,
            );
            prop_assert_eq!(lines.len(), locations * products);
        }

        #[test]
        fn move_direction_follows_variance_sign(theoretical in 0i64..1_000, consumed in -500i64..500) {
            let line = line(Decimal::from(consumed));
            let q = line.quantities(&FixedStock(Decimal::from(theoretical)));
            prop_assert_eq!(q.variance, Decimal::from(-consumed));

            let ctx = MoveContext::at(today());
            let draft = line.variance_move(&q, UomRounding::UNIT, LocationId::generate(), &ctx);
            match consumed.signum() {
                0 => prop_assert!(draft.is_none()),
                1 => {
                    let d = draft.unwrap();
                    prop_assert_eq!(d.direction, MoveDirection::Outbound);
                    prop_assert_eq!(d.product_uom_qty, Decimal::from(consumed));
                }
                _ => {
                    let d = draft.unwrap();
                    prop_assert_eq!(d.direction, MoveDirection::Inbound);
                    prop_assert_eq!(d.location_dest_id, line.location_id);
                }
            }
        }
    }
}

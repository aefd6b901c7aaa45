use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matcon_core::{CompanyId, Entity, aggregate_id};
use matcon_products::ProductId;

use crate::consumption::ConsumptionRequestId;
use crate::location::LocationId;

aggregate_id!(
    /// Stock move.
    StockMoveId
);

/// Direction relative to the company's own stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDirection {
    /// Into an internal location (valued as stock in).
    Inbound,
    /// Out of an internal location (valued as stock out).
    Outbound,
}

impl MoveDirection {
    pub fn reversed(self) -> Self {
        match self {
            MoveDirection::Inbound => MoveDirection::Outbound,
            MoveDirection::Outbound => MoveDirection::Inbound,
        }
    }
}

/// The single detailed operation carried by a move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoveLine {
    pub product_id: ProductId,
    pub qty_done: Decimal,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
    pub company_id: CompanyId,
    pub date: DateTime<Utc>,
}

/// Values of a move before it is posted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMoveDraft {
    pub name: String,
    pub product_id: ProductId,
    pub product_uom_qty: Decimal,
    pub company_id: CompanyId,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
    pub direction: MoveDirection,
    /// Inventory adjustment move (no picking).
    pub is_inventory: bool,
    pub date: DateTime<Utc>,
    pub consumption_id: Option<ConsumptionRequestId>,
    /// Move this one reverts, if any.
    pub origin_move_id: Option<StockMoveId>,
    pub move_line: StockMoveLine,
}

impl StockMoveDraft {
    pub fn for_consumption(mut self, consumption_id: ConsumptionRequestId) -> Self {
        self.consumption_id = Some(consumption_id);
        self
    }

    /// Stamp the move and its move line to `date`.
    pub fn dated(mut self, date: DateTime<Utc>) -> Self {
        self.date = date;
        self.move_line.date = date;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockMoveState {
    Done,
}

/// Valuation recorded when a move is posted. Quantity and value are signed
/// (negative for outbound).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValuationLayer {
    pub quantity: Decimal,
    pub unit_cost: Decimal,
    pub value: Decimal,
}

impl ValuationLayer {
    pub fn new(direction: MoveDirection, quantity: Decimal, unit_cost: Decimal) -> Self {
        let signed = match direction {
            MoveDirection::Inbound => quantity,
            MoveDirection::Outbound => -quantity,
        };
        Self {
            quantity: signed,
            unit_cost,
            value: signed * unit_cost,
        }
    }
}

/// A posted stock move.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMove {
    pub id: StockMoveId,
    /// Posting reference, e.g. `WH/INV/00004`.
    pub reference: String,
    pub name: String,
    pub product_id: ProductId,
    pub quantity: Decimal,
    pub company_id: CompanyId,
    pub location_id: LocationId,
    pub location_dest_id: LocationId,
    pub direction: MoveDirection,
    pub is_inventory: bool,
    pub date: DateTime<Utc>,
    pub consumption_id: Option<ConsumptionRequestId>,
    pub origin_move_id: Option<StockMoveId>,
    pub state: StockMoveState,
    pub move_line: StockMoveLine,
    /// `None` for products that are not valued.
    pub valuation: Option<ValuationLayer>,
}

impl StockMove {
    pub fn done(
        id: StockMoveId,
        reference: impl Into<String>,
        draft: StockMoveDraft,
        valuation: Option<ValuationLayer>,
    ) -> Self {
        Self {
            id,
            reference: reference.into(),
            name: draft.name,
            product_id: draft.product_id,
            quantity: draft.product_uom_qty,
            company_id: draft.company_id,
            location_id: draft.location_id,
            location_dest_id: draft.location_dest_id,
            direction: draft.direction,
            is_inventory: draft.is_inventory,
            date: draft.date,
            consumption_id: draft.consumption_id,
            origin_move_id: draft.origin_move_id,
            state: StockMoveState::Done,
            move_line: draft.move_line,
            valuation,
        }
    }

    /// Valued amount (absolute), zero when the move is not valued.
    pub fn valued_amount(&self) -> Decimal {
        self.valuation
            .as_ref()
            .map(|v| v.value.abs())
            .unwrap_or(Decimal::ZERO)
    }

    /// Reverse move: same product and quantity, locations swapped, still
    /// linked to the same consumption.
    pub fn revert_payload(&self, date: DateTime<Utc>) -> StockMoveDraft {
        let name = format!("{} [reverted]", self.reference);
        StockMoveDraft {
            name,
            product_id: self.product_id,
            product_uom_qty: self.quantity,
            company_id: self.company_id,
            location_id: self.location_dest_id,
            location_dest_id: self.location_id,
            direction: self.direction.reversed(),
            is_inventory: self.is_inventory,
            date,
            consumption_id: self.consumption_id,
            origin_move_id: Some(self.id),
            move_line: StockMoveLine {
                product_id: self.product_id,
                qty_done: self.move_line.qty_done,
                location_id: self.move_line.location_dest_id,
                location_dest_id: self.move_line.location_id,
                company_id: self.company_id,
                date,
            },
        }
    }
}

impl Entity for StockMove {
    type Id = StockMoveId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use matcon_accounting::{AccountId, AnalyticAccountId, AccountMove};
use matcon_core::{AggregateRoot, UserId};
use matcon_inventory::{
    AdjustmentWizard, ConsumptionLineId, ConsumptionRequest, ConsumptionRequestId,
    ConsumptionState, LocationId, OpType, StockMoveId,
};
use matcon_products::ProductId;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct SetConsumeQtyRequest {
    pub consume_qty: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ValidateLinesRequest {
    pub line_ids: Vec<ConsumptionLineId>,
}

#[derive(Debug, Deserialize)]
pub struct AdjustmentRequest {
    pub account_id: AccountId,
}

#[derive(Debug, Deserialize)]
pub struct BatchAdjustmentRequest {
    pub consumption_ids: Vec<ConsumptionRequestId>,
    pub account_id: AccountId,
}

#[derive(Debug, Deserialize)]
pub struct ConsumptionLocationRequest {
    pub location_id: LocationId,
    /// Set for a per-product override, omitted for the company default.
    #[serde(default)]
    pub product_id: Option<ProductId>,
}

#[derive(Debug, Deserialize)]
pub struct QuantityRequest {
    pub product_id: ProductId,
    pub location_id: LocationId,
    pub quantity: Decimal,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
pub struct ConsumptionResponse {
    pub id: ConsumptionRequestId,
    pub reference: String,
    pub state: ConsumptionState,
    pub date: DateTime<Utc>,
    pub requester_id: Option<UserId>,
    pub approver_id: Option<UserId>,
    pub location_ids: Vec<LocationId>,
    pub product_ids: Vec<ProductId>,
    pub op_type: OpType,
    pub expense_account_id: Option<AccountId>,
    pub analytic_account_id: Option<AnalyticAccountId>,
    pub adjusted: bool,
    pub adjustment_account_id: Option<AccountId>,
    pub move_ids: Vec<StockMoveId>,
    pub version: u64,
}

impl From<&ConsumptionRequest> for ConsumptionResponse {
    fn from(r: &ConsumptionRequest) -> Self {
        Self {
            id: r.id_typed(),
            reference: r.reference().to_string(),
            state: r.state(),
            date: r.date(),
            requester_id: r.requester(),
            approver_id: r.approver(),
            location_ids: r.location_ids().to_vec(),
            product_ids: r.product_ids().to_vec(),
            op_type: r.op_type(),
            expense_account_id: r.expense_account_id(),
            analytic_account_id: r.analytic_account_id(),
            adjusted: r.adjusted(),
            adjustment_account_id: r.adjustment_account_id(),
            move_ids: r.move_ids().to_vec(),
            version: r.version(),
        }
    }
}

pub fn consumptions(requests: &[ConsumptionRequest]) -> Vec<ConsumptionResponse> {
    requests.iter().map(ConsumptionResponse::from).collect()
}

/// Requests an adjustment would post, before it runs.
#[derive(Debug, Serialize)]
pub struct AdjustmentPreview {
    pub consumption_ids: Vec<ConsumptionRequestId>,
}

impl From<&AdjustmentWizard> for AdjustmentPreview {
    fn from(w: &AdjustmentWizard) -> Self {
        Self {
            consumption_ids: w.consumption_ids().to_vec(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AccountMovesResponse {
    pub has_account_moves: bool,
    pub entries: Vec<AccountMove>,
}

//! Material consumption domain.
//!
//! The consumption request aggregate, its lines, the stock moves settling
//! line variances, and the valuation of those moves (expense routing and
//! later adjustment of deferred entries). Pure domain logic: stock levels,
//! persistence and posting are provided by the caller.

pub mod adapter;
pub mod adjustment;
pub mod consumption;
pub mod line;
pub mod location;
pub mod stock;
pub mod stock_move;
pub mod valuation;

pub use adapter::{ConsumptionContext, ConsumptionValuationAdapter, ExpenseRoute};
pub use adjustment::{AdjustmentWizard, adjustment_entries};
pub use consumption::{
    ApproveConsumption, CancelConsumption, ConsumptionAdjusted, ConsumptionApproved,
    ConsumptionCancelled, ConsumptionChanges, ConsumptionCommand, ConsumptionCreated,
    ConsumptionEvent, ConsumptionRejected, ConsumptionRequest, ConsumptionRequestId,
    ConsumptionResetToDraft, ConsumptionStarted, ConsumptionState, ConsumptionUpdated,
    ConsumptionValidated, CreateConsumption, MarkConsumptionAdjusted, OpType, RejectConsumption,
    ResetConsumptionToDraft, StartConsumption, UNNUMBERED_REFERENCE, UpdateConsumption,
    ValidateConsumption,
};
pub use line::{
    ConsumptionLine, ConsumptionLineId, ConsumptionLineView, LineQuantities, MoveContext,
    QUANTITY_CONFIRMED, QUANTITY_UPDATED,
};
pub use location::{ConsumptionLocations, Location, LocationId, LocationUsage};
pub use stock::QuantityOnHand;
pub use stock_move::{
    MoveDirection, StockMove, StockMoveDraft, StockMoveId, StockMoveLine, StockMoveState,
    ValuationLayer,
};
pub use valuation::{StandardValuation, ValuationEngine, expense_redirect};

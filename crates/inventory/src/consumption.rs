use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use matcon_accounting::{AccountId, AnalyticAccountId};
use matcon_core::{Aggregate, AggregateRoot, CompanyId, DomainError, UserId, aggregate_id};
use matcon_events::Event;
use matcon_products::ProductId;

use crate::location::LocationId;
use crate::stock_move::StockMoveId;

aggregate_id!(
    /// Consumption request identifier (company-scoped via `company_id` fields).
    ConsumptionRequestId
);

/// Reference of a request that has not been numbered yet.
pub const UNNUMBERED_REFERENCE: &str = "New";

/// Lifecycle of a consumption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsumptionState {
    Draft,
    PendingApproval,
    Approved,
    Validated,
    Cancelled,
}

impl ConsumptionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConsumptionState::Draft => "draft",
            ConsumptionState::PendingApproval => "pending_approval",
            ConsumptionState::Approved => "approved",
            ConsumptionState::Validated => "validated",
            ConsumptionState::Cancelled => "cancelled",
        }
    }

    /// Lines and header are frozen; the record is kept for audit.
    pub fn is_final(&self) -> bool {
        matches!(self, ConsumptionState::Validated | ConsumptionState::Cancelled)
    }
}

impl core::fmt::Display for ConsumptionState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the valuation of consumed goods is booked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    /// Category expense account, final.
    #[default]
    None,
    /// Expense account, optionally overridden on the request, final.
    DirectExpense,
    /// Work in progress: expense posting deferred until adjusted.
    Wip,
}

impl OpType {
    /// Only deferred requests can be adjusted later.
    pub fn defers_expense(&self) -> bool {
        matches!(self, OpType::Wip)
    }
}

/// Aggregate root: ConsumptionRequest.
///
/// Lines and stock moves live in their own tables; the aggregate only keeps
/// the header, the lifecycle and the ids of the moves it produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionRequest {
    id: ConsumptionRequestId,
    company_id: Option<CompanyId>,
    reference: String,
    state: ConsumptionState,
    date: DateTime<Utc>,
    requester: Option<UserId>,
    approver: Option<UserId>,
    location_ids: Vec<LocationId>,
    product_ids: Vec<ProductId>,
    analytic_account_id: Option<AnalyticAccountId>,
    op_type: OpType,
    expense_account_id: Option<AccountId>,
    adjusted: bool,
    adjustment_account_id: Option<AccountId>,
    move_ids: Vec<StockMoveId>,
    version: u64,
    created: bool,
}

impl ConsumptionRequest {
    /// Create an empty, not-yet-created aggregate instance.
    pub fn empty(id: ConsumptionRequestId) -> Self {
        Self {
            id,
            company_id: None,
            reference: UNNUMBERED_REFERENCE.to_string(),
            state: ConsumptionState::Draft,
            date: DateTime::<Utc>::default(),
            requester: None,
            approver: None,
            location_ids: Vec::new(),
            product_ids: Vec::new(),
            analytic_account_id: None,
            op_type: OpType::None,
            expense_account_id: None,
            adjusted: true,
            adjustment_account_id: None,
            move_ids: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> ConsumptionRequestId {
        self.id
    }

    pub fn company_id(&self) -> Option<CompanyId> {
        self.company_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn state(&self) -> ConsumptionState {
        self.state
    }

    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    pub fn requester(&self) -> Option<UserId> {
        self.requester
    }

    pub fn approver(&self) -> Option<UserId> {
        self.approver
    }

    pub fn location_ids(&self) -> &[LocationId] {
        &self.location_ids
    }

    pub fn product_ids(&self) -> &[ProductId] {
        &self.product_ids
    }

    pub fn analytic_account_id(&self) -> Option<AnalyticAccountId> {
        self.analytic_account_id
    }

    pub fn op_type(&self) -> OpType {
        self.op_type
    }

    pub fn expense_account_id(&self) -> Option<AccountId> {
        self.expense_account_id
    }

    /// `false` only for validated wip requests whose entries still wait for
    /// their final account.
    pub fn adjusted(&self) -> bool {
        self.adjusted
    }

    /// Account the deferred entries were finally posted to.
    pub fn adjustment_account_id(&self) -> Option<AccountId> {
        self.adjustment_account_id
    }

    pub fn move_ids(&self) -> &[StockMoveId] {
        &self.move_ids
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Validated and cancelled requests are audit records.
    pub fn ensure_deletable(&self) -> Result<(), DomainError> {
        if self.state.is_final() {
            return Err(DomainError::deletion_forbidden(format!(
                "consumption {} is {} and cannot be deleted",
                self.reference, self.state
            )));
        }
        Ok(())
    }

    /// Line quantities can only change before validation.
    pub fn ensure_lines_editable(&self) -> Result<(), DomainError> {
        if self.state.is_final() {
            return Err(DomainError::invalid_state(format!(
                "lines of a {} consumption cannot be edited",
                self.state
            )));
        }
        Ok(())
    }
}

impl AggregateRoot for ConsumptionRequest {
    type Id = ConsumptionRequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateConsumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateConsumption {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    /// Sequence code, assigned by the caller.
    pub reference: String,
    pub date: DateTime<Utc>,
    pub location_ids: Vec<LocationId>,
    pub product_ids: Vec<ProductId>,
    pub op_type: OpType,
    pub expense_account_id: Option<AccountId>,
    pub analytic_account_id: Option<AnalyticAccountId>,
    pub occurred_at: DateTime<Utc>,
}

/// Header fields editable while in draft. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionChanges {
    pub date: Option<DateTime<Utc>>,
    pub location_ids: Option<Vec<LocationId>>,
    pub product_ids: Option<Vec<ProductId>>,
    pub op_type: Option<OpType>,
    pub expense_account_id: Option<Option<AccountId>>,
    pub analytic_account_id: Option<Option<AnalyticAccountId>>,
}

impl ConsumptionChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Command: UpdateConsumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateConsumption {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub changes: ConsumptionChanges,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartConsumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartConsumption {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub requested_by: UserId,
    /// Lines generated for this start (0 when lines already existed).
    pub generated_lines: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ApproveConsumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApproveConsumption {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub approver: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RejectConsumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RejectConsumption {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub approver: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResetConsumptionToDraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetConsumptionToDraft {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ValidateConsumption.
///
/// Carries the moves already posted for the non-zero variances.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateConsumption {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub validated_by: UserId,
    pub move_ids: Vec<StockMoveId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CancelConsumption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CancelConsumption {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    /// Reverse moves posted for every move of a validated request.
    pub reversal_move_ids: Vec<StockMoveId>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkConsumptionAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkConsumptionAdjusted {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub account_id: AccountId,
    /// Number of redirect entries posted by the adjustment.
    pub posted_entries: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumptionCommand {
    Create(CreateConsumption),
    Update(UpdateConsumption),
    Start(StartConsumption),
    Approve(ApproveConsumption),
    Reject(RejectConsumption),
    ResetToDraft(ResetConsumptionToDraft),
    Validate(ValidateConsumption),
    Cancel(CancelConsumption),
    MarkAdjusted(MarkConsumptionAdjusted),
}

/// Event: ConsumptionCreated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionCreated {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub reference: String,
    pub date: DateTime<Utc>,
    pub location_ids: Vec<LocationId>,
    pub product_ids: Vec<ProductId>,
    pub op_type: OpType,
    pub expense_account_id: Option<AccountId>,
    pub analytic_account_id: Option<AnalyticAccountId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionUpdated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionUpdated {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub changes: ConsumptionChanges,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionStarted {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub requested_by: UserId,
    pub generated_lines: usize,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionApproved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionApproved {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub approver: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionRejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionRejected {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub approver: UserId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionResetToDraft.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionResetToDraft {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionValidated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionValidated {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub validated_by: UserId,
    pub move_ids: Vec<StockMoveId>,
    /// `false` when the expense posting was deferred (wip).
    pub adjusted: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionCancelled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionCancelled {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub reversal_move_ids: Vec<StockMoveId>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ConsumptionAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsumptionAdjusted {
    pub company_id: CompanyId,
    pub consumption_id: ConsumptionRequestId,
    pub account_id: AccountId,
    pub posted_entries: usize,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConsumptionEvent {
    Created(ConsumptionCreated),
    Updated(ConsumptionUpdated),
    Started(ConsumptionStarted),
    Approved(ConsumptionApproved),
    Rejected(ConsumptionRejected),
    ResetToDraft(ConsumptionResetToDraft),
    Validated(ConsumptionValidated),
    Cancelled(ConsumptionCancelled),
    Adjusted(ConsumptionAdjusted),
}

impl Event for ConsumptionEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ConsumptionEvent::Created(_) => "inventory.consumption.created",
            ConsumptionEvent::Updated(_) => "inventory.consumption.updated",
            ConsumptionEvent::Started(_) => "inventory.consumption.started",
            ConsumptionEvent::Approved(_) => "inventory.consumption.approved",
            ConsumptionEvent::Rejected(_) => "inventory.consumption.rejected",
            ConsumptionEvent::ResetToDraft(_) => "inventory.consumption.reset_to_draft",
            ConsumptionEvent::Validated(_) => "inventory.consumption.validated",
            ConsumptionEvent::Cancelled(_) => "inventory.consumption.cancelled",
            ConsumptionEvent::Adjusted(_) => "inventory.consumption.adjusted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ConsumptionEvent::Created(e) => e.occurred_at,
            ConsumptionEvent::Updated(e) => e.occurred_at,
            ConsumptionEvent::Started(e) => e.occurred_at,
            ConsumptionEvent::Approved(e) => e.occurred_at,
            ConsumptionEvent::Rejected(e) => e.occurred_at,
            ConsumptionEvent::ResetToDraft(e) => e.occurred_at,
            ConsumptionEvent::Validated(e) => e.occurred_at,
            ConsumptionEvent::Cancelled(e) => e.occurred_at,
            ConsumptionEvent::Adjusted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ConsumptionRequest {
    type Command = ConsumptionCommand;
    type Event = ConsumptionEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ConsumptionEvent::Created(e) => {
                self.id = e.consumption_id;
                self.company_id = Some(e.company_id);
                self.reference = e.reference.clone();
                self.state = ConsumptionState::Draft;
                self.date = e.date;
                self.location_ids = e.location_ids.clone();
                self.product_ids = e.product_ids.clone();
                self.op_type = e.op_type;
                self.expense_account_id = e.expense_account_id;
                self.analytic_account_id = e.analytic_account_id;
                self.adjusted = true;
                self.created = true;
            }
            ConsumptionEvent::Updated(e) => {
                let c = &e.changes;
                if let Some(date) = c.date {
                    self.date = date;
                }
                if let Some(locations) = &c.location_ids {
                    self.location_ids = locations.clone();
                }
                if let Some(products) = &c.product_ids {
                    self.product_ids = products.clone();
                }
                if let Some(op_type) = c.op_type {
                    self.op_type = op_type;
                }
                if let Some(account) = c.expense_account_id {
                    self.expense_account_id = account;
                }
                if let Some(analytic) = c.analytic_account_id {
                    self.analytic_account_id = analytic;
                }
            }
            ConsumptionEvent::Started(e) => {
                self.requester = Some(e.requested_by);
                self.state = ConsumptionState::PendingApproval;
            }
            ConsumptionEvent::Approved(e) => {
                self.approver = Some(e.approver);
                self.state = ConsumptionState::Approved;
            }
            ConsumptionEvent::Rejected(e) => {
                self.approver = Some(e.approver);
                self.state = ConsumptionState::Draft;
            }
            ConsumptionEvent::ResetToDraft(_) => {
                self.state = ConsumptionState::Draft;
            }
            ConsumptionEvent::Validated(e) => {
                self.move_ids = e.move_ids.clone();
                self.adjusted = e.adjusted;
                self.state = ConsumptionState::Validated;
            }
            ConsumptionEvent::Cancelled(e) => {
                self.move_ids.extend(e.reversal_move_ids.iter().copied());
                self.state = ConsumptionState::Cancelled;
            }
            ConsumptionEvent::Adjusted(e) => {
                self.adjustment_account_id = Some(e.account_id);
                self.adjusted = true;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ConsumptionCommand::Create(cmd) => self.handle_create(cmd),
            ConsumptionCommand::Update(cmd) => self.handle_update(cmd),
            ConsumptionCommand::Start(cmd) => self.handle_start(cmd),
            ConsumptionCommand::Approve(cmd) => self.handle_approve(cmd),
            ConsumptionCommand::Reject(cmd) => self.handle_reject(cmd),
            ConsumptionCommand::ResetToDraft(cmd) => self.handle_reset(cmd),
            ConsumptionCommand::Validate(cmd) => self.handle_validate(cmd),
            ConsumptionCommand::Cancel(cmd) => self.handle_cancel(cmd),
            ConsumptionCommand::MarkAdjusted(cmd) => self.handle_mark_adjusted(cmd),
        }
    }
}

impl ConsumptionRequest {
    fn ensure_target(
        &self,
        company_id: CompanyId,
        consumption_id: ConsumptionRequestId,
    ) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("consumption {consumption_id}")));
        }
        if self.company_id != Some(company_id) {
            return Err(DomainError::invariant("company mismatch"));
        }
        if self.id != consumption_id {
            return Err(DomainError::invariant("consumption_id mismatch"));
        }
        Ok(())
    }

    fn ensure_state(&self, allowed: &[ConsumptionState], action: &str) -> Result<(), DomainError> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(DomainError::invalid_state(format!(
                "cannot {action} consumption {} in state {}",
                self.reference, self.state
            )))
        }
    }

    fn handle_create(&self, cmd: &CreateConsumption) -> Result<Vec<ConsumptionEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("consumption already exists"));
        }
        if cmd.reference.trim().is_empty() || cmd.reference == UNNUMBERED_REFERENCE {
            return Err(DomainError::validation("reference must be assigned before creation"));
        }
        let location_ids = selection("location", &cmd.location_ids)?;
        let product_ids = selection("product", &cmd.product_ids)?;

        Ok(vec![ConsumptionEvent::Created(ConsumptionCreated {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            reference: cmd.reference.clone(),
            date: cmd.date,
            location_ids,
            product_ids,
            op_type: cmd.op_type,
            expense_account_id: cmd.expense_account_id,
            analytic_account_id: cmd.analytic_account_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_update(&self, cmd: &UpdateConsumption) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_state(&[ConsumptionState::Draft], "edit")?;
        if cmd.changes.is_empty() {
            return Ok(Vec::new());
        }

        let mut changes = cmd.changes.clone();
        if let Some(locations) = &changes.location_ids {
            changes.location_ids = Some(selection("location", locations)?);
        }
        if let Some(products) = &changes.product_ids {
            changes.product_ids = Some(selection("product", products)?);
        }

        Ok(vec![ConsumptionEvent::Updated(ConsumptionUpdated {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            changes,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start(&self, cmd: &StartConsumption) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_state(&[ConsumptionState::Draft], "start")?;
        Ok(vec![ConsumptionEvent::Started(ConsumptionStarted {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            requested_by: cmd.requested_by,
            generated_lines: cmd.generated_lines,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_approve(&self, cmd: &ApproveConsumption) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_state(&[ConsumptionState::PendingApproval], "approve")?;
        Ok(vec![ConsumptionEvent::Approved(ConsumptionApproved {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            approver: cmd.approver,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reject(&self, cmd: &RejectConsumption) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_state(
            &[ConsumptionState::PendingApproval, ConsumptionState::Approved],
            "reject",
        )?;
        Ok(vec![ConsumptionEvent::Rejected(ConsumptionRejected {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            approver: cmd.approver,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_reset(&self, cmd: &ResetConsumptionToDraft) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_state(
            &[ConsumptionState::PendingApproval, ConsumptionState::Approved],
            "reset to draft",
        )?;
        Ok(vec![ConsumptionEvent::ResetToDraft(ConsumptionResetToDraft {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_validate(&self, cmd: &ValidateConsumption) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_state(&[ConsumptionState::Approved], "validate")?;
        Ok(vec![ConsumptionEvent::Validated(ConsumptionValidated {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            validated_by: cmd.validated_by,
            move_ids: cmd.move_ids.clone(),
            adjusted: !self.op_type.defers_expense(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_cancel(&self, cmd: &CancelConsumption) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_state(
            &[ConsumptionState::Draft, ConsumptionState::Validated],
            "cancel",
        )?;
        if self.state == ConsumptionState::Validated
            && cmd.reversal_move_ids.len() != self.move_ids.len()
        {
            return Err(DomainError::invalid_state(format!(
                "consumption {} has {} posted moves to revert before cancelling",
                self.reference,
                self.move_ids.len()
            )));
        }
        if self.state == ConsumptionState::Draft && !cmd.reversal_move_ids.is_empty() {
            return Err(DomainError::invariant("a draft consumption has no moves to revert"));
        }
        Ok(vec![ConsumptionEvent::Cancelled(ConsumptionCancelled {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            reversal_move_ids: cmd.reversal_move_ids.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_adjusted(
        &self,
        cmd: &MarkConsumptionAdjusted,
    ) -> Result<Vec<ConsumptionEvent>, DomainError> {
        self.ensure_target(cmd.company_id, cmd.consumption_id)?;
        self.ensure_adjustable()?;
        Ok(vec![ConsumptionEvent::Adjusted(ConsumptionAdjusted {
            company_id: cmd.company_id,
            consumption_id: cmd.consumption_id,
            account_id: cmd.account_id,
            posted_entries: cmd.posted_entries,
            occurred_at: cmd.occurred_at,
        })])
    }

    /// Deferred entries can still be repointed to a final account.
    pub fn ensure_adjustable(&self) -> Result<(), DomainError> {
        if !self.op_type.defers_expense() || self.adjusted {
            return Err(DomainError::already_adjusted(format!(
                "consumption {} is already adjusted",
                self.reference
            )));
        }
        self.ensure_state(&[ConsumptionState::Validated], "adjust")
    }
}

/// Non-empty selection, duplicates removed, first occurrence order kept.
fn selection<T: Copy + PartialEq>(what: &str, ids: &[T]) -> Result<Vec<T>, DomainError> {
    let mut unique: Vec<T> = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.is_empty() {
        return Err(DomainError::validation(format!("at least one {what} is required")));
    }
    Ok(unique)
}

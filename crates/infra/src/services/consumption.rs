//! Consumption request actions.
//!
//! Every action checks permissions, runs as one unit of work against the
//! database and publishes the resulting tracking events once committed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{info, instrument, warn};

use matcon_accounting::{AccountId, AccountMove, AnalyticAccountId};
use matcon_auth::{Permission, Principal, authorize};
use matcon_core::{Aggregate, AggregateRoot, CompanyId, DomainError, UserId};
use matcon_events::{EventBus, EventEnvelope};
use matcon_inventory::{
    AdjustmentWizard, ApproveConsumption, CancelConsumption, ConsumptionChanges,
    ConsumptionCommand, ConsumptionContext, ConsumptionEvent, ConsumptionLine, ConsumptionLineId,
    ConsumptionLineView, ConsumptionRequest, ConsumptionRequestId, ConsumptionState,
    ConsumptionValuationAdapter, CreateConsumption, LocationId, MarkConsumptionAdjusted,
    MoveContext, OpType, RejectConsumption, ResetConsumptionToDraft, StandardValuation,
    StartConsumption, StockMove, StockMoveId, UNNUMBERED_REFERENCE, UpdateConsumption,
    ValidateConsumption, ValuationEngine, adjustment_entries,
};
use matcon_products::ProductId;

use crate::sequence::{CONSUMPTION_SEQUENCE, SequenceGenerator};
use crate::services::ServiceError;
use crate::store::{Database, Tables};

/// Aggregate type recorded on published envelopes.
pub const AGGREGATE_TYPE: &str = "inventory.consumption";

/// Input of [`ConsumptionService::create`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConsumption {
    /// Left empty (or "New") to draw the next sequence code.
    #[serde(default)]
    pub reference: Option<String>,
    /// Defaults to now.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub location_ids: Vec<LocationId>,
    pub product_ids: Vec<ProductId>,
    #[serde(default)]
    pub op_type: OpType,
    #[serde(default)]
    pub expense_account_id: Option<AccountId>,
    #[serde(default)]
    pub analytic_account_id: Option<AnalyticAccountId>,
}

/// Result of an adjustment run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AdjustmentOutcome {
    pub adjusted: Vec<ConsumptionRequestId>,
    pub entries: Vec<AccountMove>,
}

/// A request as saved by a unit of work, with the events that got it there.
#[derive(Debug)]
struct Committed {
    company_id: CompanyId,
    request: ConsumptionRequest,
    events: Vec<ConsumptionEvent>,
}

#[derive(Debug)]
pub struct ConsumptionService<D, B, E = StandardValuation> {
    db: D,
    bus: B,
    adapter: ConsumptionValuationAdapter<E>,
}

impl<D, B> ConsumptionService<D, B, StandardValuation> {
    pub fn new(db: D, bus: B) -> Self {
        Self::with_engine(db, bus, StandardValuation)
    }
}

impl<D, B, E: ValuationEngine> ConsumptionService<D, B, E> {
    pub fn with_engine(db: D, bus: B, engine: E) -> Self {
        Self {
            db,
            bus,
            adapter: ConsumptionValuationAdapter::new(engine),
        }
    }
}

impl<D, B, E> ConsumptionService<D, B, E>
where
    D: Database,
    B: EventBus<EventEnvelope<JsonValue>>,
    E: ValuationEngine,
{
    #[instrument(skip_all, fields(company_id = %principal.company_id()))]
    pub fn create(
        &self,
        principal: &Principal,
        input: NewConsumption,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();

        let committed = self
            .db
            .atomically(|tables| {
                check_selection(tables, company_id, &input.location_ids, &input.product_ids)?;
                if let Some(account) = input.expense_account_id {
                    tables.account(company_id, account)?;
                }
                let reference = match input.reference.as_deref().map(str::trim) {
                    Some(r) if !r.is_empty() && r != UNNUMBERED_REFERENCE => r.to_string(),
                    _ => tables.sequences.next_value(company_id, CONSUMPTION_SEQUENCE),
                };
                let consumption_id = ConsumptionRequestId::generate();
                let mut request = ConsumptionRequest::empty(consumption_id);
                let events = request.execute(&ConsumptionCommand::Create(CreateConsumption {
                    company_id,
                    consumption_id,
                    reference,
                    date: input.date.unwrap_or(now),
                    location_ids: input.location_ids.clone(),
                    product_ids: input.product_ids.clone(),
                    op_type: input.op_type,
                    expense_account_id: input.expense_account_id,
                    analytic_account_id: input.analytic_account_id,
                    occurred_at: now,
                }))?;
                tables.consumptions.upsert(company_id, consumption_id, request.clone());
                Ok::<_, ServiceError>(Committed {
                    company_id,
                    request,
                    events,
                })
            })
            .inspect_err(|e| warn!(error = %e, "consumption creation refused"))?;

        info!(
            consumption_id = %committed.request.id_typed(),
            reference = committed.request.reference(),
            "consumption created"
        );
        self.publish(&committed)?;
        Ok(committed.request)
    }

    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn update_draft(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
        changes: ConsumptionChanges,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();

        let committed = self
            .db
            .atomically(|tables| {
                let locations = changes.location_ids.as_deref().unwrap_or_default();
                let products = changes.product_ids.as_deref().unwrap_or_default();
                check_selection(tables, company_id, locations, products)?;
                if let Some(Some(account)) = changes.expense_account_id {
                    tables.account(company_id, account)?;
                }
                let committed = execute(
                    tables,
                    company_id,
                    id,
                    ConsumptionCommand::Update(UpdateConsumption {
                        company_id,
                        consumption_id: id,
                        changes: changes.clone(),
                        occurred_at: now,
                    }),
                )?;
                // Lines of a changed selection are regenerated on the next start.
                if changes.location_ids.is_some() || changes.product_ids.is_some() {
                    tables.lines.retain(company_id, |line| line.consumption_id != id);
                }
                Ok::<_, ServiceError>(committed)
            })
            .inspect_err(|e| warn!(error = %e, "consumption update refused"))?;

        self.publish(&committed)?;
        Ok(committed.request)
    }

    /// Generate lines (if none yet) and submit for approval.
    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn start(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();
        let requested_by = principal.user_id();

        let committed = self
            .db
            .atomically(|tables| {
                let request = tables.consumption(company_id, id)?.clone();
                let generated = if tables.lines_of(company_id, id).is_empty() {
                    ConsumptionLine::cross_product(
                        id,
                        company_id,
                        request.location_ids(),
                        request.product_ids(),
                    )
                } else {
                    Vec::new()
                };
                let committed = execute(
                    tables,
                    company_id,
                    id,
                    ConsumptionCommand::Start(StartConsumption {
                        company_id,
                        consumption_id: id,
                        requested_by,
                        generated_lines: generated.len(),
                        occurred_at: now,
                    }),
                )?;
                for line in generated {
                    tables.lines.upsert(company_id, line.id, line);
                }
                Ok::<_, ServiceError>(committed)
            })
            .inspect_err(|e| warn!(error = %e, "consumption start refused"))?;

        info!(reference = committed.request.reference(), "consumption submitted for approval");
        self.publish(&committed)?;
        Ok(committed.request)
    }

    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn approve(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();
        let command = ConsumptionCommand::Approve(ApproveConsumption {
            company_id,
            consumption_id: id,
            approver: principal.user_id(),
            occurred_at: now,
        });
        self.transition(company_id, id, command, "approved")
    }

    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn reject(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();
        let command = ConsumptionCommand::Reject(RejectConsumption {
            company_id,
            consumption_id: id,
            approver: principal.user_id(),
            occurred_at: now,
        });
        self.transition(company_id, id, command, "rejected")
    }

    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn reset_to_draft(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();
        let command = ConsumptionCommand::ResetToDraft(ResetConsumptionToDraft {
            company_id,
            consumption_id: id,
            occurred_at: now,
        });
        self.transition(company_id, id, command, "reset to draft")
    }

    /// Post the variance moves of an approved request and mark it validated.
    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn validate(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_VALIDATE)
            .inspect_err(|e| warn!(error = %e, "consumption validation refused"))?;
        let company_id = principal.company_id();
        let validated_by = principal.user_id();

        let committed = self
            .db
            .atomically(|tables| self.validate_in(tables, company_id, id, validated_by, now))
            .inspect_err(|e| warn!(error = %e, "consumption validation refused"))?;

        info!(
            reference = committed.request.reference(),
            moves = committed.request.move_ids().len(),
            adjusted = committed.request.adjusted(),
            "consumption validated"
        );
        self.publish(&committed)?;
        Ok(committed.request)
    }

    /// Validate the requests owning `line_ids`, all in one unit of work.
    #[instrument(skip_all, fields(company_id = %principal.company_id(), lines = line_ids.len()))]
    pub fn validate_from_lines(
        &self,
        principal: &Principal,
        line_ids: &[ConsumptionLineId],
        now: DateTime<Utc>,
    ) -> Result<Vec<ConsumptionRequest>, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_VALIDATE)
            .inspect_err(|e| warn!(error = %e, "consumption validation refused"))?;
        let company_id = principal.company_id();
        let validated_by = principal.user_id();

        let committed = self
            .db
            .atomically(|tables| {
                let mut owners: Vec<ConsumptionRequestId> = Vec::new();
                for line_id in line_ids {
                    let owner = tables.line(company_id, *line_id)?.consumption_id;
                    if !owners.contains(&owner) {
                        owners.push(owner);
                    }
                }
                owners
                    .into_iter()
                    .map(|id| self.validate_in(tables, company_id, id, validated_by, now))
                    .collect::<Result<Vec<_>, ServiceError>>()
            })
            .inspect_err(|e| warn!(error = %e, "consumption validation refused"))?;

        for c in &committed {
            info!(reference = c.request.reference(), "consumption validated from lines");
            self.publish(c)?;
        }
        Ok(committed.into_iter().map(|c| c.request).collect())
    }

    /// Cancel a request. Moves of a validated request are reverted first.
    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn cancel(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
        now: DateTime<Utc>,
    ) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();

        let committed = self
            .db
            .atomically(|tables| {
                let request = tables.consumption(company_id, id)?.clone();
                let mut reversal_move_ids = Vec::new();
                if request.state() == ConsumptionState::Validated && !request.move_ids().is_empty() {
                    authorize(principal, &Permission::CONSUMPTION_REVERT)?;
                    let ctx = reversal_context(&request);
                    let originals = request
                        .move_ids()
                        .iter()
                        .map(|move_id| stock_move(tables, company_id, *move_id).cloned())
                        .collect::<Result<Vec<_>, DomainError>>()?;
                    for original in &originals {
                        let (reverse, _) = tables.post_valued_move(
                            original.revert_payload(now),
                            &self.adapter,
                            Some(&ctx),
                            now,
                        )?;
                        reversal_move_ids.push(reverse.id);
                    }
                }
                execute(
                    tables,
                    company_id,
                    id,
                    ConsumptionCommand::Cancel(CancelConsumption {
                        company_id,
                        consumption_id: id,
                        reversal_move_ids,
                        occurred_at: now,
                    }),
                )
            })
            .inspect_err(|e| warn!(error = %e, "consumption cancellation refused"))?;

        info!(reference = committed.request.reference(), "consumption cancelled");
        self.publish(&committed)?;
        Ok(committed.request)
    }

    /// Delete a request that never reached validation, with its lines.
    #[instrument(skip_all, fields(company_id = %principal.company_id(), consumption_id = %id))]
    pub fn delete(&self, principal: &Principal, id: ConsumptionRequestId) -> Result<(), ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();

        let reference = self
            .db
            .atomically(|tables| {
                let request = tables.consumption(company_id, id)?;
                request.ensure_deletable()?;
                let reference = request.reference().to_string();
                tables.lines.retain(company_id, |line| line.consumption_id != id);
                tables.consumptions.remove(company_id, &id);
                Ok::<_, ServiceError>(reference)
            })
            .inspect_err(|e| warn!(error = %e, "consumption deletion refused"))?;

        info!(reference = %reference, "consumption deleted");
        Ok(())
    }

    #[instrument(skip_all, fields(company_id = %principal.company_id(), line_id = %line_id))]
    pub fn set_consume_qty(
        &self,
        principal: &Principal,
        line_id: ConsumptionLineId,
        consume_qty: Decimal,
    ) -> Result<ConsumptionLineView, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_WRITE)?;
        let company_id = principal.company_id();

        self.db
            .atomically(|tables| {
                let mut line = tables.line(company_id, line_id)?.clone();
                tables
                    .consumption(company_id, line.consumption_id)?
                    .ensure_lines_editable()?;
                line.consume_qty = consume_qty;
                tables.lines.upsert(company_id, line_id, line.clone());
                let quantities = line.quantities(&*tables);
                Ok::<_, ServiceError>(ConsumptionLineView { line, quantities })
            })
            .inspect_err(|e| warn!(error = %e, "line edit refused"))
    }

    pub fn get(&self, principal: &Principal, id: ConsumptionRequestId) -> Result<ConsumptionRequest, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_READ)?;
        let company_id = principal.company_id();
        Ok(self
            .db
            .read(|tables| tables.consumption(company_id, id).cloned())??)
    }

    pub fn list(&self, principal: &Principal) -> Result<Vec<ConsumptionRequest>, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_READ)?;
        let company_id = principal.company_id();
        Ok(self.db.read(|tables| {
            tables
                .consumptions
                .list(company_id)
                .into_iter()
                .cloned()
                .collect()
        })?)
    }

    /// Lines with quantities derived from current stock.
    pub fn lines(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
    ) -> Result<Vec<ConsumptionLineView>, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_READ)?;
        let company_id = principal.company_id();
        Ok(self.db.read(|tables| {
            tables.consumption(company_id, id)?;
            Ok::<_, DomainError>(
                tables
                    .lines_of(company_id, id)
                    .into_iter()
                    .map(|line| ConsumptionLineView {
                        line: line.clone(),
                        quantities: line.quantities(tables),
                    })
                    .collect(),
            )
        })??)
    }

    /// Stock moves linked to the request (reversals included).
    pub fn related_moves(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
    ) -> Result<Vec<StockMove>, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_READ)?;
        let company_id = principal.company_id();
        Ok(self.db.read(|tables| {
            tables.consumption(company_id, id)?;
            Ok::<_, DomainError>(tables.moves_of(company_id, id).into_iter().cloned().collect())
        })??)
    }

    /// Journal entries valuing the request's moves.
    pub fn account_moves(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
    ) -> Result<Vec<AccountMove>, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_READ)?;
        let company_id = principal.company_id();
        Ok(self.db.read(|tables| {
            tables.consumption(company_id, id)?;
            let moves = tables.moves_of(company_id, id);
            Ok::<_, DomainError>(tables.entries_of(company_id, &moves).into_iter().cloned().collect())
        })??)
    }

    pub fn has_account_moves(&self, principal: &Principal, id: ConsumptionRequestId) -> Result<bool, ServiceError> {
        Ok(!self.account_moves(principal, id)?.is_empty())
    }

    /// Adjustment wizard for one request; `None` when it is cancelled.
    pub fn adjustment_for(
        &self,
        principal: &Principal,
        id: ConsumptionRequestId,
    ) -> Result<Option<AdjustmentWizard>, ServiceError> {
        let request = self.get(principal, id)?;
        Ok(AdjustmentWizard::for_request(&request))
    }

    /// Adjustment wizard over the wip requests among `ids`.
    pub fn adjustment_for_batch(
        &self,
        principal: &Principal,
        ids: &[ConsumptionRequestId],
    ) -> Result<AdjustmentWizard, ServiceError> {
        authorize(principal, &Permission::CONSUMPTION_READ)?;
        let company_id = principal.company_id();
        let requests = self.db.read(|tables| {
            ids.iter()
                .map(|id| tables.consumption(company_id, *id).cloned())
                .collect::<Result<Vec<_>, DomainError>>()
        })??;
        AdjustmentWizard::for_batch(&requests)
            .inspect_err(|e| warn!(error = %e, "batch adjustment refused"))
            .map_err(ServiceError::from)
    }

    /// Post the deferred expense of every selected request to `target`.
    #[instrument(skip_all, fields(company_id = %principal.company_id(), target = %target))]
    pub fn run_adjustment(
        &self,
        principal: &Principal,
        wizard: &AdjustmentWizard,
        target: AccountId,
        now: DateTime<Utc>,
    ) -> Result<AdjustmentOutcome, ServiceError> {
        authorize(principal, &Permission::ADJUSTMENT_POST)
            .inspect_err(|e| warn!(error = %e, "adjustment refused"))?;
        let company_id = principal.company_id();

        let (outcome, committed) = self
            .db
            .atomically(|tables| {
                tables.account(company_id, target)?;
                let mut outcome = AdjustmentOutcome {
                    adjusted: Vec::new(),
                    entries: Vec::new(),
                };
                let mut committed = Vec::new();

                for id in wizard.consumption_ids() {
                    let request = tables.consumption(company_id, *id)?.clone();
                    request.ensure_adjustable()?;

                    let mut drafts = Vec::new();
                    for move_id in request.move_ids() {
                        let stock_move = stock_move(tables, company_id, *move_id)?;
                        let product = tables.product(stock_move.product_id)?;
                        let posted: Vec<AccountMove> = tables
                            .entries_of(company_id, &[stock_move])
                            .into_iter()
                            .cloned()
                            .collect();
                        drafts.extend(adjustment_entries(&request, stock_move, product, &posted, target));
                    }
                    let entries = tables.post_entries(drafts, now)?;

                    committed.push(execute(
                        tables,
                        company_id,
                        *id,
                        ConsumptionCommand::MarkAdjusted(MarkConsumptionAdjusted {
                            company_id,
                            consumption_id: *id,
                            account_id: target,
                            posted_entries: entries.len(),
                            occurred_at: now,
                        }),
                    )?);
                    outcome.adjusted.push(*id);
                    outcome.entries.extend(entries);
                }
                Ok::<_, ServiceError>((outcome, committed))
            })
            .inspect_err(|e| warn!(error = %e, "adjustment refused"))?;

        info!(
            requests = outcome.adjusted.len(),
            entries = outcome.entries.len(),
            "adjustment posted"
        );
        for c in &committed {
            self.publish(c)?;
        }
        Ok(outcome)
    }

    fn transition(
        &self,
        company_id: CompanyId,
        id: ConsumptionRequestId,
        command: ConsumptionCommand,
        action: &'static str,
    ) -> Result<ConsumptionRequest, ServiceError> {
        let committed = self
            .db
            .atomically(|tables| execute(tables, company_id, id, command))
            .inspect_err(|e| warn!(error = %e, action, "consumption transition refused"))?;
        info!(
            reference = committed.request.reference(),
            state = %committed.request.state(),
            action,
            "consumption transitioned"
        );
        self.publish(&committed)?;
        Ok(committed.request)
    }

    fn validate_in(
        &self,
        tables: &mut Tables,
        company_id: CompanyId,
        id: ConsumptionRequestId,
        validated_by: UserId,
        now: DateTime<Utc>,
    ) -> Result<Committed, ServiceError> {
        let request = tables.consumption(company_id, id)?.clone();
        let command = |move_ids: Vec<StockMoveId>| {
            ConsumptionCommand::Validate(ValidateConsumption {
                company_id,
                consumption_id: id,
                validated_by,
                move_ids,
                occurred_at: now,
            })
        };
        // State check before anything gets posted.
        request.handle(&command(Vec::new()))?;

        let ctx = ConsumptionContext::from(&request);
        let move_ctx = MoveContext::at(now);
        let lines: Vec<ConsumptionLine> = tables.lines_of(company_id, id).into_iter().cloned().collect();
        let mut move_ids = Vec::new();
        for line in &lines {
            let rounding = tables.product(line.product_id)?.uom_rounding;
            let quantities = line.quantities(&*tables);
            let target = tables.consumption_location(company_id, line.product_id)?;
            let Some(draft) = line.variance_move(&quantities, rounding, target, &move_ctx) else {
                continue;
            };
            let (posted, _) =
                tables.post_valued_move(draft.dated(request.date()), &self.adapter, Some(&ctx), now)?;
            move_ids.push(posted.id);
        }

        execute(tables, company_id, id, command(move_ids))
    }

    fn publish(&self, committed: &Committed) -> Result<(), ServiceError> {
        let request = &committed.request;
        let first = request.version() - committed.events.len() as u64;
        for (offset, event) in committed.events.iter().enumerate() {
            let envelope = EventEnvelope::from_event(
                committed.company_id,
                request.id_typed().0,
                AGGREGATE_TYPE,
                first + offset as u64 + 1,
                event,
            )
            .map_err(|e| ServiceError::Publish(e.to_string()))?;
            self.bus
                .publish(envelope)
                .map_err(|e| ServiceError::Publish(format!("{e:?}")))?;
        }
        Ok(())
    }
}

/// Run a command against the stored request and save the result.
fn execute(
    tables: &mut Tables,
    company_id: CompanyId,
    id: ConsumptionRequestId,
    command: ConsumptionCommand,
) -> Result<Committed, ServiceError> {
    let mut request = tables.consumption(company_id, id)?.clone();
    let events = request.execute(&command)?;
    tables.consumptions.upsert(company_id, id, request.clone());
    Ok(Committed {
        company_id,
        request,
        events,
    })
}

fn stock_move(tables: &Tables, company_id: CompanyId, id: StockMoveId) -> Result<&StockMove, DomainError> {
    tables
        .stock_moves
        .get(company_id, &id)
        .ok_or_else(|| DomainError::not_found(format!("stock move {id}")))
}

/// Locations must be internal/transit and products storable, both within
/// reach of the company.
fn check_selection(
    tables: &Tables,
    company_id: CompanyId,
    location_ids: &[LocationId],
    product_ids: &[ProductId],
) -> Result<(), DomainError> {
    for id in location_ids {
        let location = tables.location(*id)?;
        if !location.is_selectable_by(company_id) {
            return Err(DomainError::validation(format!(
                "location {} is not an internal or transit location of the company",
                location.name
            )));
        }
    }
    for id in product_ids {
        let product = tables.product(*id)?;
        if !product.is_consumable_by(company_id) {
            return Err(DomainError::validation(format!(
                "product {} is not a storable product of the company",
                product.display_name()
            )));
        }
    }
    Ok(())
}

/// Reverse moves of an adjusted wip request undo the final expense too.
fn reversal_context(request: &ConsumptionRequest) -> ConsumptionContext {
    let mut ctx = ConsumptionContext::from(request);
    if let (OpType::Wip, true, Some(account)) =
        (request.op_type(), request.adjusted(), request.adjustment_account_id())
    {
        ctx.op_type = OpType::DirectExpense;
        ctx.expense_account_id = Some(account);
    }
    ctx
}

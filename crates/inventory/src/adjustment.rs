//! Final posting of deferred (wip) consumption entries.

use matcon_accounting::{AccountId, AccountMove, AccountMoveDraft};
use matcon_core::{DomainError, DomainResult};
use matcon_products::Product;

use crate::consumption::{ConsumptionRequest, ConsumptionRequestId, ConsumptionState};
use crate::stock_move::StockMove;
use crate::valuation::expense_redirect;

/// Selection of requests whose deferred entries get a target account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjustmentWizard {
    consumption_ids: Vec<ConsumptionRequestId>,
}

impl AdjustmentWizard {
    /// Wizard for a single request; `None` when it is cancelled.
    pub fn for_request(request: &ConsumptionRequest) -> Option<Self> {
        if request.state() == ConsumptionState::Cancelled {
            return None;
        }
        Some(Self {
            consumption_ids: vec![request.id_typed()],
        })
    }

    /// Wizard over the wip requests of a selection.
    pub fn for_batch<'a>(requests: impl IntoIterator<Item = &'a ConsumptionRequest>) -> DomainResult<Self> {
        let deferred: Vec<&ConsumptionRequest> = requests
            .into_iter()
            .filter(|r| r.op_type().defers_expense())
            .collect();
        if deferred.is_empty() {
            return Err(DomainError::validation("no delay consumption selected"));
        }
        if let Some(cancelled) = deferred.iter().find(|r| r.state() == ConsumptionState::Cancelled) {
            return Err(DomainError::invalid_state(format!(
                "consumption {} is cancelled",
                cancelled.reference()
            )));
        }
        Ok(Self {
            consumption_ids: deferred.iter().map(|r| r.id_typed()).collect(),
        })
    }

    pub fn consumption_ids(&self) -> &[ConsumptionRequestId] {
        &self.consumption_ids
    }
}

/// Redirect entries repointing the value of `stock_move` to `target`.
///
/// The valued amount is recovered from each posted valuation entry of the
/// move (the line on the stock input/output account); entries that did not
/// go through the stock valuation account are ignored.
pub fn adjustment_entries(
    request: &ConsumptionRequest,
    stock_move: &StockMove,
    product: &Product,
    posted: &[AccountMove],
    target: AccountId,
) -> Vec<AccountMoveDraft> {
    let accounts = product.accounts();
    let interim = [accounts.stock_input, accounts.stock_output];
    let date = request.date().date_naive();

    posted
        .iter()
        .filter(|entry| entry.stock_move_id == Some(stock_move.id.0))
        .filter(|entry| entry.line_on(&[accounts.stock_valuation]).is_some())
        .filter_map(|entry| entry.line_on(&interim))
        .filter_map(|line| {
            let cost = -line.balance();
            expense_redirect(stock_move, product, target, cost, date, request.analytic_account_id())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{ConsumptionContext, ConsumptionValuationAdapter};
    use crate::consumption::{
        ApproveConsumption, CancelConsumption, ConsumptionCommand, CreateConsumption, OpType,
        StartConsumption, ValidateConsumption,
    };
    use crate::location::LocationId;
    use crate::stock_move::MoveDirection;
    use crate::valuation::StandardValuation;
    use crate::valuation::fixtures::{posted_move, product};
    use chrono::{DateTime, Utc};
    use matcon_accounting::AccountMoveId;
    use matcon_core::{Aggregate, CompanyId, UserId};
    use matcon_products::{ProductId, ProductKind};
    use rust_decimal_macros::dec;

    fn request(op_type: OpType, validated: bool) -> ConsumptionRequest {
        let company_id = CompanyId::new();
        let consumption_id = ConsumptionRequestId::generate();
        let user = UserId::new();
        let at = DateTime::<Utc>::from_timestamp(1_650_000_000, 0).unwrap();
        let mut request = ConsumptionRequest::empty(consumption_id);
        request
            .execute(&ConsumptionCommand::Create(CreateConsumption {
                company_id,
                consumption_id,
                reference: "MCR/00010".into(),
                date: at,
                location_ids: vec![LocationId::generate()],
                product_ids: vec![ProductId::generate()],
                op_type,
                expense_account_id: None,
                analytic_account_id: None,
                occurred_at: at,
            }))
            .unwrap();
        if validated {
            let commands = [
                ConsumptionCommand::Start(StartConsumption {
                    company_id,
                    consumption_id,
                    requested_by: user,
                    generated_lines: 1,
                    occurred_at: at,
                }),
                ConsumptionCommand::Approve(ApproveConsumption {
                    company_id,
                    consumption_id,
                    approver: user,
                    occurred_at: at,
                }),
                ConsumptionCommand::Validate(ValidateConsumption {
                    company_id,
                    consumption_id,
                    validated_by: user,
                    move_ids: Vec::new(),
                    occurred_at: at,
                }),
            ];
            for command in &commands {
                request.execute(command).unwrap();
            }
        }
        request
    }

    fn cancelled(op_type: OpType) -> ConsumptionRequest {
        let mut request = request(op_type, false);
        request
            .execute(&ConsumptionCommand::Cancel(CancelConsumption {
                company_id: request.company_id().unwrap(),
                consumption_id: request.id_typed(),
                reversal_move_ids: Vec::new(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        request
    }

    #[test]
    fn single_wizard_is_refused_for_cancelled_requests() {
        assert!(AdjustmentWizard::for_request(&cancelled(OpType::Wip)).is_none());
        let open = request(OpType::Wip, true);
        let wizard = AdjustmentWizard::for_request(&open).unwrap();
        assert_eq!(wizard.consumption_ids(), &[open.id_typed()]);
    }

    #[test]
    fn batch_keeps_only_wip_requests() {
        let wip = request(OpType::Wip, true);
        let direct = request(OpType::DirectExpense, true);
        let wizard = AdjustmentWizard::for_batch([&wip, &direct]).unwrap();
        assert_eq!(wizard.consumption_ids(), &[wip.id_typed()]);

        let err = AdjustmentWizard::for_batch([&direct]).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn batch_with_a_cancelled_wip_request_fails() {
        let err = AdjustmentWizard::for_batch([&request(OpType::Wip, true), &cancelled(OpType::Wip)])
            .unwrap_err();
        assert!(matches!(err, DomainError::InvalidState(_)));
    }

    #[test]
    fn deferred_entries_are_rebuilt_against_the_target() {
        let request = request(OpType::Wip, true);
        let product = product(ProductKind::Storable);
        let stock_move = posted_move(&product, MoveDirection::Outbound, dec!(2));

        let adapter = ConsumptionValuationAdapter::new(StandardValuation);
        let ctx = ConsumptionContext::from(&request);
        let posted: Vec<AccountMove> = adapter
            .journal_payloads(&stock_move, &product, Some(&ctx))
            .into_iter()
            .map(|draft| AccountMove::post(AccountMoveId::generate(), draft, Utc::now()).unwrap())
            .collect();
        assert_eq!(posted.len(), 1);

        let target = AccountId::generate();
        let entries = adjustment_entries(&request, &stock_move, &product, &posted, target);
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert!(entry.validate().is_ok());
        assert_eq!(entry.date, request.date().date_naive());
        assert_eq!(entry.lines[0].account_id, target);
        assert!(entry.lines[0].is_debit);
        assert_eq!(entry.lines[0].amount, dec!(25));
        assert_eq!(entry.lines[1].account_id, product.accounts().stock_output);
    }
}

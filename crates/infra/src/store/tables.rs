use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use matcon_accounting::{Account, AccountId, AccountMove, AccountMoveDraft, AccountMoveId};
use matcon_core::{CompanyId, DomainError, DomainResult};
use matcon_inventory::{
    ConsumptionContext, ConsumptionLine, ConsumptionLineId, ConsumptionLocations,
    ConsumptionRequest, ConsumptionRequestId, ConsumptionValuationAdapter, Location, LocationId,
    QuantityOnHand, StockMove, StockMoveDraft, StockMoveId, ValuationEngine,
};
use matcon_products::{Product, ProductId};

use crate::sequence::{STOCK_MOVE_SEQUENCE, SequenceGenerator, Sequences};
use crate::store::company_table::CompanyTable;

/// Every record the workflow reads or writes.
///
/// Master data (products, locations, accounts) may be shared between
/// companies; transactional records live in company-isolated tables.
#[derive(Debug, Clone, Default)]
pub struct Tables {
    pub products: HashMap<ProductId, Product>,
    pub locations: HashMap<LocationId, Location>,
    pub accounts: HashMap<AccountId, Account>,
    pub consumption_locations: Option<ConsumptionLocations>,
    pub consumptions: CompanyTable<ConsumptionRequestId, ConsumptionRequest>,
    pub lines: CompanyTable<ConsumptionLineId, ConsumptionLine>,
    pub stock_moves: CompanyTable<StockMoveId, StockMove>,
    pub account_moves: CompanyTable<AccountMoveId, AccountMove>,
    pub quants: HashMap<(CompanyId, ProductId, LocationId), Decimal>,
    pub sequences: Sequences,
}

impl Tables {
    pub fn with_sequences(sequences: Sequences) -> Self {
        Self {
            sequences,
            ..Self::default()
        }
    }

    pub fn product(&self, id: ProductId) -> DomainResult<&Product> {
        self.products
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }

    pub fn location(&self, id: LocationId) -> DomainResult<&Location> {
        self.locations
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("location {id}")))
    }

    /// Account usable by `company_id`; accounts of other companies are not found.
    pub fn account(&self, company_id: CompanyId, id: AccountId) -> DomainResult<&Account> {
        self.accounts
            .get(&id)
            .filter(|account| account.is_available_to(company_id))
            .ok_or_else(|| DomainError::not_found(format!("account {id}")))
    }

    pub fn consumption(&self, company_id: CompanyId, id: ConsumptionRequestId) -> DomainResult<&ConsumptionRequest> {
        self.consumptions
            .get(company_id, &id)
            .ok_or_else(|| DomainError::not_found(format!("consumption {id}")))
    }

    pub fn line(&self, company_id: CompanyId, id: ConsumptionLineId) -> DomainResult<&ConsumptionLine> {
        self.lines
            .get(company_id, &id)
            .ok_or_else(|| DomainError::not_found(format!("consumption line {id}")))
    }

    pub fn lines_of(&self, company_id: CompanyId, consumption_id: ConsumptionRequestId) -> Vec<&ConsumptionLine> {
        self.lines
            .list(company_id)
            .into_iter()
            .filter(|line| line.consumption_id == consumption_id)
            .collect()
    }

    pub fn moves_of(&self, company_id: CompanyId, consumption_id: ConsumptionRequestId) -> Vec<&StockMove> {
        self.stock_moves
            .list(company_id)
            .into_iter()
            .filter(|m| m.consumption_id == Some(consumption_id))
            .collect()
    }

    /// Posted journal entries valuing any of `moves`.
    pub fn entries_of(&self, company_id: CompanyId, moves: &[&StockMove]) -> Vec<&AccountMove> {
        self.account_moves
            .list(company_id)
            .into_iter()
            .filter(|entry| {
                entry
                    .stock_move_id
                    .is_some_and(|id| moves.iter().any(|m| m.id.0 == id))
            })
            .collect()
    }

    /// Where consumed units of `product_id` go for `company_id`.
    pub fn consumption_location(&self, company_id: CompanyId, product_id: ProductId) -> DomainResult<LocationId> {
        self.consumption_locations
            .as_ref()
            .map(|locations| locations.resolve(company_id, product_id))
            .ok_or_else(|| DomainError::invariant("no consumption location configured"))
    }

    pub fn set_quantity(&mut self, company_id: CompanyId, product_id: ProductId, location_id: LocationId, qty: Decimal) {
        self.quants.insert((company_id, product_id, location_id), qty);
    }

    /// Post a move: number it, value it and update on-hand quantities of
    /// the stock-holding locations it touches.
    pub fn post_stock_move(
        &mut self,
        draft: StockMoveDraft,
        engine: &impl ValuationEngine,
    ) -> DomainResult<StockMove> {
        if draft.product_uom_qty <= Decimal::ZERO {
            return Err(DomainError::validation("move quantity must be positive"));
        }
        let company_id = draft.company_id;
        let product = self.product(draft.product_id)?;
        let origin = match draft.origin_move_id {
            Some(id) => Some(
                self.stock_moves
                    .get(company_id, &id)
                    .ok_or_else(|| DomainError::not_found(format!("stock move {id}")))?,
            ),
            None => None,
        };
        let valuation = engine.value(&draft, product, origin);

        let source_holds_stock = self.location(draft.location_id)?.holds_stock();
        let dest_holds_stock = self.location(draft.location_dest_id)?.holds_stock();
        let qty = draft.product_uom_qty;
        let product_id = draft.product_id;
        if source_holds_stock {
            *self
                .quants
                .entry((company_id, product_id, draft.location_id))
                .or_insert(Decimal::ZERO) -= qty;
        }
        if dest_holds_stock {
            *self
                .quants
                .entry((company_id, product_id, draft.location_dest_id))
                .or_insert(Decimal::ZERO) += qty;
        }

        let reference = self.sequences.next_value(company_id, STOCK_MOVE_SEQUENCE);
        let posted = StockMove::done(StockMoveId::generate(), reference, draft, valuation);
        self.stock_moves.upsert(company_id, posted.id, posted.clone());
        Ok(posted)
    }

    /// Validate and post journal entries, all or nothing.
    pub fn post_entries(&mut self, drafts: Vec<AccountMoveDraft>, now: DateTime<Utc>) -> DomainResult<Vec<AccountMove>> {
        let posted = drafts
            .into_iter()
            .map(|draft| AccountMove::post(AccountMoveId::generate(), draft, now))
            .collect::<DomainResult<Vec<_>>>()?;
        for entry in &posted {
            self.account_moves.upsert(entry.company_id, entry.id, entry.clone());
        }
        Ok(posted)
    }

    /// Post a move and the journal entries valuing it, routed through the
    /// consumption adapter.
    pub fn post_valued_move<E: ValuationEngine>(
        &mut self,
        draft: StockMoveDraft,
        adapter: &ConsumptionValuationAdapter<E>,
        consumption: Option<&ConsumptionContext>,
        now: DateTime<Utc>,
    ) -> DomainResult<(StockMove, Vec<AccountMove>)> {
        let posted = self.post_stock_move(draft, adapter.engine())?;
        let product = self.product(posted.product_id)?;
        let payloads = adapter.journal_payloads(&posted, product, consumption);
        let entries = self.post_entries(payloads, now)?;
        Ok((posted, entries))
    }
}

impl QuantityOnHand for Tables {
    fn quantity_on_hand(&self, company_id: CompanyId, product_id: ProductId, location_id: LocationId) -> Decimal {
        self.quants
            .get(&(company_id, product_id, location_id))
            .copied()
            .unwrap_or(Decimal::ZERO)
    }
}

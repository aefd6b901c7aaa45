use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use matcon_core::{CompanyId, Entity, aggregate_id};
use matcon_products::ProductId;

aggregate_id!(
    /// Stock location.
    LocationId
);

/// What a location is used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationUsage {
    /// Physical warehouse location.
    Internal,
    /// Inter-warehouse transit.
    Transit,
    /// Virtual counterpart for inventory adjustments and consumption.
    Inventory,
    View,
    Supplier,
    Customer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub id: LocationId,
    pub company_id: Option<CompanyId>,
    pub name: String,
    pub usage: LocationUsage,
}

impl Location {
    /// Holds physical stock (internal or transit).
    pub fn holds_stock(&self) -> bool {
        matches!(self.usage, LocationUsage::Internal | LocationUsage::Transit)
    }

    /// Can be counted on a consumption request of `company`.
    pub fn is_selectable_by(&self, company: CompanyId) -> bool {
        self.holds_stock() && self.company_id.is_none_or(|c| c == company)
    }

    /// Can receive consumed goods.
    pub fn is_consumption_target(&self) -> bool {
        self.usage == LocationUsage::Inventory
    }
}

impl Entity for Location {
    type Id = LocationId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Consumption location per (company, product), with a global default.
///
/// Consumed goods are moved from the counted location into this virtual
/// location (and back for negative consumption).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsumptionLocations {
    default: LocationId,
    overrides: HashMap<(CompanyId, ProductId), LocationId>,
}

impl ConsumptionLocations {
    pub fn new(default: LocationId) -> Self {
        Self {
            default,
            overrides: HashMap::new(),
        }
    }

    pub fn default_location(&self) -> LocationId {
        self.default
    }

    pub fn set_default(&mut self, location: LocationId) {
        self.default = location;
    }

    pub fn set_override(&mut self, company: CompanyId, product: ProductId, location: LocationId) {
        self.overrides.insert((company, product), location);
    }

    pub fn resolve(&self, company: CompanyId, product: ProductId) -> LocationId {
        self.overrides
            .get(&(company, product))
            .copied()
            .unwrap_or(self.default)
    }
}

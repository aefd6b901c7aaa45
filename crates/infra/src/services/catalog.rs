//! Master data maintenance: products, locations, accounts and stock levels.

use rust_decimal::Decimal;
use tracing::{info, instrument};

use matcon_accounting::Account;
use matcon_auth::{Permission, Principal, authorize};
use matcon_core::DomainError;
use matcon_inventory::{ConsumptionLocations, Location, LocationId};
use matcon_products::{Product, ProductId};

use crate::services::ServiceError;
use crate::store::Database;

#[derive(Debug)]
pub struct CatalogService<D> {
    db: D,
}

impl<D: Database> CatalogService<D> {
    pub fn new(db: D) -> Self {
        Self { db }
    }

    #[instrument(skip_all, fields(product_id = %product.id))]
    pub fn register_product(&self, principal: &Principal, product: Product) -> Result<(), ServiceError> {
        authorize(principal, &Permission::MASTER_DATA_WRITE)?;
        if product.standard_price < Decimal::ZERO {
            return Err(DomainError::validation("standard price cannot be negative").into());
        }
        self.db.atomically(|tables| {
            tables.products.insert(product.id, product);
            Ok::<_, ServiceError>(())
        })?;
        info!("product registered");
        Ok(())
    }

    #[instrument(skip_all, fields(location_id = %location.id))]
    pub fn register_location(&self, principal: &Principal, location: Location) -> Result<(), ServiceError> {
        authorize(principal, &Permission::MASTER_DATA_WRITE)?;
        self.db.atomically(|tables| {
            tables.locations.insert(location.id, location);
            Ok::<_, ServiceError>(())
        })?;
        info!("location registered");
        Ok(())
    }

    #[instrument(skip_all, fields(account_id = %account.id))]
    pub fn register_account(&self, principal: &Principal, account: Account) -> Result<(), ServiceError> {
        authorize(principal, &Permission::MASTER_DATA_WRITE)?;
        self.db.atomically(|tables| {
            tables.accounts.insert(account.id, account);
            Ok::<_, ServiceError>(())
        })?;
        info!("account registered");
        Ok(())
    }

    /// Consumption location of the active company: the default one, or the
    /// one used for `product_id` only.
    #[instrument(skip_all, fields(location_id = %location_id))]
    pub fn set_consumption_location(
        &self,
        principal: &Principal,
        location_id: LocationId,
        product_id: Option<ProductId>,
    ) -> Result<(), ServiceError> {
        authorize(principal, &Permission::MASTER_DATA_WRITE)?;
        let company_id = principal.company_id();
        self.db.atomically(|tables| {
            if !tables.location(location_id)?.is_consumption_target() {
                return Err(DomainError::validation("consumption location must be an inventory location").into());
            }
            match product_id {
                Some(product_id) => {
                    tables.product(product_id)?;
                    tables
                        .consumption_locations
                        .get_or_insert_with(|| ConsumptionLocations::new(location_id))
                        .set_override(company_id, product_id, location_id);
                }
                None => match tables.consumption_locations.as_mut() {
                    Some(locations) => locations.set_default(location_id),
                    None => tables.consumption_locations = Some(ConsumptionLocations::new(location_id)),
                },
            }
            Ok::<_, ServiceError>(())
        })?;
        info!("consumption location set");
        Ok(())
    }

    /// Set the on-hand quantity of a product in a stock location.
    #[instrument(skip_all, fields(product_id = %product_id, location_id = %location_id))]
    pub fn set_quantity(
        &self,
        principal: &Principal,
        product_id: ProductId,
        location_id: LocationId,
        quantity: Decimal,
    ) -> Result<(), ServiceError> {
        authorize(principal, &Permission::MASTER_DATA_WRITE)?;
        let company_id = principal.company_id();
        self.db.atomically(|tables| {
            tables.product(product_id)?;
            if !tables.location(location_id)?.holds_stock() {
                return Err(DomainError::validation("quantities are only kept in stock locations").into());
            }
            tables.set_quantity(company_id, product_id, location_id, quantity);
            Ok::<_, ServiceError>(())
        })?;
        info!(%quantity, "on-hand quantity set");
        Ok(())
    }
}

use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::store::tables::Tables;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned")]
    Poisoned,
}

/// Repository access with all-or-nothing units of work.
pub trait Database: Send + Sync {
    /// Run a read-only query against a consistent snapshot.
    fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> Result<R, StoreError>;

    /// Run a unit of work. Its writes become visible only if it returns `Ok`;
    /// on `Err` nothing it did is kept.
    fn atomically<R, E>(&self, work: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>;
}

impl<D: Database> Database for Arc<D> {
    fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        (**self).read(query)
    }

    fn atomically<R, E>(&self, work: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        (**self).atomically(work)
    }
}

/// In-memory database for tests/dev.
///
/// Units of work run against a private copy of the tables, swapped in on
/// success. Writers are serialized by the lock.
#[derive(Debug, Default)]
pub struct InMemoryDatabase {
    tables: RwLock<Tables>,
}

impl InMemoryDatabase {
    pub fn new(tables: Tables) -> Self {
        Self {
            tables: RwLock::new(tables),
        }
    }
}

impl Database for InMemoryDatabase {
    fn read<R>(&self, query: impl FnOnce(&Tables) -> R) -> Result<R, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(query(&tables))
    }

    fn atomically<R, E>(&self, work: impl FnOnce(&mut Tables) -> Result<R, E>) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        let mut working = tables.clone();
        let result = work(&mut working)?;
        *tables = working;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use matcon_core::CompanyId;
    use matcon_inventory::LocationId;
    use matcon_products::ProductId;
    use rust_decimal_macros::dec;

    #[test]
    fn failed_unit_of_work_leaves_tables_untouched() {
        let db = InMemoryDatabase::default();
        let key = (CompanyId::new(), ProductId::generate(), LocationId::generate());

        let result: Result<(), StoreError> = db.atomically(|tables| {
            tables.set_quantity(key.0, key.1, key.2, dec!(5));
            Err(StoreError::Poisoned)
        });
        assert!(result.is_err());
        assert!(db.read(|t| t.quants.is_empty()).unwrap());

        db.atomically(|tables| {
            tables.set_quantity(key.0, key.1, key.2, dec!(5));
            Ok::<_, StoreError>(())
        })
        .unwrap();
        assert_eq!(db.read(|t| t.quants.get(&key).copied()).unwrap(), Some(dec!(5)));
    }
}

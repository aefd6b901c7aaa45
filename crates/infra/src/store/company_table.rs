use std::collections::HashMap;
use std::hash::Hash;

use matcon_core::CompanyId;

/// Company-isolated table. Rows of one company are never visible through
/// another company's id.
///
/// Listing returns rows in insertion order.
#[derive(Debug, Clone)]
pub struct CompanyTable<K, V> {
    rows: HashMap<(CompanyId, K), (u64, V)>,
    next_position: u64,
}

impl<K, V> Default for CompanyTable<K, V> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            next_position: 0,
        }
    }
}

impl<K, V> CompanyTable<K, V>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, company_id: CompanyId, key: &K) -> Option<&V> {
        self.rows.get(&(company_id, key.clone())).map(|(_, v)| v)
    }

    pub fn contains(&self, company_id: CompanyId, key: &K) -> bool {
        self.rows.contains_key(&(company_id, key.clone()))
    }

    /// Insert or replace; a replaced row keeps its position.
    pub fn upsert(&mut self, company_id: CompanyId, key: K, value: V) {
        let slot = (company_id, key);
        if let Some((_, row)) = self.rows.get_mut(&slot) {
            *row = value;
            return;
        }
        let position = self.next_position;
        self.next_position += 1;
        self.rows.insert(slot, (position, value));
    }

    pub fn update<R>(&mut self, company_id: CompanyId, key: &K, f: impl FnOnce(&mut V) -> R) -> Option<R> {
        self.rows
            .get_mut(&(company_id, key.clone()))
            .map(|(_, row)| f(row))
    }

    pub fn remove(&mut self, company_id: CompanyId, key: &K) -> Option<V> {
        self.rows.remove(&(company_id, key.clone())).map(|(_, v)| v)
    }

    pub fn list(&self, company_id: CompanyId) -> Vec<&V> {
        let mut rows: Vec<&(u64, V)> = self
            .rows
            .iter()
            .filter_map(|((c, _), row)| (*c == company_id).then_some(row))
            .collect();
        rows.sort_by_key(|(position, _)| *position);
        rows.into_iter().map(|(_, v)| v).collect()
    }

    /// Keep only the rows of `company_id` matching `keep` (other companies untouched).
    pub fn retain(&mut self, company_id: CompanyId, mut keep: impl FnMut(&V) -> bool) {
        self.rows
            .retain(|(c, _), (_, row)| *c != company_id || keep(row));
    }
}

//! Sequence numbers for record references.

use std::collections::HashMap;

use serde::Deserialize;

use matcon_core::CompanyId;

/// Sequence code of consumption request references.
pub const CONSUMPTION_SEQUENCE: &str = "material.consumption.request";
/// Sequence code of inventory stock move references.
pub const STOCK_MOVE_SEQUENCE: &str = "stock.move.inventory";

/// Next value of a named, per-company sequence.
pub trait SequenceGenerator {
    fn next_value(&mut self, company_id: CompanyId, code: &str) -> String;
}

/// Rendering of a sequence value: `prefix` + zero-padded counter.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SequenceFormat {
    pub prefix: String,
    pub padding: usize,
}

impl Default for SequenceFormat {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            padding: 5,
        }
    }
}

/// Counters kept with the rest of the tables, so numbers consumed by a
/// failed unit of work are handed out again.
#[derive(Debug, Clone, Default)]
pub struct Sequences {
    formats: HashMap<String, SequenceFormat>,
    counters: HashMap<(CompanyId, String), u64>,
}

impl Sequences {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_format(mut self, code: impl Into<String>, format: SequenceFormat) -> Self {
        self.formats.insert(code.into(), format);
        self
    }
}

impl SequenceGenerator for Sequences {
    fn next_value(&mut self, company_id: CompanyId, code: &str) -> String {
        let counter = self.counters.entry((company_id, code.to_string())).or_insert(0);
        *counter += 1;
        let format = self.formats.get(code).cloned().unwrap_or_default();
        format!("{}{:0>width$}", format.prefix, counter, width = format.padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_are_per_company_and_code() {
        let mut seq = Sequences::new().with_format(
            CONSUMPTION_SEQUENCE,
            SequenceFormat {
                prefix: "MCR/".into(),
                padding: 4,
            },
        );
        let (a, b) = (CompanyId::new(), CompanyId::new());

        assert_eq!(seq.next_value(a, CONSUMPTION_SEQUENCE), "MCR/0001");
        assert_eq!(seq.next_value(a, CONSUMPTION_SEQUENCE), "MCR/0002");
        assert_eq!(seq.next_value(b, CONSUMPTION_SEQUENCE), "MCR/0001");
        assert_eq!(seq.next_value(a, "other"), "00001");
    }
}

//! Service wiring: one in-memory database and event bus shared by every route.

use std::sync::Arc;

use serde_json::Value as JsonValue;
use tracing::info;

use matcon_events::{EventBus, EventEnvelope, InMemoryEventBus};
use matcon_infra::{CatalogService, ConsumptionService, InMemoryDatabase, Sequences, Tables};

pub type SharedDatabase = Arc<InMemoryDatabase>;
pub type SharedBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

pub struct AppServices {
    pub consumptions: ConsumptionService<SharedDatabase, SharedBus>,
    pub catalog: CatalogService<SharedDatabase>,
    bus: SharedBus,
}

impl AppServices {
    pub fn new(db: SharedDatabase, bus: SharedBus) -> Self {
        Self {
            consumptions: ConsumptionService::new(db.clone(), bus.clone()),
            catalog: CatalogService::new(db),
            bus,
        }
    }

    /// Empty store numbering records with `sequences`.
    pub fn in_memory(sequences: Sequences) -> Self {
        let db = Arc::new(InMemoryDatabase::new(Tables::with_sequences(sequences)));
        Self::new(db, Arc::new(InMemoryEventBus::new()))
    }

    /// Write every published event to the log, from a dedicated thread.
    pub fn log_events(&self) {
        let subscription = self.bus.subscribe();
        std::thread::spawn(move || {
            while let Ok(envelope) = subscription.recv() {
                info!(
                    company_id = %envelope.company_id(),
                    aggregate_type = envelope.aggregate_type(),
                    aggregate_id = %envelope.aggregate_id(),
                    sequence = envelope.sequence_number(),
                    event_type = envelope.event_type(),
                    "event published"
                );
            }
        });
    }
}

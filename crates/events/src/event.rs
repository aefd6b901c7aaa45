use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are immutable facts ("consumption approved"), versioned for schema
/// evolution and published after the unit of work that produced them commits.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "inventory.consumption.approved").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}

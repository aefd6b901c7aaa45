//! Value object trait: equality by value, not identity.

/// Marker trait for immutable values compared by their attributes.
///
/// Examples in this workspace: a unit-of-measure rounding, an analytic
/// distribution attached to a journal line.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

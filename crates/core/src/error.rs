//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every variant is a deterministic, user-visible rejection. None of them is
/// retried, and an action failing with any of them leaves no partial records.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested record was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A conflict occurred (e.g. stale version / duplicate record).
    #[error("conflict: {0}")]
    Conflict(String),

    /// The caller lacks the role required for the action.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The action is not allowed in the record's current state.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Adjustment requested on a record that is adjusted or not adjustable.
    #[error("already adjusted: {0}")]
    AlreadyAdjusted(String),

    /// Deletion attempted on a record kept for audit.
    #[error("deletion forbidden: {0}")]
    DeletionForbidden(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::PermissionDenied(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn already_adjusted(msg: impl Into<String>) -> Self {
        Self::AlreadyAdjusted(msg.into())
    }

    pub fn deletion_forbidden(msg: impl Into<String>) -> Self {
        Self::DeletionForbidden(msg.into())
    }

    /// Stable machine-readable code (used by the HTTP layer).
    pub fn code(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation_error",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::NotFound(_) => "not_found",
            DomainError::Conflict(_) => "conflict",
            DomainError::PermissionDenied(_) => "permission_denied",
            DomainError::InvalidState(_) => "invalid_state",
            DomainError::AlreadyAdjusted(_) => "already_adjusted",
            DomainError::DeletionForbidden(_) => "deletion_forbidden",
        }
    }
}

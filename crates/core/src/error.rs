//! Domain error model.

use thiserror::Error;

/// Result type used by the pure domain crates.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Deterministic failures only (parsing, invariants, lookups). Transport and
/// persistence failures are modelled by the workflow ports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A domain invariant was violated.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A quantity could not be parsed or does not fit the fixed-point range.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(String),

    /// A referenced material is not part of the catalog or session.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn invalid_quantity(msg: impl Into<String>) -> Self {
        Self::InvalidQuantity(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

//! Domain error model.

use thiserror::Error;

/// Result type used by the identifier layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Only covers identifier construction. Entitlement
/// specific failures live in `campusgate-entitlements`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// An identifier failed to parse.
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl DomainError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

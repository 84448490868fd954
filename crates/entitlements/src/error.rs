//! Error taxonomy for catalog misuse and collaborator failures.

use thiserror::Error;

use crate::claims::TokenValidationError;

/// An unrecognised or malformed value reached the engine from untrusted input.
///
/// This is the only failure that is allowed to abort a resolution: silently
/// defaulting a plan or role could grant or deny access by accident.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("unknown plan '{0}'")]
    UnknownPlan(String),

    #[error("unknown role '{0}'")]
    UnknownRole(String),

    #[error("invalid {kind} tag '{value}': {reason}")]
    InvalidTag {
        kind: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("catalog has no entry for {0}")]
    MissingCatalogEntry(String),

    #[error("role '{0}' grants no capabilities")]
    EmptyRole(String),

    #[error("invalid setting {key}='{value}'")]
    InvalidSetting { key: &'static str, value: String },

    #[error("malformed configuration: {0}")]
    Malformed(String),
}

impl ConfigurationError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }
}

/// Failure reported by an external collaborator (membership table, override store).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("lookup timed out")]
    TimedOut,
}

impl LookupError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Errors that can escape [`EntitlementResolver`](crate::EntitlementResolver).
///
/// Gate denials are never errors; they are `false` results.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EntitlementError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Only produced under [`MembershipFailurePolicy::Propagate`](crate::MembershipFailurePolicy).
    #[error("membership lookup failed: {0}")]
    MembershipLookup(#[from] LookupError),

    #[error("invalid session: {0}")]
    Session(#[from] TokenValidationError),
}

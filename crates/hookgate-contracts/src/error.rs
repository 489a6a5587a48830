//! Error taxonomy for the hookgate runtime.
//!
//! All fallible operations return `GateResult<T>`. Variants carry enough
//! context to be written to logs and shown to the agent's operator.

use thiserror::Error;

/// The unified error type for hookgate.
#[derive(Debug, Error)]
pub enum GateError {
    /// A policy check deliberately denied the action.
    #[error("policy blocked action: {reason}")]
    PolicyBlock { reason: String },

    /// A policy check timed out, crashed, or answered with something that is
    /// not a verdict. The hook adapter resolves this through the hook's
    /// failure mode; it never reaches the caller of `dispatch`.
    #[error("check '{hook}' unavailable: {reason}")]
    CheckUnavailable { hook: String, reason: String },

    /// Hook configuration or a scope declaration is malformed or unreadable.
    ///
    /// Fatal at startup: no dispatcher is built until it is resolved.
    #[error("configuration error: {reason}")]
    ConfigError { reason: String },

    /// A target path resolves outside the repository root.
    #[error("path '{path}' escapes the repository root")]
    PathEscape { path: String },

    /// The audit log could not persist a record.
    ///
    /// An event that cannot be audited gets no decision.
    #[error("audit write failed: {reason}")]
    AuditWriteFailed { reason: String },
}

/// Convenience alias used throughout the hookgate crates.
pub type GateResult<T> = Result<T, GateError>;

impl GateError {
    /// Shorthand for building a `ConfigError`.
    pub fn config(reason: impl Into<String>) -> Self {
        GateError::ConfigError {
            reason: reason.into(),
        }
    }
}

//! Core trait definitions for the hookgate dispatch pipeline.
//!
//! These two traits define the extension points:
//!
//! - `PolicyCheck`: one policy check (subprocess, in-process function,
//!   scope guard, remote call). Untrusted for availability: the hook adapter
//!   bounds every call by a timeout.
//! - `AuditSink`: trusted sink that records every event and its decision.
//!
//! The dispatcher wires them together. Checks never see the audit sink.

use async_trait::async_trait;

use hookgate_contracts::{
    audit::AuditRecord,
    error::GateResult,
    event::{Event, SessionId},
    verdict::Verdict,
};

/// A policy check evaluated against one event.
///
/// Implementations return `Ok(verdict)` for a deliberate answer and `Err` when
/// the check itself failed (crash, malformed output). The hook adapter turns
/// errors and timeouts into degraded verdicts according to the hook's
/// failure mode; implementations should not try to do that themselves.
#[async_trait]
pub trait PolicyCheck: Send + Sync {
    /// Evaluate `event` and return an allow or block verdict.
    ///
    /// A block verdict must carry a reason. The future may be dropped at any
    /// await point when the hook's timeout expires.
    async fn evaluate(&self, event: &Event) -> GateResult<Verdict>;
}

/// The append-only audit trail.
///
/// Every dispatched event produces exactly one `AuditRecord`. A failed append
/// is fatal for that event: the dispatcher returns `GateError::AuditWriteFailed`
/// instead of a decision.
pub trait AuditSink: Send + Sync {
    /// Initialize the log for `session_id`.
    ///
    /// Called on every `SessionStart`. The first call initializes storage;
    /// later calls only register the session. Must be idempotent.
    fn open(&self, session_id: &SessionId) -> GateResult<()>;

    /// Append one record and return its sequence number.
    ///
    /// Must be atomic per record and safe under concurrent callers. Sequence
    /// numbers are strictly increasing in append order.
    fn append(&self, record: &AuditRecord) -> GateResult<u64>;

    /// Mark `session_id` as ended and flush.
    ///
    /// Never truncates. The log stays append-reachable afterwards.
    fn close(&self, session_id: &SessionId) -> GateResult<()>;
}

//! Audit record type.
//!
//! Exactly one `AuditRecord` is appended per dispatched event, whatever the
//! outcome. Records are immutable once written.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    event::{Event, Phase, SessionId},
    verdict::{Decision, Outcome},
};

/// One event and the decision reached for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the decision was reached (UTC).
    pub timestamp: DateTime<Utc>,
    pub session_id: SessionId,
    pub phase: Phase,
    /// Empty for lifecycle events.
    pub tool: String,
    /// The first target path of the event, if it named one.
    pub target: Option<String>,
    pub decision: Outcome,
    pub reason: Option<String>,
    /// True if any hook answered in degraded mode.
    #[serde(default)]
    pub degraded: bool,
}

impl AuditRecord {
    /// Build the record for `event` and the `decision` reached for it.
    pub fn new(event: &Event, decision: &Decision) -> Self {
        Self {
            timestamp: Utc::now(),
            session_id: event.session_id().clone(),
            phase: event.phase(),
            tool: event.tool().to_string(),
            target: event.target().map(str::to_string),
            decision: decision.outcome,
            reason: decision.reason.clone(),
            degraded: decision.degraded,
        }
    }
}

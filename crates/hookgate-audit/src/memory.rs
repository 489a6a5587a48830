//! In-memory implementation of `AuditSink`.
//!
//! `InMemoryAuditLog` keeps every entry in a `Vec` behind a `Mutex`. It is the
//! sink used in tests and by hosts that export the trail themselves. Use
//! `export()` for a snapshot and `verify_integrity()` to confirm the chain
//! has not been tampered with in memory.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use tracing::{debug, info};

use hookgate_contracts::{
    audit::AuditRecord,
    error::{GateError, GateResult},
    event::SessionId,
};
use hookgate_core::traits::AuditSink;

use crate::{
    chain::{verify_chain, ChainCursor},
    entry::{AuditEntry, AuditSnapshot},
};

// ── Internal mutable state ────────────────────────────────────────────────────

pub(crate) struct InMemoryState {
    /// False until the first `open`.
    pub(crate) opened: bool,

    /// Sessions opened and not yet closed.
    pub(crate) active_sessions: HashSet<SessionId>,

    /// All entries, in append order.
    pub(crate) entries: Vec<AuditEntry>,

    pub(crate) cursor: ChainCursor,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An in-memory, append-only audit log backed by a SHA-256 hash chain.
///
/// Clones share the same underlying log.
#[derive(Clone)]
pub struct InMemoryAuditLog {
    pub(crate) state: Arc<Mutex<InMemoryState>>,
}

impl InMemoryAuditLog {
    /// Create an unopened log. Appends fail until `open` is called.
    pub fn new() -> Self {
        let state = InMemoryState {
            opened: false,
            active_sessions: HashSet::new(),
            entries: Vec::new(),
            cursor: ChainCursor::genesis(),
        };
        Self {
            state: Arc::new(Mutex::new(state)),
        }
    }

    fn lock(&self) -> GateResult<MutexGuard<'_, InMemoryState>> {
        self.state.lock().map_err(|e| GateError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })
    }

    /// Snapshot every entry appended so far.
    pub fn export(&self) -> AuditSnapshot {
        let state = self.state.lock().expect("audit state lock poisoned");
        AuditSnapshot {
            entries: state.entries.clone(),
            exported_at: Utc::now(),
            terminal_hash: state
                .entries
                .last()
                .map(|e| e.this_hash.clone())
                .unwrap_or_default(),
        }
    }

    /// Verify that the in-memory chain has not been tampered with.
    pub fn verify_integrity(&self) -> bool {
        let state = self.state.lock().expect("audit state lock poisoned");
        verify_chain(&state.entries)
    }

    pub fn len(&self) -> usize {
        self.state.lock().expect("audit state lock poisoned").entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return true if `session_id` has been opened and not closed.
    pub fn is_session_active(&self, session_id: &SessionId) -> bool {
        self.state
            .lock()
            .expect("audit state lock poisoned")
            .active_sessions
            .contains(session_id)
    }
}

impl Default for InMemoryAuditLog {
    fn default() -> Self {
        Self::new()
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for InMemoryAuditLog {
    fn open(&self, session_id: &SessionId) -> GateResult<()> {
        let mut state = self.lock()?;
        if !state.opened {
            state.opened = true;
            info!(session_id = %session_id, "audit log opened");
        } else {
            debug!(session_id = %session_id, "session registered with open audit log");
        }
        state.active_sessions.insert(session_id.clone());
        Ok(())
    }

    /// Sequence assignment, hashing and the push happen under one lock, so
    /// concurrent appends are totally ordered by sequence.
    fn append(&self, record: &AuditRecord) -> GateResult<u64> {
        let mut state = self.lock()?;
        if !state.opened {
            return Err(GateError::AuditWriteFailed {
                reason: "audit log is not open".to_string(),
            });
        }

        let entry = state.cursor.seal(record)?;
        let sequence = entry.sequence;
        state.entries.push(entry);
        Ok(sequence)
    }

    fn close(&self, session_id: &SessionId) -> GateResult<()> {
        let mut state = self.lock()?;
        if !state.opened {
            return Err(GateError::AuditWriteFailed {
                reason: "audit log is not open".to_string(),
            });
        }
        state.active_sessions.remove(session_id);

        info!(
            session_id = %session_id,
            entry_count = state.entries.len(),
            terminal_hash = %state.cursor.last_hash(),
            "audit session closed"
        );
        Ok(())
    }
}

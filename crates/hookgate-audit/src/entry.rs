//! Audit entry and snapshot types.
//!
//! `AuditEntry` is one link of the hash chain: it wraps an `AuditRecord` with
//! its sequence number and the SHA-256 hashes that make tampering detectable.
//! `AuditSnapshot` is a point-in-time export of a whole log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use hookgate_contracts::audit::AuditRecord;

/// A single entry in the audit hash chain.
///
/// Changing any field, including those of the embedded `record`, invalidates
/// `this_hash` and the `prev_hash` of every later entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Position in the chain, starting at 0. Strictly increasing.
    pub sequence: u64,

    /// The event and decision being recorded.
    pub record: AuditRecord,

    /// `this_hash` of the previous entry, or `GENESIS_HASH` for the first.
    pub prev_hash: String,

    /// SHA-256 (hex) over sequence, prev_hash and the record's JSON.
    pub this_hash: String,
}

impl AuditEntry {
    /// The `prev_hash` of the first entry in every chain.
    pub const GENESIS_HASH: &'static str =
        "0000000000000000000000000000000000000000000000000000000000000000";
}

/// A point-in-time export of an audit log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditSnapshot {
    /// Every entry, in chain order.
    pub entries: Vec<AuditEntry>,

    /// When the snapshot was taken (UTC).
    pub exported_at: DateTime<Utc>,

    /// `this_hash` of the last entry. Empty if the log is empty.
    pub terminal_hash: String,
}

//! Hash-chain primitives: hashing, sealing and integrity verification.
//!
//! Hash input layout (bytes, in order):
//!   1. sequence as 8-byte little-endian
//!   2. prev_hash as UTF-8 bytes (64 ASCII hex chars)
//!   3. compact JSON of the record
//!
//! The session id is part of the record, so one chain can interleave entries
//! from several sessions.

use serde::Serialize;
use sha2::{Digest, Sha256};

use hookgate_contracts::{
    audit::AuditRecord,
    error::{GateError, GateResult},
};

use crate::entry::AuditEntry;

/// Compute the SHA-256 hash of one entry. Returns lowercase hex.
pub fn hash_entry(sequence: u64, record: &AuditRecord, prev_hash: &str) -> GateResult<String> {
    let record_json = serde_json::to_vec(record).map_err(|e| GateError::AuditWriteFailed {
        reason: format!("failed to serialize audit record: {}", e),
    })?;

    let mut hasher = Sha256::new();
    hasher.update(sequence.to_le_bytes());
    hasher.update(prev_hash.as_bytes());
    hasher.update(&record_json);

    Ok(hex::encode(hasher.finalize()))
}

/// The append position of a chain: next sequence number and last hash.
///
/// Both log implementations keep one of these inside their critical section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainCursor {
    next_sequence: u64,
    last_hash: String,
}

impl ChainCursor {
    /// A cursor for an empty chain.
    pub fn genesis() -> Self {
        Self {
            next_sequence: 0,
            last_hash: AuditEntry::GENESIS_HASH.to_string(),
        }
    }

    /// A cursor positioned after `entry`.
    pub fn after(entry: &AuditEntry) -> Self {
        Self {
            next_sequence: entry.sequence + 1,
            last_hash: entry.this_hash.clone(),
        }
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// `this_hash` of the last sealed entry, or `GENESIS_HASH`.
    pub fn last_hash(&self) -> &str {
        &self.last_hash
    }

    /// Wrap `record` in the next chain entry and advance.
    pub fn seal(&mut self, record: &AuditRecord) -> GateResult<AuditEntry> {
        let sequence = self.next_sequence;
        let prev_hash = self.last_hash.clone();
        let this_hash = hash_entry(sequence, record, &prev_hash)?;

        self.next_sequence += 1;
        self.last_hash = this_hash.clone();

        Ok(AuditEntry {
            sequence,
            record: record.clone(),
            prev_hash,
            this_hash,
        })
    }
}

/// The result of verifying a chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainReport {
    /// Number of entries examined.
    pub entries: usize,

    /// `this_hash` of the last entry. Empty for an empty chain.
    pub terminal_hash: String,

    /// Index of the first entry that failed verification, if any.
    pub first_break: Option<usize>,
}

impl ChainReport {
    pub fn is_intact(&self) -> bool {
        self.first_break.is_none()
    }
}

/// Verify every entry and report the first one that fails.
///
/// An entry fails if its sequence is not its position, its `prev_hash` is
/// not the previous entry's `this_hash` (or `GENESIS_HASH`), or its
/// `this_hash` does not match the recomputed hash.
pub fn inspect_chain(entries: &[AuditEntry]) -> ChainReport {
    let mut expected_prev = AuditEntry::GENESIS_HASH;
    let mut first_break = None;

    for (idx, entry) in entries.iter().enumerate() {
        let recomputed = hash_entry(entry.sequence, &entry.record, &entry.prev_hash).ok();
        let intact = entry.sequence == idx as u64
            && entry.prev_hash == expected_prev
            && recomputed.as_deref() == Some(entry.this_hash.as_str());
        if !intact {
            first_break = Some(idx);
            break;
        }
        expected_prev = entry.this_hash.as_str();
    }

    ChainReport {
        entries: entries.len(),
        terminal_hash: entries
            .last()
            .map(|e| e.this_hash.clone())
            .unwrap_or_default(),
        first_break,
    }
}

/// Return true if the chain is intact. An empty chain is valid.
pub fn verify_chain(entries: &[AuditEntry]) -> bool {
    inspect_chain(entries).is_intact()
}

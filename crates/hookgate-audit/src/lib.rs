//! # hookgate-audit
//!
//! Append-only, SHA-256 hash-chained audit log for the hookgate dispatcher.
//!
//! ## Overview
//!
//! Every dispatched event produces one `AuditRecord`, which the log wraps in
//! an `AuditEntry` linked to the previous entry by its hash. Editing,
//! removing or reordering any entry breaks the chain, and `verify_chain`
//! detects it.
//!
//! Two sinks implement `AuditSink`:
//!
//! - [`InMemoryAuditLog`] keeps entries in memory for tests and embedding
//!   hosts.
//! - [`JsonlAuditLog`] appends one JSON line per entry to a file and resumes
//!   the chain when the file is reopened by a later process.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use hookgate_audit::InMemoryAuditLog;
//! use hookgate_core::traits::AuditSink;
//!
//! let log = InMemoryAuditLog::new();
//! log.open(&session_id)?;
//! log.append(&record)?;
//! log.close(&session_id)?;
//!
//! assert!(log.verify_integrity());
//! let snapshot = log.export();
//! ```

pub mod chain;
pub mod entry;
pub mod file;
pub mod memory;

pub use chain::{hash_entry, inspect_chain, verify_chain, ChainCursor, ChainReport};
pub use entry::{AuditEntry, AuditSnapshot};
pub use file::{read_entries, verify_file, JsonlAuditLog};
pub use memory::InMemoryAuditLog;

// ── Tests ─────────────────────────────────────────────────────────────────────

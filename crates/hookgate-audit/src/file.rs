//! JSON-lines file implementation of `AuditSink`.
//!
//! One `AuditEntry` per line, appended to a file opened in append mode. The
//! chain spans process invocations and concurrent writers: every append takes
//! an exclusive OS lock on the file, reads the current last entry and seals
//! the new one after it before releasing the lock.

use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use fs2::FileExt;
use tracing::{debug, info, warn};

use hookgate_contracts::{
    audit::AuditRecord,
    error::{GateError, GateResult},
    event::SessionId,
};
use hookgate_core::traits::AuditSink;

use crate::{
    chain::{inspect_chain, ChainCursor, ChainReport},
    entry::AuditEntry,
};

fn audit_io_error(context: &str, path: &Path, e: impl std::fmt::Display) -> GateError {
    GateError::AuditWriteFailed {
        reason: format!("{} '{}': {}", context, path.display(), e),
    }
}

fn parse_line(path: &Path, line_no: usize, line: &str) -> GateResult<AuditEntry> {
    serde_json::from_str(line).map_err(|e| GateError::AuditWriteFailed {
        reason: format!("malformed audit entry at {}:{}: {}", path.display(), line_no, e),
    })
}

/// Read every entry from a JSON-lines audit file. Blank lines are skipped.
pub fn read_entries(path: &Path) -> GateResult<Vec<AuditEntry>> {
    let file = File::open(path).map_err(|e| audit_io_error("failed to open audit file", path, e))?;

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| audit_io_error("failed to read audit file", path, e))?;
        if line.trim().is_empty() {
            continue;
        }
        entries.push(parse_line(path, idx + 1, &line)?);
    }
    Ok(entries)
}

/// Read and verify the audit file at `path`.
pub fn verify_file(path: &Path) -> GateResult<ChainReport> {
    let entries = read_entries(path)?;
    Ok(inspect_chain(&entries))
}

/// The cursor after the file's last entry. Only the last line is parsed.
fn tail_cursor(path: &Path) -> GateResult<ChainCursor> {
    if !path.exists() {
        return Ok(ChainCursor::genesis());
    }
    let file = File::open(path).map_err(|e| audit_io_error("failed to open audit file", path, e))?;

    let mut last = None;
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| audit_io_error("failed to read audit file", path, e))?;
        if !line.trim().is_empty() {
            last = Some((idx + 1, line));
        }
    }

    match last {
        Some((line_no, line)) => Ok(ChainCursor::after(&parse_line(path, line_no, &line)?)),
        None => Ok(ChainCursor::genesis()),
    }
}

// ── Internal mutable state ────────────────────────────────────────────────────

struct FileState {
    /// `None` until the first `open`.
    file: Option<File>,
    active_sessions: HashSet<SessionId>,
}

// ── Public log ────────────────────────────────────────────────────────────────

/// An append-only audit log persisted as JSON lines.
///
/// Several logs, in this process or others, may share one path.
pub struct JsonlAuditLog {
    path: PathBuf,
    state: Mutex<FileState>,
}

impl JsonlAuditLog {
    /// Create a log that will write to `path`. Nothing is touched until `open`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: Mutex::new(FileState {
                file: None,
                active_sessions: HashSet::new(),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock(&self) -> GateResult<MutexGuard<'_, FileState>> {
        self.state.lock().map_err(|e| GateError::AuditWriteFailed {
            reason: format!("audit state lock poisoned: {}", e),
        })
    }

    /// Run `f` while holding the exclusive file lock. The lock is released on
    /// every path, including when `f` fails.
    fn with_file_lock<T>(
        &self,
        file: &mut File,
        f: impl FnOnce(&mut File) -> GateResult<T>,
    ) -> GateResult<T> {
        file.lock_exclusive()
            .map_err(|e| audit_io_error("failed to lock audit file", &self.path, e))?;
        let result = f(file);
        let unlocked = FileExt::unlock(&*file)
            .map_err(|e| audit_io_error("failed to unlock audit file", &self.path, e));
        let value = result?;
        unlocked?;
        Ok(value)
    }

    /// The sequence number the next append will receive.
    pub fn next_sequence(&self) -> GateResult<u64> {
        Ok(tail_cursor(&self.path)?.next_sequence())
    }

    /// Return true if `session_id` has been opened and not closed.
    pub fn is_session_active(&self, session_id: &SessionId) -> GateResult<bool> {
        Ok(self.lock()?.active_sessions.contains(session_id))
    }
}

// ── AuditSink impl ────────────────────────────────────────────────────────────

impl AuditSink for JsonlAuditLog {
    fn open(&self, session_id: &SessionId) -> GateResult<()> {
        let mut state = self.lock()?;

        if state.file.is_none() {
            if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .map_err(|e| audit_io_error("failed to create audit directory", parent, e))?;
            }

            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&self.path)
                .map_err(|e| audit_io_error("failed to open audit file", &self.path, e))?;

            let entries = self.with_file_lock(&mut file, |_| read_entries(&self.path))?;
            if let Some(idx) = inspect_chain(&entries).first_break {
                warn!(
                    path = %self.path.display(),
                    first_break = idx,
                    "existing audit chain is broken, appending after its last entry"
                );
            }

            info!(
                session_id = %session_id,
                path = %self.path.display(),
                next_sequence = entries.last().map_or(0, |e| e.sequence + 1),
                "audit log opened"
            );
            state.file = Some(file);
        } else {
            debug!(session_id = %session_id, "session registered with open audit log");
        }

        state.active_sessions.insert(session_id.clone());
        Ok(())
    }

    /// The tail is re-read under the file lock, so the sequence and
    /// `prev_hash` follow whatever any other writer appended last. The line
    /// is written with a single `write_all` and flushed before the lock is
    /// released.
    fn append(&self, record: &AuditRecord) -> GateResult<u64> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let file = state.file.as_mut().ok_or_else(|| GateError::AuditWriteFailed {
            reason: "audit log is not open".to_string(),
        })?;

        let entry = self.with_file_lock(file, |file| {
            let entry = tail_cursor(&self.path)?.seal(record)?;
            let mut line = serde_json::to_string(&entry).map_err(|e| GateError::AuditWriteFailed {
                reason: format!("failed to serialize audit entry: {}", e),
            })?;
            line.push('\n');

            file.write_all(line.as_bytes())
                .and_then(|_| file.flush())
                .map_err(|e| audit_io_error("failed to append to audit file", &self.path, e))?;
            Ok(entry)
        })?;

        Ok(entry.sequence)
    }

    fn close(&self, session_id: &SessionId) -> GateResult<()> {
        let mut guard = self.lock()?;
        let state = &mut *guard;
        let file = state.file.as_mut().ok_or_else(|| GateError::AuditWriteFailed {
            reason: "audit log is not open".to_string(),
        })?;

        file.sync_all()
            .map_err(|e| audit_io_error("failed to sync audit file", &self.path, e))?;
        state.active_sessions.remove(session_id);

        let cursor = tail_cursor(&self.path)?;
        info!(
            session_id = %session_id,
            path = %self.path.display(),
            next_sequence = cursor.next_sequence(),
            terminal_hash = %cursor.last_hash(),
            "audit session closed"
        );
        Ok(())
    }
}

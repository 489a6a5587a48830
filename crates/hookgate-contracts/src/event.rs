//! Agent action events.
//!
//! An `Event` is one lifecycle point of an agent tool invocation, submitted to
//! the dispatcher for policy evaluation. Events are immutable once built: the
//! fields are private and exposed only through accessors.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload keys that carry a single target path.
const TARGET_KEYS: &[&str] = &["file_path", "path", "notebook_path", "target"];

/// The lifecycle point an event describes.
///
/// The Claude-style hook names (`PreToolUse`, `PostToolUse`) are accepted as
/// aliases when deserializing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// An action is proposed and has not run yet. Decisions are binding.
    #[serde(alias = "PreToolUse")]
    PreAction,
    /// An action already ran. A block means "flag for remediation".
    #[serde(alias = "PostToolUse")]
    PostAction,
    /// An agent session begins.
    SessionStart,
    /// An agent session ends.
    SessionEnd,
}

impl Phase {
    /// Stable string form used in logs and audit records.
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::PreAction => "PreAction",
            Phase::PostAction => "PostAction",
            Phase::SessionStart => "SessionStart",
            Phase::SessionEnd => "SessionEnd",
        }
    }

    /// Session lifecycle phases carry no tool.
    pub fn is_lifecycle(self) -> bool {
        matches!(self, Phase::SessionStart | Phase::SessionEnd)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of the agent session an event belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    /// Generate a fresh random session id.
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Borrow the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One agent action under evaluation.
///
/// `payload` is action-specific JSON (target paths, content, command string).
/// The runtime only reads it through the helpers below; policy checks receive
/// the full event serialized as JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    phase: Phase,
    #[serde(default)]
    tool: String,
    #[serde(default)]
    payload: Value,
    /// Generated when the caller does not supply one.
    #[serde(default = "SessionId::generate")]
    session_id: SessionId,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl Event {
    /// Build an event stamped with the current time.
    pub fn new(
        phase: Phase,
        tool: impl Into<String>,
        payload: Value,
        session_id: impl Into<SessionId>,
    ) -> Self {
        Self {
            phase,
            tool: tool.into(),
            payload,
            session_id: session_id.into(),
            timestamp: Utc::now(),
        }
    }

    /// Build a `SessionStart` or `SessionEnd` event (no tool, empty payload).
    pub fn lifecycle(phase: Phase, session_id: impl Into<SessionId>) -> Self {
        Self::new(phase, "", Value::Null, session_id)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// All target paths named by the payload, in order, without duplicates.
    ///
    /// Reads the single-path keys (`file_path`, `path`, `notebook_path`,
    /// `target`), then a `paths` array, then `file_path` entries of an
    /// `edits` array.
    pub fn targets(&self) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();

        for key in TARGET_KEYS {
            if let Some(p) = self.payload.get(*key).and_then(Value::as_str) {
                out.push(p);
            }
        }
        if let Some(paths) = self.payload.get("paths").and_then(Value::as_array) {
            out.extend(paths.iter().filter_map(Value::as_str));
        }
        if let Some(edits) = self.payload.get("edits").and_then(Value::as_array) {
            out.extend(
                edits
                    .iter()
                    .filter_map(|e| e.get("file_path").and_then(Value::as_str)),
            );
        }

        let mut seen = std::collections::HashSet::new();
        out.retain(|p| seen.insert(*p));
        out
    }

    /// The first target path, if any. This is what audit records show.
    pub fn target(&self) -> Option<&str> {
        self.targets().into_iter().next()
    }

    /// The shell command string, for shell-execute style tools.
    pub fn command(&self) -> Option<&str> {
        self.payload.get("command").and_then(Value::as_str)
    }
}

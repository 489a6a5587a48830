//! Hook configuration schema.
//!
//! A `HooksConfig` is deserialized from TOML and holds the ordered list of
//! hook entries. Within one phase, hooks run in the order they appear.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use hookgate_contracts::event::Phase;
use hookgate_core::FailureMode;

/// Default hook timeout when `timeout_ms` is omitted.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// The policy check a hook runs.
///
/// Expressed in TOML as an inline table tagged by `type`:
///
/// ```toml
/// check = { type = "command", command = "./hooks/block-dangerous.sh" }
/// check = { type = "scope-guard", working_spec = ".caws/working-spec.yaml" }
/// check = { type = "registered", id = "secret-scan" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum CheckSpec {
    /// An external executable speaking the JSON verdict protocol.
    Command {
        command: PathBuf,
        #[serde(default)]
        args: Vec<String>,
        #[serde(default)]
        env: BTreeMap<String, String>,
        working_dir: Option<PathBuf>,
    },

    /// The built-in scope guard.
    ScopeGuard {
        /// Working-spec document holding the scope declaration.
        working_spec: PathBuf,
        /// Repository root. Defaults to the configuration file's directory.
        repo_root: Option<PathBuf>,
    },

    /// An in-process check the host registered under `id`.
    Registered { id: String },
}

/// A single hook entry loaded from TOML.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HookEntry {
    /// Unique name, used in logs and degraded-mode reasons.
    pub name: String,

    pub phase: Phase,

    /// Pipe-separated tool names, e.g. `"Write|Edit"`. Required for
    /// `PreAction` and `PostAction`; not allowed for lifecycle phases.
    pub matcher: Option<String>,

    pub check: CheckSpec,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Overrides the default derived from `safety_critical`.
    pub failure_mode: Option<FailureMode>,

    #[serde(default)]
    pub safety_critical: bool,
}

/// The top-level structure deserialized from a TOML hook file.
///
/// Example:
/// ```toml
/// audit_log = "logs/audit.jsonl"
///
/// [[hooks]]
/// name = "scope"
/// phase = "PreAction"
/// matcher = "Write|Edit|MultiEdit"
/// safety_critical = true
/// check = { type = "scope-guard", working_spec = ".caws/working-spec.yaml" }
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HooksConfig {
    /// Default audit log location. Relative to the configuration file.
    pub audit_log: Option<PathBuf>,

    #[serde(default)]
    pub hooks: Vec<HookEntry>,
}

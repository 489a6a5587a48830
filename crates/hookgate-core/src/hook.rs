//! Hook definitions.
//!
//! A `HookDefinition` binds a `Matcher` to one policy check, a timeout, and
//! the failure mode applied when the check is unavailable. Definitions are
//! built once at startup and never change for the life of the dispatcher.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use hookgate_contracts::verdict::Outcome;

use crate::{matcher::Matcher, traits::PolicyCheck};

/// Timeout applied when a hook does not declare one.
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_secs(10);

/// What an unavailable check (timeout, crash, malformed output) counts as.
///
/// Written in TOML as `"fail-open"` or `"fail-closed"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailureMode {
    /// Treat the check as having allowed the action.
    FailOpen,
    /// Treat the check as having blocked the action.
    FailClosed,
}

impl FailureMode {
    /// The outcome of the synthesized verdict for an unavailable check.
    pub fn degraded_outcome(self) -> Outcome {
        match self {
            FailureMode::FailOpen => Outcome::Allow,
            FailureMode::FailClosed => Outcome::Block,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureMode::FailOpen => "fail-open",
            FailureMode::FailClosed => "fail-closed",
        }
    }
}

/// One configured hook.
#[derive(Clone)]
pub struct HookDefinition {
    name: String,
    matcher: Matcher,
    check: Arc<dyn PolicyCheck>,
    timeout: Duration,
    failure_mode: Option<FailureMode>,
    safety_critical: bool,
}

impl HookDefinition {
    /// Create a fail-open hook with the default timeout.
    pub fn new(name: impl Into<String>, matcher: Matcher, check: Arc<dyn PolicyCheck>) -> Self {
        Self {
            name: name.into(),
            matcher,
            check,
            timeout: DEFAULT_HOOK_TIMEOUT,
            failure_mode: None,
            safety_critical: false,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the failure mode explicitly. Overrides the `safety_critical` default.
    pub fn with_failure_mode(mut self, mode: FailureMode) -> Self {
        self.failure_mode = Some(mode);
        self
    }

    /// Tag the hook as safety-critical.
    ///
    /// Safety-critical hooks fail closed unless a failure mode was set
    /// explicitly.
    pub fn safety_critical(mut self) -> Self {
        self.safety_critical = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn matcher(&self) -> &Matcher {
        &self.matcher
    }

    pub fn check(&self) -> &dyn PolicyCheck {
        self.check.as_ref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn is_safety_critical(&self) -> bool {
        self.safety_critical
    }

    /// The failure mode in effect for this hook.
    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode.unwrap_or(if self.safety_critical {
            FailureMode::FailClosed
        } else {
            FailureMode::FailOpen
        })
    }
}

impl fmt::Debug for HookDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookDefinition")
            .field("name", &self.name)
            .field("matcher", &self.matcher)
            .field("timeout", &self.timeout)
            .field("failure_mode", &self.failure_mode())
            .field("safety_critical", &self.safety_critical)
            .finish_non_exhaustive()
    }
}

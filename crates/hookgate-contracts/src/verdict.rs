//! Verdict and decision types.
//!
//! A `Verdict` is what one policy check says about one event. A `Decision` is
//! what the dispatcher returns to the caller after folding the verdicts of
//! every hook that ran.

use serde::{Deserialize, Serialize};

use crate::error::{GateError, GateResult};

/// Allow or block. Shared by verdicts, decisions, and audit records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Allow,
    Block,
}

impl Outcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Allow => "allow",
            Outcome::Block => "block",
        }
    }
}

/// The outcome of one policy check for one event.
///
/// This is also the wire format subprocess checks print on stdout:
///
/// ```json
/// { "decision": "block", "reason": "rm -rf outside workspace" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    #[serde(rename = "decision")]
    pub outcome: Outcome,

    /// Human-readable explanation. Required when `outcome` is `Block`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Free-form text surfaced to the caller. Never a control signal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Set by the hook adapter when the check was unavailable and this
    /// verdict was synthesized from the hook's failure mode.
    #[serde(default)]
    pub degraded: bool,
}

impl Verdict {
    pub fn allow() -> Self {
        Self {
            outcome: Outcome::Allow,
            reason: None,
            context: None,
            degraded: false,
        }
    }

    /// Allow, passing `context` through to the caller.
    pub fn allow_with_context(context: impl Into<String>) -> Self {
        Self {
            context: Some(context.into()),
            ..Self::allow()
        }
    }

    pub fn block(reason: impl Into<String>) -> Self {
        Self {
            outcome: Outcome::Block,
            reason: Some(reason.into()),
            context: None,
            degraded: false,
        }
    }

    /// A verdict standing in for a check that did not answer.
    pub fn degraded(outcome: Outcome, reason: impl Into<String>) -> Self {
        Self {
            outcome,
            reason: Some(reason.into()),
            context: None,
            degraded: true,
        }
    }

    /// A block must say why. Anything else is malformed.
    pub fn is_well_formed(&self) -> bool {
        match self.outcome {
            Outcome::Allow => true,
            Outcome::Block => self
                .reason
                .as_deref()
                .is_some_and(|r| !r.trim().is_empty()),
        }
    }
}

/// The dispatcher's final answer for one event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    #[serde(rename = "decision")]
    pub outcome: Outcome,

    /// The reason of the blocking verdict, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    /// Context strings of every hook that ran, in declaration order.
    #[serde(default)]
    pub context: Vec<String>,

    /// How many hooks were evaluated before the chain finished or stopped.
    pub hooks_evaluated: usize,

    /// True if any evaluated hook answered in degraded mode.
    #[serde(default)]
    pub degraded: bool,

    /// True for `PostAction` blocks: the action already happened, so the
    /// block flags it for remediation instead of preventing it.
    #[serde(default)]
    pub advisory: bool,
}

impl Decision {
    /// The decision for an event no hook applied to.
    pub fn allow_unchecked() -> Self {
        Self {
            outcome: Outcome::Allow,
            reason: None,
            context: Vec::new(),
            hooks_evaluated: 0,
            degraded: false,
            advisory: false,
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.outcome == Outcome::Block
    }

    /// Convert a binding block into `GateError::PolicyBlock`.
    ///
    /// Advisory blocks and allows pass through unchanged.
    pub fn into_result(self) -> GateResult<Self> {
        if self.is_blocked() && !self.advisory {
            return Err(GateError::PolicyBlock {
                reason: self
                    .reason
                    .unwrap_or_else(|| "blocked without reason".to_string()),
            });
        }
        Ok(self)
    }
}

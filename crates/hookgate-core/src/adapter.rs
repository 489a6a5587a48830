//! The hook adapter: runs one check under its timeout.
//!
//! `run_hook` always produces exactly one verdict:
//!
//! - the check answers in time with a well-formed verdict → used as is
//! - the check times out, errors, or blocks without a reason → the check is
//!   unavailable; a degraded verdict is synthesized from the hook's failure
//!   mode and a warning is logged
//! - the check reports a path escape → block, never degraded, whatever the
//!   failure mode
//!
//! A timeout drops the check's future, which cancels it. It never cancels the
//! dispatcher's evaluation of the event.

use std::time::Instant;

use tracing::{debug, warn};

use hookgate_contracts::{
    error::GateError,
    event::Event,
    verdict::Verdict,
};

use crate::hook::HookDefinition;

/// Evaluate `hook` against `event` within the hook's timeout.
pub async fn run_hook(hook: &HookDefinition, event: &Event) -> Verdict {
    let started = Instant::now();
    let result = tokio::time::timeout(hook.timeout(), hook.check().evaluate(event)).await;

    let failure = match result {
        Ok(Ok(verdict)) if verdict.is_well_formed() => {
            debug!(
                hook = %hook.name(),
                session_id = %event.session_id(),
                outcome = verdict.outcome.as_str(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "check answered"
            );
            return Verdict {
                degraded: false,
                ..verdict
            };
        }
        Ok(Ok(_)) => "check blocked without a reason".to_string(),
        Ok(Err(GateError::PathEscape { path })) => {
            warn!(hook = %hook.name(), path = %path, "target escapes repository root");
            return Verdict::block(GateError::PathEscape { path }.to_string());
        }
        Ok(Err(GateError::PolicyBlock { reason })) => return Verdict::block(reason),
        Ok(Err(GateError::CheckUnavailable { reason, .. })) => reason,
        Ok(Err(other)) => other.to_string(),
        Err(_) => format!("timed out after {}ms", hook.timeout().as_millis()),
    };

    let mode = hook.failure_mode();
    let unavailable = GateError::CheckUnavailable {
        hook: hook.name().to_string(),
        reason: failure,
    };
    warn!(
        hook = %hook.name(),
        session_id = %event.session_id(),
        failure_mode = mode.as_str(),
        safety_critical = hook.is_safety_critical(),
        error = %unavailable,
        "check unavailable, running in degraded mode"
    );

    Verdict::degraded(
        mode.degraded_outcome(),
        format!("{unavailable} ({})", mode.as_str()),
    )
}

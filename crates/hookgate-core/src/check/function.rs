//! In-process function checks.

use async_trait::async_trait;
use tracing::debug;

use hookgate_contracts::{error::GateResult, event::Event, verdict::Verdict};

use crate::traits::PolicyCheck;

/// A caller-supplied check function.
///
/// Returns the verdict for the event, or an error if the check could not
/// decide (which the hook adapter treats like a crash).
pub type CheckFn = Box<dyn Fn(&Event) -> GateResult<Verdict> + Send + Sync>;

/// A policy check backed by a closure.
pub struct FnCheck {
    name: String,
    f: CheckFn,
}

impl FnCheck {
    pub fn new(
        name: impl Into<String>,
        f: impl Fn(&Event) -> GateResult<Verdict> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            f: Box::new(f),
        }
    }
}

#[async_trait]
impl PolicyCheck for FnCheck {
    async fn evaluate(&self, event: &Event) -> GateResult<Verdict> {
        debug!(check = %self.name, tool = event.tool(), "running in-process check");
        (self.f)(event)
    }
}

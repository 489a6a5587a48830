//! Decision aggregation.
//!
//! Folds the ordered verdicts of a hook chain into one `Decision`:
//!
//! 1. Scan verdicts in declaration order.
//! 2. On the first block, stop. The decision is block with that verdict's
//!    reason and only the context collected before it.
//! 3. Otherwise the decision is allow with every context, in order.
//!
//! The dispatcher feeds the `Aggregator` one verdict at a time and stops
//! running hooks as soon as `push` breaks, so hooks after a block never run.

use std::ops::ControlFlow;

use hookgate_contracts::verdict::{Decision, Outcome, Verdict};

/// Incremental fold over a hook chain.
#[derive(Debug, Default)]
pub struct Aggregator {
    context: Vec<String>,
    evaluated: usize,
    degraded: bool,
    block_reason: Option<String>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the next verdict in declaration order.
    ///
    /// Returns `Break` once a block has been seen. Verdicts pushed after that
    /// are ignored.
    pub fn push(&mut self, verdict: Verdict) -> ControlFlow<()> {
        if self.block_reason.is_some() {
            return ControlFlow::Break(());
        }

        self.evaluated += 1;
        self.degraded |= verdict.degraded;

        match verdict.outcome {
            Outcome::Block => {
                self.block_reason = Some(
                    verdict
                        .reason
                        .unwrap_or_else(|| "blocked without reason".to_string()),
                );
                ControlFlow::Break(())
            }
            Outcome::Allow => {
                if let Some(context) = verdict.context {
                    self.context.push(context);
                }
                ControlFlow::Continue(())
            }
        }
    }

    pub fn is_blocked(&self) -> bool {
        self.block_reason.is_some()
    }

    /// Produce the decision for everything pushed so far.
    pub fn finish(self) -> Decision {
        let outcome = if self.block_reason.is_some() {
            Outcome::Block
        } else {
            Outcome::Allow
        };
        Decision {
            outcome,
            reason: self.block_reason,
            context: self.context,
            hooks_evaluated: self.evaluated,
            degraded: self.degraded,
            advisory: false,
        }
    }
}

/// Fold an ordered sequence of verdicts into a decision.
///
/// Pure and order-sensitive: the same sequence always yields the same
/// decision, and reordering it can change the result.
pub fn fold(verdicts: impl IntoIterator<Item = Verdict>) -> Decision {
    let mut aggregator = Aggregator::new();
    for verdict in verdicts {
        if aggregator.push(verdict).is_break() {
            break;
        }
    }
    aggregator.finish()
}

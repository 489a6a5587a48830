//! The hookgate dispatcher: the per-event evaluation pipeline.
//!
//! For every event the dispatcher enforces:
//!
//!   [SessionStart: open audit] → Match → Run hooks in order → Fold → Audit → [SessionEnd: close audit]
//!
//! Hooks of one event run strictly sequentially in declaration order, and the
//! first block stops the chain: later hooks are never invoked. Different
//! events may be dispatched concurrently from separate tasks; the dispatcher
//! holds no per-event state.

use std::sync::Arc;

use tracing::{debug, info, warn};

use hookgate_contracts::{
    audit::AuditRecord,
    error::GateResult,
    event::{Event, Phase},
    verdict::Decision,
};

use crate::{adapter::run_hook, aggregate::Aggregator, hook::HookDefinition, traits::AuditSink};

/// Evaluates events against an ordered hook chain and audits every decision.
///
/// Build one dispatcher per process from validated hook definitions and share
/// it behind an `Arc` between tasks.
pub struct Dispatcher {
    hooks: Vec<HookDefinition>,
    audit: Arc<dyn AuditSink>,
}

impl Dispatcher {
    /// Create a dispatcher over `hooks` (in declaration order) writing to `audit`.
    pub fn new(hooks: Vec<HookDefinition>, audit: Arc<dyn AuditSink>) -> Self {
        Self { hooks, audit }
    }

    /// The hooks that apply to `event`, in declaration order.
    pub fn applicable<'a>(&'a self, event: &'a Event) -> impl Iterator<Item = &'a HookDefinition> + 'a {
        self.hooks
            .iter()
            .filter(move |hook| hook.matcher().matches(event.phase(), event.tool()))
    }

    /// Evaluate one event and return the decision.
    ///
    /// # Pipeline
    ///
    /// 1. `SessionStart` opens the audit log for the session
    /// 2. Resolve the hooks whose matcher selects the event
    /// 3. Run each through the hook adapter in order; stop at the first block
    /// 4. Fold the verdicts into a `Decision`; `PostAction` blocks are advisory
    /// 5. Append one `AuditRecord`
    /// 6. `SessionEnd` closes the audit log for the session
    ///
    /// # Errors
    ///
    /// Only audit failures are errors. Blocks, timeouts and crashing checks
    /// all produce a `Decision`.
    pub async fn dispatch(&self, event: &Event) -> GateResult<Decision> {
        let session_id = event.session_id();

        debug!(
            session_id = %session_id,
            phase = %event.phase(),
            tool = %event.tool(),
            "dispatching event"
        );

        if event.phase() == Phase::SessionStart {
            self.audit.open(session_id)?;
        }

        // ── Hook chain ───────────────────────────────────────────────────────
        let mut aggregator = Aggregator::new();
        for hook in self.applicable(event) {
            let verdict = run_hook(hook, event).await;
            if aggregator.push(verdict).is_break() {
                info!(
                    session_id = %session_id,
                    hook = %hook.name(),
                    tool = %event.tool(),
                    "hook blocked event, skipping remaining hooks"
                );
                break;
            }
        }

        let mut decision = aggregator.finish();
        decision.advisory = decision.is_blocked() && event.phase() == Phase::PostAction;

        if decision.is_blocked() {
            warn!(
                session_id = %session_id,
                phase = %event.phase(),
                tool = %event.tool(),
                reason = decision.reason.as_deref().unwrap_or_default(),
                advisory = decision.advisory,
                "event blocked"
            );
        }

        // ── Audit ────────────────────────────────────────────────────────────
        //
        // An event that cannot be audited gets no decision.
        let record = AuditRecord::new(event, &decision);
        let sequence = self.audit.append(&record)?;
        debug!(
            session_id = %session_id,
            sequence,
            outcome = decision.outcome.as_str(),
            hooks_evaluated = decision.hooks_evaluated,
            "decision audited"
        );

        if event.phase() == Phase::SessionEnd {
            self.audit.close(session_id)?;
        }

        Ok(decision)
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    };
    use std::time::Duration;

    use async_trait::async_trait;
    use serde_json::json;

    use hookgate_contracts::{
        audit::AuditRecord,
        error::{GateError, GateResult},
        event::{Event, Phase, SessionId},
        verdict::{Outcome, Verdict},
    };

    use super::Dispatcher;
    use crate::{
        check::FnCheck,
        hook::{FailureMode, HookDefinition},
        matcher::Matcher,
        traits::{AuditSink, PolicyCheck},
    };

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// An audit sink that records every call for later inspection.
    #[derive(Default)]
    struct MockAudit {
        records: Mutex<Vec<AuditRecord>>,
        opened: Mutex<Vec<String>>,
        closed: Mutex<Vec<String>>,
        fail_appends: bool,
    }

    impl AuditSink for MockAudit {
        fn open(&self, session_id: &SessionId) -> GateResult<()> {
            self.opened.lock().unwrap().push(session_id.0.clone());
            Ok(())
        }

        fn append(&self, record: &AuditRecord) -> GateResult<u64> {
            if self.fail_appends {
                return Err(GateError::AuditWriteFailed {
                    reason: "disk full".to_string(),
                });
            }
            let mut records = self.records.lock().unwrap();
            records.push(record.clone());
            Ok(records.len() as u64 - 1)
        }

        fn close(&self, session_id: &SessionId) -> GateResult<()> {
            self.closed.lock().unwrap().push(session_id.0.clone());
            Ok(())
        }
    }

    /// A check that counts invocations and answers with a fixed verdict.
    struct CountingCheck {
        calls: Arc<AtomicUsize>,
        verdict: Verdict,
    }

    #[async_trait]
    impl PolicyCheck for CountingCheck {
        async fn evaluate(&self, _event: &Event) -> GateResult<Verdict> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.verdict.clone())
        }
    }

    fn counting(name: &str, pattern: &str, verdict: Verdict) -> (HookDefinition, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let check = CountingCheck {
            calls: calls.clone(),
            verdict,
        };
        let hook = HookDefinition::new(name, Matcher::new(Phase::PreAction, pattern), Arc::new(check));
        (hook, calls)
    }

    fn write_event(path: &str) -> Event {
        Event::new(Phase::PreAction, "Write", json!({ "file_path": path }), "s-1")
    }

    // ── Test cases ───────────────────────────────────────────────────────────

    /// Events no matcher selects are allowed with empty context, and still audited.
    #[tokio::test]
    async fn unmatched_tool_is_allowed_without_running_hooks() {
        let (hook, calls) = counting("scope", "Write|Edit", Verdict::block("never"));
        let audit = Arc::new(MockAudit::default());
        let dispatcher = Dispatcher::new(vec![hook], audit.clone());

        let event = Event::new(Phase::PreAction, "Read", json!({ "file_path": "x" }), "s-1");
        let decision = dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(decision.outcome, Outcome::Allow);
        assert!(decision.context.is_empty());
        assert_eq!(decision.hooks_evaluated, 0);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(audit.records.lock().unwrap().len(), 1);
    }

    /// The same tool in another phase is not matched either.
    #[tokio::test]
    async fn matcher_for_other_phase_does_not_run() {
        let (hook, calls) = counting("scope", "Write", Verdict::block("never"));
        let dispatcher = Dispatcher::new(vec![hook], Arc::new(MockAudit::default()));

        let event = Event::new(Phase::PostAction, "Write", json!({}), "s-1");
        let decision = dispatcher.dispatch(&event).await.unwrap();

        assert_eq!(decision.outcome, Outcome::Allow);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    /// Core short-circuit guarantee: hooks after a block are never invoked.
    #[tokio::test]
    async fn block_short_circuits_remaining_hooks() {
        for blocking_index in 0..3 {
            let mut hooks = Vec::new();
            let mut counters = Vec::new();
            for i in 0..3 {
                let verdict = if i == blocking_index {
                    Verdict::block(format!("hook {i} says no"))
                } else {
                    Verdict::allow_with_context(format!("ctx-{i}"))
                };
                let (hook, calls) = counting(&format!("hook-{i}"), "Write", verdict);
                hooks.push(hook);
                counters.push(calls);
            }

            let dispatcher = Dispatcher::new(hooks, Arc::new(MockAudit::default()));
            let decision = dispatcher.dispatch(&write_event("src/a.rs")).await.unwrap();

            assert_eq!(decision.outcome, Outcome::Block);
            assert_eq!(decision.reason, Some(format!("hook {blocking_index} says no")));
            assert_eq!(decision.hooks_evaluated, blocking_index + 1);
            for (i, calls) in counters.iter().enumerate() {
                let expected = usize::from(i <= blocking_index);
                assert_eq!(calls.load(Ordering::SeqCst), expected, "hook {i} call count");
            }
        }
    }

    /// Context from every hook is returned in declaration order.
    #[tokio::test]
    async fn contexts_are_collected_in_declaration_order() {
        let (a, _) = counting("a", "Write", Verdict::allow_with_context("first"));
        let (b, _) = counting("b", "Write", Verdict::allow());
        let (c, _) = counting("c", "Write", Verdict::allow_with_context("third"));
        let dispatcher = Dispatcher::new(vec![a, b, c], Arc::new(MockAudit::default()));

        let decision = dispatcher.dispatch(&write_event("src/a.rs")).await.unwrap();

        assert_eq!(decision.outcome, Outcome::Allow);
        assert_eq!(decision.context, vec!["first", "third"]);
        assert_eq!(decision.hooks_evaluated, 3);
    }

    /// A blocked event is audited with its reason and target.
    #[tokio::test]
    async fn blocked_event_is_audited_with_reason() {
        let (hook, _) = counting("scope", "Write", Verdict::block("outside scope"));
        let audit = Arc::new(MockAudit::default());
        let dispatcher = Dispatcher::new(vec![hook], audit.clone());

        dispatcher.dispatch(&write_event("docs/x.md")).await.unwrap();

        let records = audit.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].decision, Outcome::Block);
        assert_eq!(records[0].reason.as_deref(), Some("outside scope"));
        assert_eq!(records[0].target.as_deref(), Some("docs/x.md"));
        assert_eq!(records[0].tool, "Write");
    }

    /// PostAction blocks are advisory; PreAction blocks are binding.
    #[tokio::test]
    async fn post_action_block_is_advisory() {
        let hook = HookDefinition::new(
            "lint",
            Matcher::new(Phase::PostAction, "Write"),
            Arc::new(FnCheck::new("lint", |_| Ok(Verdict::block("lint failed")))),
        );
        let dispatcher = Dispatcher::new(vec![hook], Arc::new(MockAudit::default()));

        let event = Event::new(Phase::PostAction, "Write", json!({ "file_path": "a.rs" }), "s-1");
        let decision = dispatcher.dispatch(&event).await.unwrap();

        assert!(decision.is_blocked());
        assert!(decision.advisory);
        assert!(decision.into_result().is_ok());
    }

    /// A hung hook degrades to its failure mode and the chain continues.
    #[tokio::test]
    async fn timed_out_hook_degrades_and_chain_continues() {
        struct Hang;

        #[async_trait]
        impl PolicyCheck for Hang {
            async fn evaluate(&self, _event: &Event) -> GateResult<Verdict> {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(Verdict::allow())
            }
        }

        let hung = HookDefinition::new("hung", Matcher::new(Phase::PreAction, "Write"), Arc::new(Hang))
            .with_timeout(Duration::from_millis(10))
            .with_failure_mode(FailureMode::FailOpen);
        let (after, calls) = counting("after", "Write", Verdict::allow_with_context("ran"));

        let dispatcher = Dispatcher::new(vec![hung, after], Arc::new(MockAudit::default()));
        let decision = dispatcher.dispatch(&write_event("src/a.rs")).await.unwrap();

        assert_eq!(decision.outcome, Outcome::Allow);
        assert!(decision.degraded);
        assert_eq!(decision.context, vec!["ran"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    /// SessionStart opens and SessionEnd closes the audit log, each audited.
    #[tokio::test]
    async fn session_lifecycle_drives_audit_open_and_close() {
        let audit = Arc::new(MockAudit::default());
        let dispatcher = Dispatcher::new(vec![], audit.clone());

        dispatcher
            .dispatch(&Event::lifecycle(Phase::SessionStart, "s-42"))
            .await
            .unwrap();
        dispatcher.dispatch(&write_event("src/a.rs")).await.unwrap();
        dispatcher
            .dispatch(&Event::lifecycle(Phase::SessionEnd, "s-42"))
            .await
            .unwrap();

        assert_eq!(*audit.opened.lock().unwrap(), vec!["s-42".to_string()]);
        assert_eq!(*audit.closed.lock().unwrap(), vec!["s-42".to_string()]);

        let phases: Vec<Phase> = audit.records.lock().unwrap().iter().map(|r| r.phase).collect();
        assert_eq!(phases, vec![Phase::SessionStart, Phase::PreAction, Phase::SessionEnd]);
    }

    /// Lifecycle hooks use an any-tool matcher.
    #[tokio::test]
    async fn lifecycle_hooks_run_on_session_events() {
        let calls = Arc::new(AtomicUsize::new(0));
        let hook = HookDefinition::new(
            "banner",
            Matcher::any_tool(Phase::SessionStart),
            Arc::new(CountingCheck {
                calls: calls.clone(),
                verdict: Verdict::allow_with_context("scope: src/**"),
            }),
        );
        let dispatcher = Dispatcher::new(vec![hook], Arc::new(MockAudit::default()));

        let decision = dispatcher
            .dispatch(&Event::lifecycle(Phase::SessionStart, "s-1"))
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(decision.context, vec!["scope: src/**"]);
    }

    /// An audit failure is surfaced as an error instead of a decision.
    #[tokio::test]
    async fn audit_failure_is_an_error() {
        let audit = Arc::new(MockAudit {
            fail_appends: true,
            ..MockAudit::default()
        });
        let dispatcher = Dispatcher::new(vec![], audit);

        match dispatcher.dispatch(&write_event("src/a.rs")).await {
            Err(GateError::AuditWriteFailed { reason }) => assert_eq!(reason, "disk full"),
            other => panic!("expected AuditWriteFailed, got {:?}", other),
        }
    }
}

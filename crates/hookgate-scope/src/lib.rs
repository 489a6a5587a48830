//! # hookgate-scope
//!
//! The scope guard: a built-in policy check that blocks writes and edits to
//! paths outside a repository's declared scope.
//!
//! The declaration is read from the repository's working-spec document
//! ([`declaration`]). Targets are normalized lexically ([`path`]) and then
//! classified against the compiled in-scope and out-of-scope globs
//! ([`glob`], [`guard`]). Explicit exclusion beats inclusion, and anything
//! undeclared is denied.

pub mod declaration;
pub mod glob;
pub mod guard;
pub mod path;

pub use declaration::{load_scope_declaration, parse_scope_declaration, SpecFormat};
pub use glob::GlobPattern;
pub use guard::{ScopeDecision, ScopeGuard};
pub use path::normalize_target;

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tempfile::TempDir;

    use hookgate_contracts::{
        event::{Event, Phase},
        scope::ScopeDeclaration,
        verdict::Outcome,
    };
    use hookgate_core::{run_hook, FailureMode, HookDefinition, Matcher};

    use super::ScopeGuard;

    fn scope_hook(tmp: &TempDir) -> HookDefinition {
        let decl = ScopeDeclaration {
            in_scope: vec!["src/**".into()],
            out_of_scope: vec!["src/generated/**".into()],
            risk_tier: None,
        };
        let guard = ScopeGuard::new(tmp.path(), &decl).unwrap();
        HookDefinition::new(
            "scope-guard",
            Matcher::new(Phase::PreAction, "Write|Edit|MultiEdit"),
            Arc::new(guard),
        )
        .with_timeout(Duration::from_secs(1))
        .safety_critical()
    }

    fn edit(path: &str) -> Event {
        Event::new(Phase::PreAction, "Edit", json!({ "file_path": path }), "s-1")
    }

    #[tokio::test]
    async fn guard_runs_as_a_hook() {
        let tmp = TempDir::new().unwrap();
        let hook = scope_hook(&tmp);
        assert_eq!(hook.failure_mode(), FailureMode::FailClosed);

        let verdict = run_hook(&hook, &edit("src/main.go")).await;
        assert_eq!(verdict.outcome, Outcome::Allow);

        let verdict = run_hook(&hook, &edit("src/generated/x.go")).await;
        assert_eq!(verdict.outcome, Outcome::Block);
        assert!(!verdict.degraded);

        let verdict = run_hook(&hook, &edit("docs/readme.md")).await;
        assert_eq!(verdict.outcome, Outcome::Block);
        assert!(verdict.reason.unwrap().contains("src/**"));
    }

    #[tokio::test]
    async fn traversal_blocks_as_a_definite_verdict() {
        let tmp = TempDir::new().unwrap();
        let decl = ScopeDeclaration {
            in_scope: vec!["**".into()],
            ..Default::default()
        };
        let guard = ScopeGuard::new(tmp.path(), &decl).unwrap();
        let hook = HookDefinition::new("scope-guard", Matcher::new(Phase::PreAction, "Write"), Arc::new(guard));

        let event = Event::new(
            Phase::PreAction,
            "Write",
            json!({ "file_path": "src/../../etc/passwd" }),
            "s-1",
        );
        let verdict = run_hook(&hook, &event).await;
        assert_eq!(verdict.outcome, Outcome::Block);
        assert!(!verdict.degraded);
        assert!(verdict.reason.unwrap().contains("escapes the repository root"));
    }
}

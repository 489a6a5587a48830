//! The scope guard policy check.
//!
//! Decision algorithm for one target path:
//!
//! 1. Normalize the target to a repository-relative path. A target that
//!    resolves outside the root is blocked before any glob is consulted.
//! 2. If any `out_of_scope` pattern matches → block. Explicit exclusion wins
//!    over every in-scope match, however specific.
//! 3. If any `in_scope` pattern matches → allow.
//! 4. Otherwise → block, naming the nearest in-scope boundary. Undeclared
//!    paths are never assumed to be permitted.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::debug;

use hookgate_contracts::{
    error::{GateError, GateResult},
    event::Event,
    scope::ScopeDeclaration,
    verdict::Verdict,
};
use hookgate_core::traits::PolicyCheck;

use crate::{
    declaration::load_scope_declaration,
    glob::GlobPattern,
    path::{normalize_target, resolve_existing_ancestor},
};

/// How one target path relates to the declared scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeDecision {
    /// Matched this in-scope pattern and no exclusion.
    InScope { path: String, pattern: String },
    /// Matched this out-of-scope pattern.
    Excluded { path: String, pattern: String },
    /// Matched nothing. `nearest` is the closest in-scope pattern, if any.
    Undeclared { path: String, nearest: Option<String> },
    /// Resolved outside the repository root.
    Escape { target: String },
    /// Resolved to the repository root itself, which is not a file.
    RepositoryRoot { target: String },
}

impl ScopeDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, ScopeDecision::InScope { .. })
    }

    /// The verdict the guard reports for this decision.
    pub fn to_verdict(&self) -> Verdict {
        match self {
            ScopeDecision::InScope { .. } => Verdict::allow(),
            ScopeDecision::Excluded { path, pattern } => Verdict::block(format!(
                "'{path}' is excluded from scope by '{pattern}'"
            )),
            ScopeDecision::Undeclared { path, nearest: Some(nearest) } => Verdict::block(format!(
                "'{path}' is outside the declared scope (nearest in-scope boundary: '{nearest}')"
            )),
            ScopeDecision::Undeclared { path, nearest: None } => Verdict::block(format!(
                "'{path}' is outside the declared scope (no in-scope paths declared)"
            )),
            ScopeDecision::Escape { target } => Verdict::block(
                GateError::PathEscape {
                    path: target.clone(),
                }
                .to_string(),
            ),
            ScopeDecision::RepositoryRoot { target } => Verdict::block(format!(
                "'{target}' resolves to the repository root, not a file"
            )),
        }
    }
}

/// Validates write and edit targets against a scope declaration.
#[derive(Debug, Clone)]
pub struct ScopeGuard {
    root: PathBuf,
    /// The root as given, made absolute, when it differs from `root`.
    given_root: Option<PathBuf>,
    in_scope: Vec<GlobPattern>,
    out_of_scope: Vec<GlobPattern>,
    risk_tier: Option<u8>,
}

impl ScopeGuard {
    /// Build a guard for the repository at `root`.
    ///
    /// `root` is canonicalized, so it must exist. Absolute targets are
    /// accepted under either spelling of the root. Every pattern is compiled
    /// up front; an invalid pattern is a `ConfigError`.
    pub fn new(root: impl AsRef<Path>, declaration: &ScopeDeclaration) -> GateResult<Self> {
        let given = root.as_ref();
        let inaccessible = |e: std::io::Error| {
            GateError::config(format!(
                "repository root '{}' is not accessible: {}",
                given.display(),
                e
            ))
        };
        let root = given.canonicalize().map_err(inaccessible)?;
        let given_root = std::path::absolute(given).map_err(inaccessible)?;
        let given_root = (given_root != root).then_some(given_root);

        let compile = |patterns: &[String]| -> GateResult<Vec<GlobPattern>> {
            patterns.iter().map(|p| GlobPattern::new(p)).collect()
        };

        Ok(Self {
            root,
            given_root,
            in_scope: compile(&declaration.in_scope)?,
            out_of_scope: compile(&declaration.out_of_scope)?,
            risk_tier: declaration.risk_tier,
        })
    }

    /// Build a guard from the working-spec document at `spec_path`.
    pub fn from_working_spec(root: impl AsRef<Path>, spec_path: &Path) -> GateResult<Self> {
        let declaration = load_scope_declaration(spec_path)?;
        Self::new(root, &declaration)
    }

    /// The canonical repository root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn risk_tier(&self) -> Option<u8> {
        self.risk_tier
    }

    /// Repository-relative form of `target`, or `None` if it escapes.
    ///
    /// Absolute targets are tried against the canonical root, then the root
    /// as given, then with symlinks in their existing ancestors resolved.
    fn relative_path(&self, target: &str) -> Option<String> {
        let roots = std::iter::once(&self.root).chain(self.given_root.as_ref());
        for root in roots {
            if let Ok(path) = normalize_target(root, target) {
                return Some(path);
            }
        }
        let resolved = resolve_existing_ancestor(target)?;
        normalize_target(&self.root, &resolved).ok()
    }

    /// Classify one target path.
    pub fn classify(&self, target: &str) -> ScopeDecision {
        let Some(path) = self.relative_path(target) else {
            return ScopeDecision::Escape {
                target: target.to_string(),
            };
        };
        if path.is_empty() {
            return ScopeDecision::RepositoryRoot {
                target: target.to_string(),
            };
        }

        if let Some(pattern) = self.out_of_scope.iter().find(|p| p.matches(&path)) {
            return ScopeDecision::Excluded {
                path,
                pattern: pattern.to_string(),
            };
        }

        if let Some(pattern) = self.in_scope.iter().find(|p| p.matches(&path)) {
            return ScopeDecision::InScope {
                path,
                pattern: pattern.to_string(),
            };
        }

        let nearest = self.nearest_boundary(&path);
        ScopeDecision::Undeclared { path, nearest }
    }

    /// The in-scope pattern sharing the longest literal prefix with `path`.
    /// Ties go to the pattern declared first.
    fn nearest_boundary(&self, path: &str) -> Option<String> {
        let mut best: Option<(&GlobPattern, usize)> = None;
        for pattern in &self.in_scope {
            let shared = pattern.shared_prefix_len(path);
            if best.map_or(true, |(_, n)| shared > n) {
                best = Some((pattern, shared));
            }
        }
        best.map(|(pattern, _)| pattern.to_string())
    }
}

#[async_trait]
impl PolicyCheck for ScopeGuard {
    /// Check every target the event names; the first blocked target decides.
    ///
    /// Events that name no target path are not the guard's concern and are
    /// allowed.
    async fn evaluate(&self, event: &Event) -> GateResult<Verdict> {
        for target in event.targets() {
            let decision = self.classify(target);
            debug!(
                session_id = %event.session_id(),
                target = %target,
                decision = ?decision,
                "scope guard classified target"
            );
            if !decision.is_allowed() {
                return Ok(decision.to_verdict());
            }
        }
        Ok(Verdict::allow())
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use serde_json::json;
    use tempfile::TempDir;

    use hookgate_contracts::{
        event::{Event, Phase},
        scope::ScopeDeclaration,
        verdict::Outcome,
    };
    use hookgate_core::traits::PolicyCheck;

    use super::{ScopeDecision, ScopeGuard};

    fn declaration(in_scope: &[&str], out_of_scope: &[&str]) -> ScopeDeclaration {
        ScopeDeclaration {
            in_scope: in_scope.iter().map(|s| s.to_string()).collect(),
            out_of_scope: out_of_scope.iter().map(|s| s.to_string()).collect(),
            risk_tier: Some(2),
        }
    }

    fn guard(tmp: &TempDir, in_scope: &[&str], out_of_scope: &[&str]) -> ScopeGuard {
        ScopeGuard::new(tmp.path(), &declaration(in_scope, out_of_scope)).unwrap()
    }

    fn write(path: &str) -> Event {
        Event::new(Phase::PreAction, "Write", json!({ "file_path": path }), "s-1")
    }

    #[test]
    fn traversal_outside_root_blocks_even_with_match_all_scope() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["**"], &[]);

        let decision = g.classify("src/../../etc/passwd");
        assert!(matches!(decision, ScopeDecision::Escape { .. }));

        let verdict = decision.to_verdict();
        assert_eq!(verdict.outcome, Outcome::Block);
        assert!(verdict.reason.unwrap().contains("escapes the repository root"));
    }

    #[test]
    fn exclusion_wins_and_undeclared_is_denied() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["src/**"], &["src/generated/**"]);

        assert!(matches!(
            g.classify("src/generated/x.go"),
            ScopeDecision::Excluded { ref pattern, .. } if pattern == "src/generated/**"
        ));
        assert!(g.classify("src/main.go").is_allowed());
        assert!(matches!(
            g.classify("docs/readme.md"),
            ScopeDecision::Undeclared { nearest: Some(ref n), .. } if n == "src/**"
        ));
    }

    #[test]
    fn exclusion_wins_over_more_specific_inclusion() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["src/api/handler.rs"], &["src/**"]);
        assert!(matches!(g.classify("src/api/handler.rs"), ScopeDecision::Excluded { .. }));
    }

    #[test]
    fn nearest_boundary_prefers_longest_shared_prefix() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["docs/**", "src/api/**", "src/web/**"], &[]);

        match g.classify("src/api2/x.rs") {
            ScopeDecision::Undeclared { nearest, .. } => {
                // Shares `src` with both src patterns; the first declared wins.
                assert_eq!(nearest.as_deref(), Some("src/api/**"));
            }
            other => panic!("expected Undeclared, got {:?}", other),
        }

        let verdict = g.classify("src/web2/x.rs").to_verdict();
        assert!(verdict.reason.unwrap().contains("nearest in-scope boundary"));
    }

    #[test]
    fn empty_declaration_denies_everything() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &[], &[]);
        let verdict = g.classify("src/main.rs").to_verdict();
        assert_eq!(verdict.outcome, Outcome::Block);
        assert!(verdict.reason.unwrap().contains("no in-scope paths declared"));
    }

    #[test]
    fn absolute_targets_under_root_are_checked_relative() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["src/**"], &[]);

        let inside = g.root().join("src/lib.rs");
        assert!(g.classify(&inside.to_string_lossy()).is_allowed());
        assert!(matches!(g.classify("/etc/hosts"), ScopeDecision::Escape { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn absolute_targets_through_a_symlinked_root_are_in_scope() {
        let tmp = TempDir::new().unwrap();
        let real = tmp.path().join("real");
        let link = tmp.path().join("link");
        fs::create_dir_all(real.join("src")).unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let decl = declaration(&["src/**"], &[]);
        let via_link = ScopeGuard::new(&link, &decl).unwrap();
        let via_real = ScopeGuard::new(&real, &decl).unwrap();

        for g in [&via_link, &via_real] {
            for base in [&link, &real] {
                let target = base.join("src/main.rs");
                assert!(
                    g.classify(&target.to_string_lossy()).is_allowed(),
                    "{} should be in scope",
                    target.display()
                );
            }
            let outside = tmp.path().join("other/x.rs");
            assert!(matches!(
                g.classify(&outside.to_string_lossy()),
                ScopeDecision::Escape { .. }
            ));
        }
    }

    #[test]
    fn repository_root_is_not_a_writable_target() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["**"], &[]);
        assert!(matches!(g.classify("."), ScopeDecision::RepositoryRoot { .. }));
    }

    #[test]
    fn invalid_pattern_is_config_error() {
        let tmp = TempDir::new().unwrap();
        assert!(ScopeGuard::new(tmp.path(), &declaration(&["../x/**"], &[])).is_err());
    }

    #[test]
    fn loads_from_working_spec_file() {
        let tmp = TempDir::new().unwrap();
        let spec = tmp.path().join("working-spec.yaml");
        fs::write(&spec, "risk_tier: 1\nscope:\n  in: [\"src/**\"]\n  out: []\n").unwrap();

        let g = ScopeGuard::from_working_spec(tmp.path(), &spec).unwrap();
        assert_eq!(g.risk_tier(), Some(1));
        assert!(g.classify("src/a.rs").is_allowed());
    }

    #[tokio::test]
    async fn check_allows_events_without_targets() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["src/**"], &[]);

        let event = Event::new(Phase::PreAction, "Bash", json!({ "command": "ls" }), "s-1");
        let verdict = g.evaluate(&event).await.unwrap();
        assert_eq!(verdict.outcome, Outcome::Allow);
    }

    #[tokio::test]
    async fn check_blocks_on_first_out_of_scope_target() {
        let tmp = TempDir::new().unwrap();
        let g = guard(&tmp, &["src/**"], &[]);

        assert_eq!(g.evaluate(&write("src/ok.rs")).await.unwrap().outcome, Outcome::Allow);

        let multi = Event::new(
            Phase::PreAction,
            "MultiEdit",
            json!({ "edits": [{ "file_path": "src/ok.rs" }, { "file_path": "Cargo.toml" }] }),
            "s-1",
        );
        let verdict = g.evaluate(&multi).await.unwrap();
        assert_eq!(verdict.outcome, Outcome::Block);
        assert!(verdict.reason.unwrap().contains("'Cargo.toml'"));
    }
}

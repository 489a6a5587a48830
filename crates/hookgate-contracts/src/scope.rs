//! Scope declaration types.
//!
//! A `ScopeDeclaration` is the part of a repository's working-spec document
//! the scope guard reads. It is owned by the repository and never written by
//! hookgate.

use serde::{Deserialize, Serialize};

/// The in-scope and out-of-scope path globs for the active change.
///
/// Patterns are repository-relative, slash-separated globs where `*`
/// matches within one path segment and `**` matches across segments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScopeDeclaration {
    /// Paths the agent may write. Anything not listed is denied.
    #[serde(default, alias = "in")]
    pub in_scope: Vec<String>,

    /// Paths the agent may never write, even if an in-scope pattern matches.
    #[serde(default, alias = "out")]
    pub out_of_scope: Vec<String>,

    /// Risk tier of the change (1 = highest risk). Informational.
    #[serde(default)]
    pub risk_tier: Option<u8>,
}

//! Repository-relative glob patterns, compiled with `globset`.
//!
//! Patterns are slash-separated:
//!
//! - `*` matches any run of characters within one path segment
//! - `?` matches exactly one character within one path segment
//! - `**` as a whole segment matches zero or more segments
//! - everything else matches literally, case-sensitively
//!
//! A trailing slash means "everything below": `src/` is `src/**`.

use std::fmt;

use globset::{GlobBuilder, GlobMatcher};

use hookgate_contracts::error::{GateError, GateResult};

/// A compiled glob pattern.
#[derive(Debug, Clone)]
pub struct GlobPattern {
    source: String,
    /// Leading segments without wildcards, for nearest-boundary reporting.
    literal_prefix: Vec<String>,
    matcher: GlobMatcher,
}

impl GlobPattern {
    /// Compile `pattern`.
    ///
    /// Rejects empty patterns, absolute patterns and patterns containing `..`
    /// with `GateError::ConfigError`: a scope declaration cannot point outside
    /// the repository.
    pub fn new(pattern: &str) -> GateResult<Self> {
        let trimmed = pattern.trim();
        if trimmed.is_empty() {
            return Err(GateError::config("empty scope pattern"));
        }
        if trimmed.starts_with('/') {
            return Err(GateError::config(format!(
                "scope pattern '{trimmed}' must be repository-relative"
            )));
        }

        let mut body = trimmed.strip_prefix("./").unwrap_or(trimmed).to_string();
        if body.ends_with('/') {
            body.push_str("**");
        }

        let mut segments: Vec<&str> = Vec::new();
        for part in body.split('/') {
            match part {
                "" | "." => continue,
                ".." => {
                    return Err(GateError::config(format!(
                        "scope pattern '{trimmed}' must not contain '..'"
                    )))
                }
                // Consecutive `**` are equivalent to one.
                "**" if segments.last() == Some(&"**") => continue,
                other => segments.push(other),
            }
        }

        if segments.is_empty() {
            return Err(GateError::config(format!(
                "scope pattern '{trimmed}' matches nothing"
            )));
        }

        let matcher = GlobBuilder::new(&segments.join("/"))
            .literal_separator(true)
            .build()
            .map_err(|e| GateError::config(format!("invalid scope pattern '{trimmed}': {e}")))?
            .compile_matcher();

        let literal_prefix = segments
            .iter()
            .take_while(|s| !s.contains(['*', '?', '[', '{']))
            .map(|s| s.to_string())
            .collect();

        Ok(Self {
            source: trimmed.to_string(),
            literal_prefix,
            matcher,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Return true if the normalized, slash-separated `path` matches.
    pub fn matches(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Number of leading literal segments `path` shares with this pattern.
    ///
    /// Used to name the nearest scope boundary when a path is undeclared.
    pub fn shared_prefix_len(&self, path: &str) -> usize {
        self.literal_prefix
            .iter()
            .zip(path.split('/'))
            .take_while(|(seg, part)| seg.as_str() == *part)
            .count()
    }
}

impl fmt::Display for GlobPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

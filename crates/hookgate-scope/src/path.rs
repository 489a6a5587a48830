//! Lexical path normalization.
//!
//! Targets are reduced to a canonical, slash-separated, repository-relative
//! form before any glob is consulted. `.` and `..` are resolved lexically;
//! the filesystem is never touched, so a target does not need to exist.
//! Anything that resolves above the repository root is a `PathEscape`.
//!
//! `resolve_existing_ancestor` is the one filesystem-aware step, used when an
//! absolute target reaches the root through a symlink.

use std::path::Path;

use hookgate_contracts::error::{GateError, GateResult};

/// Normalize `target` relative to `root`.
///
/// `root` must be absolute. Relative targets are taken relative to `root`;
/// absolute targets must lie under it. Backslashes are treated as
/// separators. Returns the empty string when the target is the root itself.
pub fn normalize_target(root: &Path, target: &str) -> GateResult<String> {
    let unified = target.trim().replace('\\', "/");
    let escape = || GateError::PathEscape {
        path: target.to_string(),
    };

    let relative: Vec<&str> = if unified.starts_with('/') {
        let root_str = root.to_string_lossy().replace('\\', "/");
        let root_parts = clean_absolute(&root_str);
        let target_parts = clean_absolute(&unified);
        if !target_parts.starts_with(&root_parts) {
            return Err(escape());
        }
        target_parts[root_parts.len()..].to_vec()
    } else {
        let mut stack: Vec<&str> = Vec::new();
        for part in unified.split('/') {
            match part {
                "" | "." => {}
                ".." => {
                    if stack.pop().is_none() {
                        return Err(escape());
                    }
                }
                other => stack.push(other),
            }
        }
        stack
    };

    Ok(relative.join("/"))
}

/// Resolve symlinks in the longest existing ancestor of an absolute target
/// and re-attach the remaining components. Returns `None` for relative
/// targets.
pub fn resolve_existing_ancestor(target: &str) -> Option<String> {
    let unified = target.trim().replace('\\', "/");
    if !unified.starts_with('/') {
        return None;
    }

    let parts = clean_absolute(&unified);
    (0..=parts.len()).rev().find_map(|split| {
        let ancestor = format!("/{}", parts[..split].join("/"));
        let real = Path::new(&ancestor).canonicalize().ok()?;
        let mut resolved = real.to_string_lossy().replace('\\', "/");
        for part in &parts[split..] {
            if !resolved.ends_with('/') {
                resolved.push('/');
            }
            resolved.push_str(part);
        }
        Some(resolved)
    })
}

/// Resolve an absolute path lexically. `..` at the filesystem root stays there.
fn clean_absolute(path: &str) -> Vec<&str> {
    let mut stack: Vec<&str> = Vec::new();
    for part in path.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }
    stack
}

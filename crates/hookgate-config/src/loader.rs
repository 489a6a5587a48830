//! Hook configuration loading and validation.
//!
//! `GateConfig` loads a `HooksConfig` from a TOML string or file and builds
//! the validated `HookDefinition`s a `Dispatcher` runs.
//!
//! Build algorithm:
//!
//! 1. Validate every entry: unique non-empty name, non-zero timeout, a
//!    non-empty matcher for action phases and none for lifecycle phases.
//! 2. Resolve relative paths against the configuration file's directory.
//! 3. Construct each entry's check. Scope guards load their working spec and
//!    compile their globs here, so an unreadable declaration fails the load.
//! 4. Return the hooks in declaration order.
//!
//! Any failure is a `ConfigError`: the caller must not dispatch with a
//! partially built hook chain.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use hookgate_contracts::error::{GateError, GateResult};
use hookgate_core::{
    check::{CheckRegistry, CommandCheck},
    traits::PolicyCheck,
    HookDefinition, Matcher,
};
use hookgate_scope::ScopeGuard;

use crate::schema::{CheckSpec, HookEntry, HooksConfig};

/// A parsed hook configuration and the directory its paths are relative to.
///
/// ```rust,ignore
/// use hookgate_config::GateConfig;
///
/// let config = GateConfig::from_file(Path::new("hookgate.toml"))?;
/// let hooks = config.build(&CheckRegistry::new())?;
/// ```
#[derive(Debug, Clone)]
pub struct GateConfig {
    config: HooksConfig,
    base_dir: PathBuf,
}

impl GateConfig {
    /// Parse `s` as TOML. Relative paths resolve against `base_dir`.
    ///
    /// Returns `GateError::ConfigError` if the TOML is malformed or does not
    /// match the `HooksConfig` schema.
    pub fn from_toml_str(s: &str, base_dir: impl Into<PathBuf>) -> GateResult<Self> {
        let config: HooksConfig = toml::from_str(s)
            .map_err(|e| GateError::config(format!("failed to parse hook configuration TOML: {}", e)))?;
        Ok(Self {
            config,
            base_dir: base_dir.into(),
        })
    }

    /// Read the file at `path` and parse it. Relative paths inside resolve
    /// against the file's directory.
    pub fn from_file(path: &Path) -> GateResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            GateError::config(format!(
                "failed to read hook configuration '{}': {}",
                path.display(),
                e
            ))
        })?;
        let base_dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        Self::from_toml_str(&contents, base_dir)
    }

    pub fn config(&self) -> &HooksConfig {
        &self.config
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// The configured audit log path, resolved against the base directory.
    pub fn audit_log(&self) -> Option<PathBuf> {
        self.config.audit_log.as_deref().map(|p| self.resolve(p))
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    /// Check every entry without constructing any check.
    pub fn validate(&self) -> GateResult<()> {
        let mut seen = HashSet::new();
        for entry in &self.config.hooks {
            validate_entry(entry)?;
            if !seen.insert(entry.name.as_str()) {
                return Err(GateError::config(format!(
                    "duplicate hook name '{}'",
                    entry.name
                )));
            }
        }
        Ok(())
    }

    /// Validate and build the hook chain, in declaration order.
    ///
    /// `registry` supplies the checks `type = "registered"` entries refer to.
    pub fn build(&self, registry: &CheckRegistry) -> GateResult<Vec<HookDefinition>> {
        self.validate()?;

        let mut hooks = Vec::with_capacity(self.config.hooks.len());
        for entry in &self.config.hooks {
            let check = self.build_check(entry, registry)?;
            let matcher = match entry.matcher.as_deref() {
                Some(pattern) => Matcher::new(entry.phase, pattern),
                None => Matcher::any_tool(entry.phase),
            };

            let mut hook = HookDefinition::new(entry.name.clone(), matcher, check)
                .with_timeout(Duration::from_millis(entry.timeout_ms));
            if entry.safety_critical {
                hook = hook.safety_critical();
            }
            if let Some(mode) = entry.failure_mode {
                hook = hook.with_failure_mode(mode);
            }

            debug!(
                hook = %hook.name(),
                matcher = %hook.matcher(),
                timeout_ms = entry.timeout_ms,
                failure_mode = hook.failure_mode().as_str(),
                "hook configured"
            );
            hooks.push(hook);
        }

        info!(hook_count = hooks.len(), "hook configuration loaded");
        Ok(hooks)
    }

    fn build_check(&self, entry: &HookEntry, registry: &CheckRegistry) -> GateResult<Arc<dyn PolicyCheck>> {
        match &entry.check {
            CheckSpec::Command {
                command,
                args,
                env,
                working_dir,
            } => {
                // Bare program names are looked up on PATH; anything with a
                // directory component is relative to the configuration.
                let program = if command.components().count() > 1 {
                    self.resolve(command)
                } else {
                    command.clone()
                };

                let mut check = CommandCheck::new(program).with_args(args.iter().cloned());
                for (key, value) in env {
                    check = check.with_env(key.clone(), value.clone());
                }
                if let Some(dir) = working_dir {
                    check = check.with_working_dir(self.resolve(dir));
                }
                Ok(Arc::new(check))
            }

            CheckSpec::ScopeGuard {
                working_spec,
                repo_root,
            } => {
                let root = repo_root
                    .as_deref()
                    .map(|p| self.resolve(p))
                    .unwrap_or_else(|| self.base_dir.clone());
                let guard = ScopeGuard::from_working_spec(&root, &self.resolve(working_spec))
                    .map_err(|e| in_hook(&entry.name, e))?;
                Ok(Arc::new(guard))
            }

            CheckSpec::Registered { id } => registry.get(id).ok_or_else(|| {
                GateError::config(format!(
                    "hook '{}' refers to unregistered check '{}' (registered: [{}])",
                    entry.name,
                    id,
                    registry.names().join(", ")
                ))
            }),
        }
    }
}

/// Prefix a configuration error with the hook it came from.
fn in_hook(name: &str, error: GateError) -> GateError {
    match error {
        GateError::ConfigError { reason } => GateError::config(format!("hook '{}': {}", name, reason)),
        other => other,
    }
}

fn validate_entry(entry: &HookEntry) -> GateResult<()> {
    let fail = |reason: String| -> GateResult<()> {
        Err(GateError::config(format!("hook '{}': {}", entry.name, reason)))
    };

    if entry.name.trim().is_empty() {
        return Err(GateError::config("hook name must not be empty"));
    }
    if entry.timeout_ms == 0 {
        return fail("timeout_ms must be greater than zero".to_string());
    }

    match (entry.phase.is_lifecycle(), entry.matcher.as_deref()) {
        (false, None) => return fail(format!("phase {} requires a matcher", entry.phase)),
        (false, Some(pattern)) if Matcher::new(entry.phase, pattern).is_empty() => {
            return fail(format!("matcher '{}' names no tool", pattern));
        }
        (true, Some(_)) => {
            return fail(format!(
                "phase {} has no tool to match; remove the matcher",
                entry.phase
            ));
        }
        _ => {}
    }

    match &entry.check {
        CheckSpec::Command { command, .. } if command.as_os_str().is_empty() => {
            fail("command must not be empty".to_string())
        }
        CheckSpec::Registered { id } if id.trim().is_empty() => {
            fail("registered check id must not be empty".to_string())
        }
        _ => Ok(()),
    }
}

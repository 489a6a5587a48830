//! # hookgate-config
//!
//! TOML hook configuration for the hookgate dispatcher.
//!
//! ## Overview
//!
//! [`GateConfig`] reads an ordered `[[hooks]]` array, validates it, and builds
//! the `HookDefinition`s a `Dispatcher` runs. Configuration problems are
//! fatal: `build` either returns the whole chain or a `ConfigError`.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use std::path::Path;
//! use hookgate_config::GateConfig;
//! use hookgate_core::check::CheckRegistry;
//!
//! let config = GateConfig::from_file(Path::new("hookgate.toml"))?;
//! let hooks = config.build(&CheckRegistry::new())?;
//! // Pass `hooks` to `hookgate_core::Dispatcher::new(...)`.
//! ```

pub mod loader;
pub mod schema;

pub use loader::GateConfig;
pub use schema::{CheckSpec, HookEntry, HooksConfig, DEFAULT_TIMEOUT_MS};

// ── Tests ─────────────────────────────────────────────────────────────────────

//! # hookgate-core
//!
//! The event-dispatch and decision-aggregation engine of hookgate.
//!
//! This crate provides:
//! - The `PolicyCheck` and `AuditSink` traits
//! - `Matcher` and `HookDefinition`, the configuration-time hook model
//! - The hook adapter (`run_hook`), which bounds every check by its timeout
//!   and resolves unavailable checks through the hook's failure mode
//! - The decision aggregator (`fold`, `Aggregator`)
//! - The `Dispatcher` that wires them together for every event
//! - Built-in check variants: subprocess (`CommandCheck`) and in-process
//!   function (`FnCheck`)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use hookgate_core::{Dispatcher, HookDefinition, Matcher};
//! use hookgate_contracts::event::Phase;
//!
//! let hook = HookDefinition::new("scope", Matcher::new(Phase::PreAction, "Write|Edit"), check);
//! let dispatcher = Dispatcher::new(vec![hook], audit_log);
//! let decision = dispatcher.dispatch(&event).await?;
//! ```

pub mod adapter;
pub mod aggregate;
pub mod check;
pub mod dispatcher;
pub mod hook;
pub mod matcher;
pub mod traits;

pub use adapter::run_hook;
pub use aggregate::{fold, Aggregator};
pub use dispatcher::Dispatcher;
pub use hook::{FailureMode, HookDefinition, DEFAULT_HOOK_TIMEOUT};
pub use matcher::Matcher;

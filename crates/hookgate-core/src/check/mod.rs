//! Built-in `PolicyCheck` variants.
//!
//! - [`CommandCheck`] runs an external executable and speaks JSON over
//!   stdin/stdout.
//! - [`FnCheck`] wraps an in-process closure.
//!
//! [`CheckRegistry`] lets a hosting application register in-process checks by
//! name so configuration files can refer to them.

mod command;
mod function;

use std::collections::HashMap;
use std::sync::Arc;

pub use command::CommandCheck;
pub use function::{CheckFn, FnCheck};

use crate::traits::PolicyCheck;

/// Named in-process checks provided by the hosting application.
#[derive(Default, Clone)]
pub struct CheckRegistry {
    checks: HashMap<String, Arc<dyn PolicyCheck>>,
}

impl CheckRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `check` under `name`. Registering the same name twice
    /// replaces the previous check.
    pub fn register(&mut self, name: impl Into<String>, check: Arc<dyn PolicyCheck>) {
        self.checks.insert(name.into(), check);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn PolicyCheck>> {
        self.checks.get(name).cloned()
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.checks.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

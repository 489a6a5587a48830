//! Hook matchers.
//!
//! A matcher selects the events a hook applies to: one phase plus a
//! pipe-separated alternation of exact tool names, e.g. `"Write|Edit"`.
//! Names are compiled into a set once, so matching is a hash lookup.
//! Matching is case-sensitive and never glob- or regex-based.

use std::collections::HashSet;
use std::fmt;

use hookgate_contracts::event::Phase;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Tools {
    /// Every event of the phase. Used for session lifecycle hooks.
    Any,
    /// Exact names. An empty set matches nothing.
    Names(HashSet<String>),
}

/// Selects which events a hook applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Matcher {
    phase: Phase,
    pattern: String,
    tools: Tools,
}

impl Matcher {
    /// Compile `pattern` for `phase`.
    ///
    /// Whitespace around each alternative is trimmed and empty alternatives
    /// are dropped. A pattern with no names matches no tool: a misconfigured
    /// hook stays silent instead of matching everything.
    pub fn new(phase: Phase, pattern: &str) -> Self {
        let names = pattern
            .split('|')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Self {
            phase,
            pattern: pattern.to_string(),
            tools: Tools::Names(names),
        }
    }

    /// Match every event of `phase` regardless of tool.
    ///
    /// Session lifecycle events carry no tool, so their hooks use this.
    pub fn any_tool(phase: Phase) -> Self {
        Self {
            phase,
            pattern: String::new(),
            tools: Tools::Any,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True if this matcher can never match an event.
    pub fn is_empty(&self) -> bool {
        matches!(&self.tools, Tools::Names(names) if names.is_empty())
    }

    /// Return true if an event with `phase` and `tool` is selected.
    pub fn matches(&self, phase: Phase, tool: &str) -> bool {
        if phase != self.phase {
            return false;
        }
        match &self.tools {
            Tools::Any => true,
            Tools::Names(names) => names.contains(tool),
        }
    }
}

impl fmt::Display for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tools {
            Tools::Any => write!(f, "{}[*]", self.phase),
            Tools::Names(_) => write!(f, "{}[{}]", self.phase, self.pattern),
        }
    }
}

//! Scope declaration loading.
//!
//! The scope declaration lives in the repository's working-spec document.
//! Only three fields are read; everything else in the document is ignored:
//!
//! ```yaml
//! risk_tier: 2
//! scope:
//!   in: ["src/**", "tests/**"]
//!   out: ["src/generated/**"]
//! ```
//!
//! YAML is the native format. `.toml` and `.json` documents are accepted by
//! extension.

use std::path::Path;

use serde::Deserialize;

use hookgate_contracts::{
    error::{GateError, GateResult},
    scope::ScopeDeclaration,
};

/// Document formats a working spec may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecFormat {
    Yaml,
    Toml,
    Json,
}

impl SpecFormat {
    /// Pick the format from the file extension. Unknown extensions are YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some("toml") => SpecFormat::Toml,
            Some("json") => SpecFormat::Json,
            _ => SpecFormat::Yaml,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WorkingSpec {
    #[serde(default)]
    risk_tier: Option<u8>,
    scope: Option<ScopeSection>,
}

#[derive(Debug, Deserialize)]
struct ScopeSection {
    #[serde(default, rename = "in", alias = "in_scope")]
    in_scope: Vec<String>,
    #[serde(default, rename = "out", alias = "out_of_scope")]
    out_of_scope: Vec<String>,
}

/// Parse the scope declaration out of a working-spec document.
///
/// Returns `GateError::ConfigError` if the document does not parse or has no
/// `scope` section.
pub fn parse_scope_declaration(contents: &str, format: SpecFormat) -> GateResult<ScopeDeclaration> {
    let spec: WorkingSpec = match format {
        SpecFormat::Yaml => serde_yaml::from_str(contents)
            .map_err(|e| GateError::config(format!("failed to parse working spec YAML: {e}")))?,
        SpecFormat::Toml => toml::from_str(contents)
            .map_err(|e| GateError::config(format!("failed to parse working spec TOML: {e}")))?,
        SpecFormat::Json => serde_json::from_str(contents)
            .map_err(|e| GateError::config(format!("failed to parse working spec JSON: {e}")))?,
    };

    let scope = spec
        .scope
        .ok_or_else(|| GateError::config("working spec has no 'scope' section"))?;

    Ok(ScopeDeclaration {
        in_scope: scope.in_scope,
        out_of_scope: scope.out_of_scope,
        risk_tier: spec.risk_tier,
    })
}

/// Read the working spec at `path` and extract its scope declaration.
pub fn load_scope_declaration(path: &Path) -> GateResult<ScopeDeclaration> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        GateError::config(format!(
            "failed to read working spec '{}': {}",
            path.display(),
            e
        ))
    })?;
    parse_scope_declaration(&contents, SpecFormat::from_path(path))
}

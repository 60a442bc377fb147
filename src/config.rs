//! Mutation rule configuration
//!
//! Configuration is always handed in by the embedding process: either built
//! in code, parsed with [`MutatorConfig::from_json`], or read from a file the
//! caller names via [`load_config`]. Without any of these the built-in
//! defaults apply (`KUBE=true`, skip on conflict).
//!
//! The file is JSON in camelCase, e.g.
//! `{"env": {"name": "KUBE", "value": "true", "onConflict": "skip"}}`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Error, Result, DEFAULT_ENV_NAME, DEFAULT_ENV_VALUE};

/// What the env injection rule does when the variable already exists
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EnvConflictPolicy {
    /// Leave the container untouched if a variable with the same name exists
    #[default]
    Skip,
    /// Replace the existing variable's value with the configured one
    Overwrite,
}

/// Environment variable injected into every container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EnvInjectionConfig {
    /// Variable name
    pub name: String,
    /// Literal value
    pub value: String,
    /// Behavior when the name is already present
    pub on_conflict: EnvConflictPolicy,
}

impl Default for EnvInjectionConfig {
    fn default() -> Self {
        Self {
            name: DEFAULT_ENV_NAME.to_string(),
            value: DEFAULT_ENV_VALUE.to_string(),
            on_conflict: EnvConflictPolicy::default(),
        }
    }
}

/// Configuration for the default rule chain
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MutatorConfig {
    /// Environment injection rule settings
    pub env: EnvInjectionConfig,
}

impl MutatorConfig {
    /// Parse configuration from a JSON document
    pub fn from_json(data: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(data)
            .map_err(|e| Error::config(format!("failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would produce an invalid container env entry
    pub fn validate(&self) -> Result<()> {
        if self.env.name.trim().is_empty() {
            return Err(Error::config("env.name must not be empty"));
        }
        Ok(())
    }
}

/// Load and validate configuration from the JSON file at `path`
///
/// The file must exist; callers without a file use [`MutatorConfig::default`].
pub fn load_config(path: &Path) -> Result<MutatorConfig> {
    let data = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("failed to read {}: {}", path.display(), e)))?;
    MutatorConfig::from_json(&data)
}

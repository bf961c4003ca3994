//! Cache-Control configuration.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::directive::DEFAULT_ALLOWED_DIRECTIVES;

/// How `public_cache` reacts to its priority request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublicTransition {
    /// Move to `Public` when the request is accepted, like the other states.
    #[default]
    Strict,
    /// Move to `Public` only when the request is rejected.
    ///
    /// Matches the behavior of older deployments that relied on it.
    Legacy,
}

/// Cache-Control policy configuration.
///
/// ```toml
/// extra_directives = ["immutable"]
/// public_transition = "strict"
///
/// [state_directives.public]
/// max-age = 300
/// s-maxage = 600
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheControlConfig {
    /// Directive names the resolver accepts.
    #[serde(default = "default_allowed_directives")]
    pub allowed_directives: Vec<String>,

    /// Additional directive names appended to the allow-list.
    #[serde(default)]
    pub extra_directives: Vec<String>,

    /// Behavior of `public_cache`.
    #[serde(default)]
    pub public_transition: PublicTransition,

    /// Per-state directive overrides applied on top of the defaults.
    #[serde(default)]
    pub state_directives: BTreeMap<String, serde_json::Map<String, serde_json::Value>>,
}

fn default_allowed_directives() -> Vec<String> {
    DEFAULT_ALLOWED_DIRECTIVES.iter().map(|s| s.to_string()).collect()
}

impl Default for CacheControlConfig {
    fn default() -> Self {
        Self {
            allowed_directives: default_allowed_directives(),
            extra_directives: Vec::new(),
            public_transition: PublicTransition::default(),
            state_directives: BTreeMap::new(),
        }
    }
}

impl CacheControlConfig {
    /// Load config from a file. Paths ending in `.json` are parsed as JSON,
    /// anything else as TOML.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read cache config file: {}", path))?;

        if path.ends_with(".json") {
            Self::from_json_str(&content).with_context(|| format!("Failed to parse JSON cache config: {}", path))
        } else {
            Self::from_toml_str(&content).with_context(|| format!("Failed to parse TOML cache config: {}", path))
        }
    }

    /// Parse config from a TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Parse config from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Add a directive name to the allow-list.
    pub fn allow_directive(mut self, name: impl Into<String>) -> Self {
        self.extra_directives.push(name.into());
        self
    }

    /// Set the `public_cache` behavior.
    pub fn with_public_transition(mut self, mode: PublicTransition) -> Self {
        self.public_transition = mode;
        self
    }

    /// Add a directive override for a state label.
    pub fn with_state_directive(
        mut self,
        state: impl Into<String>,
        directive: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.state_directives
            .entry(state.into())
            .or_default()
            .insert(directive.into(), value.into());
        self
    }

    /// Whether a directive name is allowed (case-insensitive).
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allowed_directives
            .iter()
            .chain(self.extra_directives.iter())
            .any(|allowed| allowed.eq_ignore_ascii_case(name))
    }
}

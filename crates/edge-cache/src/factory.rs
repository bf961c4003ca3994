//! Per-request resolver construction.

use std::sync::Arc;

use tracing::debug;

use crate::config::CacheControlConfig;
use crate::error::CachePolicyResult;
use crate::policy::{default_tables, CachePolicyResolver, StateTables};
use crate::state::CacheState;

/// Builds request-scoped [`CachePolicyResolver`]s from a validated config.
///
/// Build one at startup and share it behind an `Arc`. Every call to
/// [`resolver`](Self::resolver) returns an independent resolver in its
/// initial state, so policy decisions never leak between requests.
#[derive(Debug, Clone)]
pub struct CachePolicyFactory {
    config: Arc<CacheControlConfig>,
    seed: Arc<StateTables>,
}

impl Default for CachePolicyFactory {
    fn default() -> Self {
        Self {
            config: Arc::new(CacheControlConfig::default()),
            seed: Arc::new(default_tables()),
        }
    }
}

impl CachePolicyFactory {
    /// Validate the config and precompute seeded directive tables.
    ///
    /// Fails on unknown state labels, disallowed directives, or unset values
    /// in `state_directives`.
    pub fn from_config(config: CacheControlConfig) -> CachePolicyResult<Self> {
        let config = Arc::new(config);
        let mut builder = CachePolicyResolver::from_parts(config.clone(), Arc::new(default_tables()));

        for (label, directives) in &config.state_directives {
            let state: CacheState = label.parse()?;
            builder.set_state_directives_from_json(state, directives)?;
            debug!(state = %state, count = directives.len(), "seeded state directive overrides");
        }

        Ok(Self {
            seed: Arc::new(builder.tables().clone()),
            config,
        })
    }

    /// Configuration shared by every resolver from this factory.
    pub fn config(&self) -> &CacheControlConfig {
        &self.config
    }

    /// A fresh resolver for one request.
    pub fn resolver(&self) -> CachePolicyResolver {
        CachePolicyResolver::from_parts(self.config.clone(), self.seed.clone())
    }
}

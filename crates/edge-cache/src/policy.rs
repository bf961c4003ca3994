//! Cache policy resolution with priority arbitration.
//!
//! Several parts of a request pipeline may want a say in how a response is
//! cached: a page marks itself public, a session layer marks it private, an
//! error path disables caching. Instead of last-write-wins, each request
//! carries a priority level and the resolver remembers the highest level it
//! has accepted. Weaker requests arriving later are ignored.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{CacheControlConfig, PublicTransition};
use crate::directive::{DirectiveTable, DirectiveValue};
use crate::error::{CachePolicyError, CachePolicyResult};
use crate::state::{priority, CacheState, StateSet};

pub(crate) type StateTables = [DirectiveTable; CacheState::COUNT];

/// Build the default directive tables for every state.
pub(crate) fn default_tables() -> StateTables {
    CacheState::ALL.map(|state| DirectiveTable::with_flags(state.default_directives()))
}

/// Resolves the Cache-Control policy for a single response.
///
/// A resolver is request-scoped: obtain a fresh one per request from a
/// [`CachePolicyFactory`](crate::CachePolicyFactory), or call
/// [`reset`](Self::reset) before reusing one.
#[derive(Debug, Clone)]
pub struct CachePolicyResolver {
    current_state: CacheState,
    forcing_level: u8,
    tables: StateTables,
    seed: Arc<StateTables>,
    config: Arc<CacheControlConfig>,
}

impl Default for CachePolicyResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl CachePolicyResolver {
    /// Create a resolver with the default configuration.
    pub fn new() -> Self {
        Self::from_parts(Arc::new(CacheControlConfig::default()), Arc::new(default_tables()))
    }

    pub(crate) fn from_parts(config: Arc<CacheControlConfig>, seed: Arc<StateTables>) -> Self {
        Self {
            current_state: CacheState::Enabled,
            forcing_level: 0,
            tables: (*seed).clone(),
            seed,
            config,
        }
    }

    pub(crate) fn tables(&self) -> &StateTables {
        &self.tables
    }

    /// Current caching state.
    pub fn current_state(&self) -> CacheState {
        self.current_state
    }

    /// Highest priority level accepted so far.
    pub fn forcing_level(&self) -> u8 {
        self.forcing_level
    }

    /// Configuration this resolver validates against.
    pub fn config(&self) -> &CacheControlConfig {
        &self.config
    }

    /// Directive table for a state.
    pub fn table(&self, state: CacheState) -> &DirectiveTable {
        &self.tables[state.index()]
    }

    /// Return to the initial state: `Enabled`, level 0, seeded directives.
    pub fn reset(&mut self) -> &mut Self {
        self.current_state = CacheState::Enabled;
        self.forcing_level = 0;
        self.tables = (*self.seed).clone();
        self
    }

    // === Priority arbitration ===

    /// Request a priority level, returning whether it was accepted.
    ///
    /// The effective level is `level`, plus [`priority::FORCED`] when
    /// `force` is set. A request is accepted when its effective level is at
    /// least the current threshold, which then becomes the new threshold.
    pub fn request_state(&mut self, level: u8, force: bool) -> bool {
        let effective = if force {
            level.saturating_add(priority::FORCED)
        } else {
            level
        };

        if effective < self.forcing_level {
            debug!(
                requested = level,
                effective,
                threshold = self.forcing_level,
                "cache policy request rejected"
            );
            return false;
        }

        debug!(
            requested = level,
            effective,
            threshold = self.forcing_level,
            "cache policy request accepted"
        );
        self.forcing_level = effective;
        true
    }

    fn transition(&mut self, target: CacheState, force: bool) -> &mut Self {
        let accepted = self.request_state(target.priority(), force);

        let moves = match (target, self.config.public_transition) {
            (CacheState::Public, PublicTransition::Legacy) => !accepted,
            _ => accepted,
        };

        if moves {
            if !accepted {
                warn!(
                    from = %self.current_state,
                    threshold = self.forcing_level,
                    "legacy public transition applied on rejected request"
                );
            }
            self.current_state = target;
        }

        self
    }

    /// Allow caching with only the `Enabled` directives.
    pub fn enable_cache(&mut self, force: bool) -> &mut Self {
        self.transition(CacheState::Enabled, force)
    }

    /// Mark the response cacheable by shared caches.
    pub fn public_cache(&mut self, force: bool) -> &mut Self {
        self.transition(CacheState::Public, force)
    }

    /// Mark the response cacheable by the user's browser only.
    pub fn private_cache(&mut self, force: bool) -> &mut Self {
        self.transition(CacheState::Private, force)
    }

    /// Disable caching entirely.
    pub fn disable_cache(&mut self, force: bool) -> &mut Self {
        self.transition(CacheState::Disabled, force)
    }

    // === Directive tables ===

    fn normalize_directive(&self, directive: &str) -> CachePolicyResult<String> {
        let name = directive.to_lowercase();
        if !self.config.is_allowed(&name) {
            return Err(CachePolicyError::InvalidDirective(name));
        }
        Ok(name)
    }

    fn write_directive(&mut self, states: &StateSet, name: &str, value: DirectiveValue) -> CachePolicyResult<()> {
        value.validate(name)?;

        for state in states.iter() {
            let table = &mut self.tables[state.index()];
            if value.is_absent() {
                table.remove(name);
            } else {
                table.insert(name, value.clone());
            }
        }

        Ok(())
    }

    /// Set a directive on one or more states, bypassing priority.
    ///
    /// Writing `false` removes the directive.
    pub fn set_state_directive(
        &mut self,
        states: impl Into<StateSet>,
        directive: &str,
        value: impl Into<DirectiveValue>,
    ) -> CachePolicyResult<&mut Self> {
        let name = self.normalize_directive(directive)?;
        self.write_directive(&states.into(), &name, value.into())?;
        Ok(self)
    }

    /// Set a directive on states given by label.
    pub fn set_state_directive_by_name<S: AsRef<str>>(
        &mut self,
        labels: &[S],
        directive: &str,
        value: impl Into<DirectiveValue>,
    ) -> CachePolicyResult<&mut Self> {
        let name = self.normalize_directive(directive)?;
        let states = StateSet::parse(labels)?;
        self.write_directive(&states, &name, value.into())?;
        Ok(self)
    }

    /// Apply several directives in order.
    ///
    /// Stops at the first invalid entry; entries before it stay applied.
    pub fn set_state_directives_from_map<I, K, V>(
        &mut self,
        states: impl Into<StateSet>,
        entries: I,
    ) -> CachePolicyResult<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<DirectiveValue>,
    {
        let states = states.into();
        for (directive, value) in entries {
            let name = self.normalize_directive(directive.as_ref())?;
            self.write_directive(&states, &name, value.into())?;
        }
        Ok(self)
    }

    /// Apply directives from a JSON object, in iteration order.
    ///
    /// `null` values fail with [`CachePolicyError::InvalidValue`]. Stops at
    /// the first invalid entry; entries before it stay applied.
    pub fn set_state_directives_from_json(
        &mut self,
        states: impl Into<StateSet>,
        entries: &serde_json::Map<String, serde_json::Value>,
    ) -> CachePolicyResult<&mut Self> {
        let states = states.into();
        for (directive, value) in entries {
            let name = self.normalize_directive(directive)?;
            let value = DirectiveValue::from_json(&name, value.clone())?;
            self.write_directive(&states, &name, value)?;
        }
        Ok(self)
    }

    /// Remove a directive from one or more states.
    pub fn remove_state_directive(
        &mut self,
        states: impl Into<StateSet>,
        directive: &str,
    ) -> CachePolicyResult<&mut Self> {
        self.set_state_directive(states, directive, false)
    }

    /// Whether a state carries a directive (case-insensitive).
    pub fn has_state_directive(&self, state: CacheState, directive: &str) -> bool {
        self.table(state).contains(&directive.to_lowercase())
    }

    /// Value of a directive on a state, or `Flag(false)` when absent.
    ///
    /// Use [`has_state_directive`](Self::has_state_directive) to check
    /// existence.
    pub fn get_state_directive(&self, state: CacheState, directive: &str) -> DirectiveValue {
        self.table(state)
            .get(&directive.to_lowercase())
            .cloned()
            .unwrap_or(DirectiveValue::Flag(false))
    }

    // === Convenience setters (all states except Disabled) ===

    /// Set or clear `no-store`. Setting it also drops `max-age` and
    /// `s-maxage`, which are meaningless for a response that is never stored.
    pub fn set_no_store(&mut self, flag: bool) -> CachePolicyResult<&mut Self> {
        self.set_state_directive(CacheState::CACHEABLE, "no-store", flag)?;

        if flag {
            for state in CacheState::CACHEABLE {
                let table = &mut self.tables[state.index()];
                table.remove("max-age");
                table.remove("s-maxage");
            }
        }

        Ok(self)
    }

    /// Set or clear `no-cache`.
    pub fn set_no_cache(&mut self, flag: bool) -> CachePolicyResult<&mut Self> {
        self.set_state_directive(CacheState::CACHEABLE, "no-cache", flag)
    }

    /// Set `max-age` in seconds.
    pub fn set_max_age(&mut self, seconds: u32) -> CachePolicyResult<&mut Self> {
        self.set_state_directive(CacheState::CACHEABLE, "max-age", seconds)
    }

    /// Set `s-maxage` (shared cache lifetime) in seconds.
    pub fn set_shared_max_age(&mut self, seconds: u32) -> CachePolicyResult<&mut Self> {
        self.set_state_directive(CacheState::CACHEABLE, "s-maxage", seconds)
    }

    /// Set or clear `must-revalidate`.
    pub fn set_must_revalidate(&mut self, flag: bool) -> CachePolicyResult<&mut Self> {
        self.set_state_directive(CacheState::CACHEABLE, "must-revalidate", flag)
    }
}

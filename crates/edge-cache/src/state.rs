//! Caching states and their priority levels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CachePolicyError;

/// Priority levels used to arbitrate between competing policy requests.
pub mod priority {
    /// Level requested by `enable_cache`.
    pub const ENABLED: u8 = 0;
    /// Level requested by `public_cache`.
    pub const PUBLIC: u8 = 1;
    /// Level requested by `private_cache`.
    pub const PRIVATE: u8 = 2;
    /// Level requested by `disable_cache`.
    pub const DISABLED: u8 = 3;
    /// Modifier added when the caller forces a change.
    pub const FORCED: u8 = 10;
}

/// Mutually exclusive caching policy for a response.
///
/// Variants are declared from weakest to strongest, so `Ord` follows
/// precedence: `Disabled > Private > Public > Enabled`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheState {
    /// Caching allowed, freshness left to the cache.
    #[default]
    Enabled,
    /// Cacheable by shared caches (CDN, proxy) and browsers.
    Public,
    /// Cacheable by the end user's browser only.
    Private,
    /// Not cacheable at all.
    Disabled,
}

impl CacheState {
    /// Number of states.
    pub const COUNT: usize = 4;

    /// All states, weakest first.
    pub const ALL: [CacheState; Self::COUNT] = [Self::Enabled, Self::Public, Self::Private, Self::Disabled];

    /// States that carry freshness directives (everything except `Disabled`).
    pub const CACHEABLE: [CacheState; 3] = [Self::Enabled, Self::Private, Self::Public];

    /// Priority level requested when moving to this state.
    pub fn priority(&self) -> u8 {
        match self {
            Self::Enabled => priority::ENABLED,
            Self::Public => priority::PUBLIC,
            Self::Private => priority::PRIVATE,
            Self::Disabled => priority::DISABLED,
        }
    }

    /// Lowercase label used in configuration.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Public => "public",
            Self::Private => "private",
            Self::Disabled => "disabled",
        }
    }

    /// Directives seeded for this state, in emission order.
    pub fn default_directives(&self) -> &'static [&'static str] {
        match self {
            Self::Disabled => &["no-cache", "no-store", "must-revalidate"],
            Self::Private => &["private", "must-revalidate"],
            Self::Public => &["public", "must-revalidate"],
            Self::Enabled => &["must-revalidate"],
        }
    }

    pub(crate) fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CacheState {
    type Err = CachePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|state| state.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CachePolicyError::InvalidState(s.to_string()))
    }
}

/// One or more target states for a directive write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateSet(Vec<CacheState>);

impl StateSet {
    /// Parse a set of state labels, failing on the first unknown one.
    pub fn parse<S: AsRef<str>>(labels: &[S]) -> Result<Self, CachePolicyError> {
        labels
            .iter()
            .map(|label| label.as_ref().parse())
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Iterate the target states.
    pub fn iter(&self) -> impl Iterator<Item = CacheState> + '_ {
        self.0.iter().copied()
    }
}

impl From<CacheState> for StateSet {
    fn from(state: CacheState) -> Self {
        Self(vec![state])
    }
}

impl From<&[CacheState]> for StateSet {
    fn from(states: &[CacheState]) -> Self {
        Self(states.to_vec())
    }
}

impl<const N: usize> From<[CacheState; N]> for StateSet {
    fn from(states: [CacheState; N]) -> Self {
        Self(states.to_vec())
    }
}

impl From<Vec<CacheState>> for StateSet {
    fn from(states: Vec<CacheState>) -> Self {
        Self(states)
    }
}

//! Cache-Control policy resolution for the edge platform.
//!
//! This crate provides:
//! - `CachePolicyResolver` - Priority-arbitrated caching state with per-state directives
//! - `CachePolicyFactory` - Validated config turned into per-request resolvers
//! - `CacheControlConfig` - Directive allow-list and state overrides
//! - `SharedCachePolicy` - Mutex-guarded resolver for shared pipelines
//! - `CachePolicyLayer` - Middleware that applies the resolved headers
//!
//! # Example
//!
//! ```
//! use edge_cache::{CachePolicyResolver, CacheState};
//!
//! let mut resolver = CachePolicyResolver::new();
//! resolver.private_cache(false).set_max_age(3600).unwrap();
//!
//! // A weaker request later in the pipeline loses.
//! resolver.public_cache(false);
//!
//! assert_eq!(resolver.current_state(), CacheState::Private);
//! assert_eq!(resolver.generate_cache_header_value(), "private, must-revalidate, max-age=3600");
//! ```

mod config;
mod directive;
mod error;
mod factory;
mod headers;
mod middleware;
mod policy;
mod shared;
mod state;

pub use config::*;
pub use directive::*;
pub use error::*;
pub use factory::*;
pub use headers::*;
pub use middleware::*;
pub use policy::*;
pub use shared::*;
pub use state::*;

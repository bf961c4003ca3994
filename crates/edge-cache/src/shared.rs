//! Lock-protected resolver for hosts that share one across threads.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::policy::CachePolicyResolver;

/// A [`CachePolicyResolver`] behind a mutex.
///
/// Prefer a fresh resolver per request from
/// [`CachePolicyFactory`](crate::CachePolicyFactory). Use this only when the
/// host pipeline hands the same instance to concurrent handlers; every
/// policy decision is then serialized.
#[derive(Debug, Clone, Default)]
pub struct SharedCachePolicy {
    inner: Arc<Mutex<CachePolicyResolver>>,
}

impl SharedCachePolicy {
    /// Wrap a resolver.
    pub fn new(resolver: CachePolicyResolver) -> Self {
        Self {
            inner: Arc::new(Mutex::new(resolver)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CachePolicyResolver> {
        // Resolver state stays consistent between calls even if a holder panicked.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Run `f` with exclusive access to the resolver.
    pub fn with<T>(&self, f: impl FnOnce(&mut CachePolicyResolver) -> T) -> T {
        f(&mut self.lock())
    }

    /// Reset the shared resolver to its initial state.
    pub fn reset(&self) {
        self.lock().reset();
    }

    /// Current Cache-Control value.
    pub fn header_value(&self) -> String {
        self.lock().generate_cache_header_value()
    }

    /// Copy of the current resolver state.
    pub fn snapshot(&self) -> CachePolicyResolver {
        self.lock().clone()
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::state::CacheState;

    #[test]
    fn test_with_mutates_shared_state() {
        let shared = SharedCachePolicy::default();
        let clone = shared.clone();

        clone.with(|r| {
            r.private_cache(false);
        });

        assert_eq!(shared.snapshot().current_state(), CacheState::Private);
        assert_eq!(shared.header_value(), "private, must-revalidate");
    }

    #[test]
    fn test_reset_clears_between_requests() {
        let shared = SharedCachePolicy::default();
        shared.with(|r| {
            r.disable_cache(true);
        });

        shared.reset();

        let snapshot = shared.snapshot();
        assert_eq!(snapshot.current_state(), CacheState::Enabled);
        assert_eq!(snapshot.forcing_level(), 0);
    }

    #[test]
    fn test_concurrent_requests_keep_highest_level() {
        let shared = SharedCachePolicy::default();

        let handles: Vec<_> = (0..8u8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    shared.with(|r| r.request_state(i % 4, i == 5));
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(shared.snapshot().forcing_level(), 11);
    }

    #[test]
    fn test_lock_recovers_from_poison() {
        let shared = SharedCachePolicy::default();
        let clone = shared.clone();

        let _ = thread::spawn(move || {
            clone.with(|r| {
                r.disable_cache(false);
                panic!("handler crashed");
            })
        })
        .join();

        assert_eq!(shared.snapshot().current_state(), CacheState::Disabled);
    }
}

//! In-memory read caches and the registry that invalidates them.
//!
//! Caches are invalidated by reference: `invalidate()` marks the cached value
//! stale and bumps its generation; the owner decides when to refetch.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use tellmemo_core::ProjectId;

/// Identity of a downstream read cache.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    ProjectList,
    MeetingList,
    ProjectSummaries(ProjectId),
    ProjectBlockers(ProjectId),
}

impl core::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            CacheKey::ProjectList => f.write_str("projects"),
            CacheKey::MeetingList => f.write_str("meetings"),
            CacheKey::ProjectSummaries(p) => write!(f, "projects/{p}/summaries"),
            CacheKey::ProjectBlockers(p) => write!(f, "projects/{p}/blockers"),
        }
    }
}

/// Anything that can be marked stale.
pub trait Invalidate: Send + Sync {
    fn invalidate(&self);
}

#[derive(Debug)]
struct CacheState<T> {
    value: Option<T>,
    stale: bool,
    generation: u64,
    cached_at: Option<DateTime<Utc>>,
}

/// A single cached value with staleness tracking.
#[derive(Debug)]
pub struct ReadCache<T> {
    state: Mutex<CacheState<T>>,
}

impl<T: Clone> ReadCache<T> {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(CacheState { value: None, stale: true, generation: 0, cached_at: None }),
        }
    }

    /// Store a freshly fetched value.
    pub fn put(&self, value: T) {
        let mut state = self.lock();
        state.value = Some(value);
        state.stale = false;
        state.cached_at = Some(Utc::now());
    }

    /// Last stored value, stale or not.
    pub fn get(&self) -> Option<T> {
        self.lock().value.clone()
    }

    /// Value only if it is not stale and not older than `max_age`.
    pub fn get_fresh(&self, max_age: Option<chrono::Duration>) -> Option<T> {
        let state = self.lock();
        if state.stale {
            return None;
        }
        if let (Some(max), Some(cached_at)) = (max_age, state.cached_at) {
            if Utc::now().signed_duration_since(cached_at) > max {
                return None;
            }
        }
        state.value.clone()
    }

    pub fn is_stale(&self) -> bool {
        self.lock().stale
    }

    /// Number of invalidations seen so far.
    pub fn generation(&self) -> u64 {
        self.lock().generation
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Default for ReadCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send> Invalidate for ReadCache<T> {
    fn invalidate(&self) {
        let mut state = self.lock();
        state.stale = true;
        state.generation += 1;
    }
}

#[derive(Default)]
struct RegistryState {
    caches: HashMap<CacheKey, Vec<Arc<dyn Invalidate>>>,
    invalidations: HashMap<CacheKey, u64>,
}

/// Caches registered by key.
///
/// Invalidating a key nobody registered is still counted, so consumers that
/// show up later can tell their data may already be out of date.
#[derive(Default)]
pub struct CacheRegistry {
    state: Mutex<RegistryState>,
}

impl CacheRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, key: CacheKey, cache: Arc<dyn Invalidate>) {
        tracing::debug!(cache = %key, "registering read cache");
        self.lock().caches.entry(key).or_default().push(cache);
    }

    /// Drop every cache registered under `key`.
    pub fn unregister(&self, key: &CacheKey) {
        self.lock().caches.remove(key);
    }

    /// Mark every cache under `key` stale. Returns how many were notified.
    pub fn invalidate(&self, key: &CacheKey) -> usize {
        // Collect first so cache callbacks never run under the registry lock.
        let targets: Vec<Arc<dyn Invalidate>> = {
            let mut state = self.lock();
            *state.invalidations.entry(key.clone()).or_insert(0) += 1;
            state.caches.get(key).cloned().unwrap_or_default()
        };

        for cache in &targets {
            cache.invalidate();
        }
        tracing::debug!(cache = %key, notified = targets.len(), "cache invalidated");
        targets.len()
    }

    pub fn invalidation_count(&self, key: &CacheKey) -> u64 {
        self.lock().invalidations.get(key).copied().unwrap_or(0)
    }

    fn lock(&self) -> MutexGuard<'_, RegistryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl core::fmt::Debug for CacheRegistry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.lock();
        f.debug_struct("CacheRegistry")
            .field("keys", &state.caches.keys().collect::<Vec<_>>())
            .field("invalidations", &state.invalidations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_invalidate_marks_stale() {
        let cache: ReadCache<Vec<String>> = ReadCache::new();
        assert!(cache.is_stale());

        cache.put(vec!["p1".into()]);
        assert!(!cache.is_stale());
        assert_eq!(cache.get_fresh(None), Some(vec!["p1".to_string()]));

        cache.invalidate();
        assert!(cache.is_stale());
        assert_eq!(cache.generation(), 1);
        assert_eq!(cache.get_fresh(None), None);
        // The stale value is still readable for display while refetching.
        assert_eq!(cache.get(), Some(vec!["p1".to_string()]));
    }

    #[test]
    fn max_age_expires_fresh_values() {
        let cache = ReadCache::new();
        cache.put(1u32);
        assert_eq!(cache.get_fresh(Some(chrono::Duration::hours(1))), Some(1));
        assert_eq!(cache.get_fresh(Some(chrono::Duration::milliseconds(-1))), None);
    }

    #[test]
    fn registry_invalidates_every_cache_under_a_key() {
        let registry = CacheRegistry::new();
        let a = Arc::new(ReadCache::<u32>::new());
        let b = Arc::new(ReadCache::<u32>::new());
        a.put(1);
        b.put(2);
        registry.register(CacheKey::ProjectList, a.clone());
        registry.register(CacheKey::ProjectList, b.clone());

        assert_eq!(registry.invalidate(&CacheKey::ProjectList), 2);
        assert!(a.is_stale() && b.is_stale());
        assert_eq!(registry.invalidation_count(&CacheKey::ProjectList), 1);
    }

    #[test]
    fn unregistered_keys_are_still_counted() {
        let registry = CacheRegistry::new();
        let key = CacheKey::ProjectSummaries(ProjectId::from("p1"));
        assert_eq!(registry.invalidate(&key), 0);
        assert_eq!(registry.invalidation_count(&key), 1);
        assert_eq!(key.to_string(), "projects/p1/summaries");
    }
}

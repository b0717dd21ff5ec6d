//! Service-owned registry of session bindings.
//!
//! Backed by `DashMap` so get-or-create is atomic per key: the factory for a
//! key runs under that key's shard lock, at most once, and every concurrent
//! caller receives the same `Arc`.

use std::sync::Arc;

use dashmap::DashMap;

use parley_types::chat::SessionKey;

use super::binding::SessionBinding;
use crate::transcript::store::TranscriptStore;

/// Map from session key to its live binding.
///
/// Grows with the number of distinct sessions seen by the process; entries
/// are only removed by [`SessionRegistry::evict`].
pub struct SessionRegistry<S: TranscriptStore> {
    bindings: DashMap<SessionKey, Arc<SessionBinding<S>>>,
}

impl<S: TranscriptStore> SessionRegistry<S> {
    pub fn new() -> Self {
        Self {
            bindings: DashMap::new(),
        }
    }

    /// Return the binding for `key`, building it with `factory` if absent.
    ///
    /// `factory` runs while the key's shard is locked, so it must not call
    /// back into the registry.
    pub fn get_or_create<F>(&self, key: &SessionKey, factory: F) -> Arc<SessionBinding<S>>
    where
        F: FnOnce() -> SessionBinding<S>,
    {
        if let Some(existing) = self.bindings.get(key) {
            return Arc::clone(existing.value());
        }

        let entry = self
            .bindings
            .entry(key.clone())
            .or_insert_with(|| {
                tracing::debug!(session = %key, "creating session binding");
                Arc::new(factory())
            });
        Arc::clone(entry.value())
    }

    pub fn get(&self, key: &SessionKey) -> Option<Arc<SessionBinding<S>>> {
        self.bindings.get(key).map(|b| Arc::clone(b.value()))
    }

    /// Remove the binding for `key`. Idempotent.
    ///
    /// Turns already holding the evicted binding finish against it; the next
    /// lookup builds a fresh one.
    pub fn evict(&self, key: &SessionKey) -> Option<Arc<SessionBinding<S>>> {
        let removed = self.bindings.remove(key).map(|(_, binding)| binding);
        if removed.is_some() {
            tracing::debug!(session = %key, "evicted session binding");
        }
        removed
    }

    /// Remove the binding for `key` only if it is still `binding`.
    ///
    /// Returns false when the key is absent or already rebound, leaving a
    /// newer binding (and any turn holding its slot) untouched.
    pub fn evict_current(&self, key: &SessionKey, binding: &Arc<SessionBinding<S>>) -> bool {
        let removed = self
            .bindings
            .remove_if(key, |_, current| Arc::ptr_eq(current, binding))
            .is_some();
        if removed {
            tracing::debug!(session = %key, "evicted session binding");
        }
        removed
    }

    pub fn contains(&self, key: &SessionKey) -> bool {
        self.bindings.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl<S: TranscriptStore> Default for SessionRegistry<S> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::prompt::PromptTemplate;
    use crate::llm::provider::{FragmentStream, LlmProvider};
    use crate::transcript::memory::MemoryTranscriptStore;
    use parley_types::llm::GenerationRequest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct SilentProvider;

    impl LlmProvider for SilentProvider {
        fn name(&self) -> &str {
            "silent"
        }

        fn stream(&self, _request: GenerationRequest) -> FragmentStream {
            Box::pin(futures_util::stream::empty())
        }
    }

    fn make(key: &SessionKey, store: &Arc<MemoryTranscriptStore>) -> SessionBinding<MemoryTranscriptStore> {
        SessionBinding::new(
            key.clone(),
            PromptTemplate::default(),
            Arc::new(SilentProvider),
            Arc::clone(store),
        )
    }

    #[test]
    fn test_get_or_create_reuses_binding() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let registry = SessionRegistry::new();
        let key = SessionKey::new("alice", "s-1");

        let first = registry.get_or_create(&key, || make(&key, &store));
        let second = registry.get_or_create(&key, || panic!("factory must not run twice"));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_evict_is_idempotent_and_forces_rebuild() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let registry = SessionRegistry::new();
        let key = SessionKey::new("alice", "s-1");

        let first = registry.get_or_create(&key, || make(&key, &store));
        assert!(registry.evict(&key).is_some());
        assert!(registry.evict(&key).is_none());
        assert!(!registry.contains(&key));

        let rebuilt = registry.get_or_create(&key, || make(&key, &store));
        assert!(!Arc::ptr_eq(&first, &rebuilt));
    }

    #[test]
    fn test_evict_current_leaves_newer_binding() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let registry = SessionRegistry::new();
        let key = SessionKey::new("alice", "s-1");

        let stale = registry.get_or_create(&key, || make(&key, &store));
        registry.evict(&key);
        let fresh = registry.get_or_create(&key, || make(&key, &store));

        assert!(!registry.evict_current(&key, &stale));
        assert!(Arc::ptr_eq(&registry.get(&key).unwrap(), &fresh));

        assert!(registry.evict_current(&key, &fresh));
        assert!(!registry.contains(&key));
        assert!(!registry.evict_current(&key, &fresh));
    }

    #[test]
    fn test_keys_are_scoped_by_user() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let registry = SessionRegistry::new();
        let a = SessionKey::new("alice", "shared");
        let b = SessionKey::new("bob", "shared");

        let ba = registry.get_or_create(&a, || make(&a, &store));
        let bb = registry.get_or_create(&b, || make(&b, &store));

        assert!(!Arc::ptr_eq(&ba, &bb));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_get_or_create_runs_factory_once() {
        let store = Arc::new(MemoryTranscriptStore::new());
        let registry = Arc::new(SessionRegistry::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let key = SessionKey::new("alice", "hot");

        let mut handles = Vec::new();
        for _ in 0..32 {
            let registry = Arc::clone(&registry);
            let store = Arc::clone(&store);
            let calls = Arc::clone(&calls);
            let key = key.clone();
            handles.push(tokio::spawn(async move {
                registry.get_or_create(&key, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    make(&key, &store)
                })
            }));
        }

        let mut bindings = Vec::new();
        for handle in handles {
            bindings.push(handle.await.unwrap());
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(bindings.iter().all(|b| Arc::ptr_eq(b, &bindings[0])));
    }
}

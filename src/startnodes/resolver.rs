//! Cache-first start node resolution

use crate::error::LookupError;
use crate::hierarchy::StartNodeCollection;
use crate::startnodes::cache::KeyedCache;
use crate::startnodes::store::AssignmentStore;
use std::sync::Arc;
use tracing::debug;

/// Resolves a user's start node collection, caching by user id.
///
/// Concurrent lookups for the same user may both hit the store; the second
/// write simply replaces the first with an equal value. Note that admin
/// bypass is deliberately NOT handled here: every filtering call site checks
/// the user's admin flag itself before consulting the resolver, so an admin
/// request never pays for a cache entry it will not use.
pub struct StartNodeResolver {
    store: Arc<dyn AssignmentStore>,
    cache: KeyedCache<i64, StartNodeCollection>,
}

impl StartNodeResolver {
    pub fn new(store: Arc<dyn AssignmentStore>) -> Self {
        Self {
            store,
            cache: KeyedCache::new(),
        }
    }

    /// Cache-first lookup of the user's start node collection
    pub async fn start_nodes(&self, user_id: i64) -> Result<Arc<StartNodeCollection>, LookupError> {
        if let Some(cached) = self.cache.get(&user_id).await {
            return Ok(cached);
        }

        debug!(user_id, "start node cache miss, fetching from store");
        let fresh = Arc::new(self.store.start_nodes_by_user(user_id).await?);
        self.cache.insert(user_id, fresh.clone()).await;
        Ok(fresh)
    }

    /// Drop the cached entry for a user so the next request refetches.
    /// Called when the underlying assignment changes.
    pub async fn invalidate(&self, user_id: i64) {
        debug!(user_id, "invalidating cached start nodes");
        self.cache.invalidate(&user_id).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::{StartNodeCollection, StartNodeSet};
    use crate::startnodes::store::MemoryAssignmentStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Store wrapper that counts lookups
    struct CountingStore {
        inner: MemoryAssignmentStore,
        fetches: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl AssignmentStore for CountingStore {
        async fn start_nodes_by_user(
            &self,
            user_id: i64,
        ) -> Result<StartNodeCollection, LookupError> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            self.inner.start_nodes_by_user(user_id).await
        }
    }

    async fn counting_store() -> Arc<CountingStore> {
        let inner = MemoryAssignmentStore::new();
        inner
            .set(
                7,
                StartNodeCollection::new(StartNodeSet::from_ids([5]), StartNodeSet::unset()),
            )
            .await;
        Arc::new(CountingStore {
            inner,
            fetches: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_second_lookup_is_served_from_cache() {
        let store = counting_store().await;
        let resolver = StartNodeResolver::new(store.clone());

        let first = resolver.start_nodes(7).await.unwrap();
        let second = resolver.start_nodes(7).await.unwrap();

        assert!(first.content.contains(5));
        assert_eq!(first, second);
        assert_eq!(store.fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_forces_refetch() {
        let store = counting_store().await;
        let resolver = StartNodeResolver::new(store.clone());

        resolver.start_nodes(7).await.unwrap();
        resolver.invalidate(7).await;
        resolver.start_nodes(7).await.unwrap();

        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_distinct_users_get_distinct_entries() {
        let store = counting_store().await;
        let resolver = StartNodeResolver::new(store.clone());

        let assigned = resolver.start_nodes(7).await.unwrap();
        let unassigned = resolver.start_nodes(8).await.unwrap();

        assert!(assigned.content.contains(5));
        assert!(unassigned.content.is_unset());
        assert_eq!(store.fetches.load(Ordering::SeqCst), 2);
    }
}

//! Cascade invalidation
//!
//! When a resource's content hash changes, its node and cache entries are
//! removed, and the removal cascades along reverse edges to every
//! transitive dependent. This is what keeps stale transclusions and stale
//! AI-synthesized summaries from surviving an upstream edit.

use crate::graph::DocumentGraph;
use darkmatter_types::ResourceHash;
use std::collections::HashSet;
use std::sync::Arc;

/// Receiver for cache evictions during a cascade.
///
/// The cache crate implements this for its manager; the no-op `()` impl
/// serves drivers that run without a cache.
pub trait CacheSink: Send + Sync {
    fn evict(&self, resource_hash: ResourceHash);
}

impl CacheSink for () {
    fn evict(&self, _resource_hash: ResourceHash) {}
}

/// Cascades invalidation across the graph and into the cache
pub struct InvalidationEngine {
    sink: Arc<dyn CacheSink>,
}

impl InvalidationEngine {
    pub fn new(sink: Arc<dyn CacheSink>) -> Self {
        InvalidationEngine { sink }
    }

    /// Engine with no cache attached
    pub fn detached() -> Self {
        InvalidationEngine { sink: Arc::new(()) }
    }

    /// Remove the node for `start`, every transitive dependent, and their
    /// cache entries. Returns every hash actually invalidated, starting
    /// with `start`, in traversal order.
    ///
    /// `start` is evicted from the cache even when the graph no longer
    /// holds a node for it, so a file-watcher can invalidate a path the
    /// last build never reached.
    pub fn invalidate_cascade(
        &self,
        graph: &mut DocumentGraph,
        start: ResourceHash,
    ) -> Vec<ResourceHash> {
        let mut affected = vec![start];
        let mut seen: HashSet<ResourceHash> = affected.iter().copied().collect();
        let mut queue = vec![start];

        while let Some(current) = queue.pop() {
            for &dependent in graph.dependents(current) {
                if seen.insert(dependent) {
                    affected.push(dependent);
                    queue.push(dependent);
                }
            }
        }

        for &hash in &affected {
            graph.remove_node(hash);
            self.sink.evict(hash);
        }

        tracing::info!(
            invalidated = affected.len(),
            "cascade invalidation from {}",
            start
        );
        affected
    }
}

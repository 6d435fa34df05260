//! Build pipeline
//!
//! Composes the builder, store, planner, and invalidation engine into the
//! surface a rendering driver consumes: build a graph, persist it, derive
//! the layered work plan, and reconcile a previously persisted graph
//! against what is currently on disk or on the network.
//!
//! Store failures never fail a build; the pipeline degrades to working
//! in-memory and surfaces a warning diagnostic instead.

use crate::builder::{BuildOutcome, GraphBuilder};
use crate::error::GraphError;
use crate::graph::DocumentGraph;
use crate::hash::content_hash;
use crate::invalidate::{CacheSink, InvalidationEngine};
use crate::plan::{plan, WorkPlan};
use crate::resolver::Resolver;
use crate::store::GraphStore;
use chrono::Utc;
use darkmatter_types::{Diagnostic, Resource, ResourceHash};
use std::collections::HashSet;
use std::sync::Arc;

/// A built graph together with its execution plan
#[derive(Debug)]
pub struct PipelineOutcome {
    pub graph: DocumentGraph,
    pub plan: WorkPlan,
    pub diagnostics: Vec<Diagnostic>,
}

/// The composed build driver
pub struct Pipeline<R: Resolver> {
    resolver: R,
    store: Option<GraphStore>,
    sink: Arc<dyn CacheSink>,
}

impl<R: Resolver> Pipeline<R> {
    pub fn new(resolver: R) -> Self {
        Pipeline {
            resolver,
            store: None,
            sink: Arc::new(()),
        }
    }

    /// Attach a persistent graph store
    pub fn with_store(mut self, store: GraphStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Attach the cache so cascade invalidation evicts entries
    pub fn with_cache(mut self, sink: Arc<dyn CacheSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Build the graph for `root` and persist it if a store is attached.
    ///
    /// A store failure downgrades to a `store.unavailable` diagnostic.
    pub fn build(&self, root: &Resource) -> Result<BuildOutcome, GraphError> {
        let mut outcome = GraphBuilder::new(&self.resolver).build(root)?;

        if let Some(store) = &self.store {
            if let Err(err) = store.persist(&outcome.graph) {
                tracing::warn!("could not persist graph snapshot: {}", err);
                outcome.diagnostics.push(
                    Diagnostic::warning(
                        "store.unavailable",
                        format!("graph snapshot not persisted: {err}"),
                    )
                    .with_resource(root.clone()),
                );
            }
        }

        Ok(outcome)
    }

    /// Build, persist, and plan in one step
    pub fn build_and_plan(&self, root: &Resource) -> Result<PipelineOutcome, GraphError> {
        let outcome = self.build(root)?;
        let plan = plan(&outcome.graph)?;
        Ok(PipelineOutcome {
            graph: outcome.graph,
            plan,
            diagnostics: outcome.diagnostics,
        })
    }

    /// Prefer the persisted graph, falling back to a full rebuild.
    ///
    /// A loaded graph is only trusted after revalidation confirms every
    /// node's content hash; any drift triggers a rebuild so the returned
    /// graph always reflects current content.
    pub fn load_or_build(&self, root: &Resource) -> Result<BuildOutcome, GraphError> {
        if let Some(store) = &self.store {
            match store.load(root) {
                Ok(Some(mut graph)) => {
                    let changed = self.revalidate(&mut graph);
                    if changed.is_empty() {
                        tracing::debug!("persisted graph for {} is still current", root);
                        return Ok(BuildOutcome {
                            graph,
                            diagnostics: Vec::new(),
                        });
                    }
                    tracing::info!(
                        changed = changed.len(),
                        "persisted graph for {} is stale, rebuilding",
                        root
                    );
                }
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!("could not load graph snapshot: {}", err);
                }
            }
        }

        self.build(root)
    }

    /// Eager revalidation sweep.
    ///
    /// Re-resolves every node, recomputes content hashes, and cascades
    /// invalidation for each mismatch (a vanished resource counts as
    /// changed). Returns the union of affected hashes. Unchanged nodes
    /// get their `last_validated` bumped. The per-read content-hash gate
    /// in the cache remains in force independently of this sweep.
    pub fn revalidate(&self, graph: &mut DocumentGraph) -> Vec<ResourceHash> {
        let snapshot: Vec<(ResourceHash, Resource, darkmatter_types::ContentHash)> = graph
            .nodes()
            .map(|n| (n.resource_hash, n.resource.clone(), n.content_hash))
            .collect();

        let now = Utc::now();
        let mut changed = Vec::new();
        for (hash, resource, old_hash) in snapshot {
            match self.resolver.resolve(&resource) {
                Ok(resolved) if content_hash(&resolved.bytes) == old_hash => {
                    if let Some(node) = graph.node_mut(hash) {
                        node.last_validated = now;
                    }
                }
                Ok(_) => changed.push(hash),
                Err(err) => {
                    tracing::debug!("{} no longer resolves: {}", resource, err);
                    changed.push(hash);
                }
            }
        }

        let engine = InvalidationEngine::new(self.sink.clone());
        let mut affected = Vec::new();
        let mut seen = HashSet::new();
        for hash in changed {
            for invalidated in engine.invalidate_cascade(graph, hash) {
                if seen.insert(invalidated) {
                    affected.push(invalidated);
                }
            }
        }
        affected
    }

    /// Cascade invalidation for an externally detected edit, e.g. from a
    /// file watcher. Returns every hash the caller must re-render.
    pub fn invalidate_cascade(
        &self,
        graph: &mut DocumentGraph,
        start: ResourceHash,
    ) -> Vec<ResourceHash> {
        InvalidationEngine::new(self.sink.clone()).invalidate_cascade(graph, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::resource_hash_of;
    use crate::resolver::{MemoryResolver, Reference};
    use darkmatter_types::ReferenceType;

    fn fixture() -> (MemoryResolver, Resource, Resource) {
        let resolver = MemoryResolver::new();
        let root = Resource::file("root.md");
        let child = Resource::file("child.md");
        resolver.insert_with_references(
            root.clone(),
            "# Root",
            vec![Reference::required(
                child.clone(),
                ReferenceType::Transclusion,
            )],
        );
        resolver.insert(child.clone(), "# Child");
        (resolver, root, child)
    }

    #[test]
    fn build_and_plan_orders_child_first() {
        let (resolver, root, child) = fixture();
        let outcome = Pipeline::new(resolver).build_and_plan(&root).unwrap();

        assert_eq!(outcome.plan.layer_count(), 2);
        assert_eq!(outcome.plan.layers()[0], vec![resource_hash_of(&child)]);
        assert_eq!(outcome.plan.layers()[1], vec![resource_hash_of(&root)]);
    }

    #[test]
    fn revalidate_unchanged_reports_nothing() {
        let (resolver, root, _) = fixture();
        let pipeline = Pipeline::new(resolver);
        let mut graph = pipeline.build(&root).unwrap().graph;

        assert!(pipeline.revalidate(&mut graph).is_empty());
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn revalidate_detects_edited_child() {
        let (resolver, root, child) = fixture();
        let pipeline = Pipeline::new(resolver);
        let mut graph = pipeline.build(&root).unwrap().graph;

        pipeline.resolver().set_bytes(&child, "# Child, edited");
        let affected = pipeline.revalidate(&mut graph);

        assert!(affected.contains(&resource_hash_of(&child)));
        assert!(affected.contains(&resource_hash_of(&root)));
        assert!(graph.is_empty());
    }

    #[test]
    fn revalidate_treats_vanished_resource_as_changed() {
        let (resolver, root, child) = fixture();
        let pipeline = Pipeline::new(resolver);
        let mut graph = pipeline.build(&root).unwrap().graph;

        pipeline.resolver().remove(&child);
        let affected = pipeline.revalidate(&mut graph);

        assert!(affected.contains(&resource_hash_of(&child)));
    }

    #[test]
    fn store_failure_degrades_to_diagnostic() {
        let (resolver, root, _) = fixture();
        // Point the store somewhere unwritable
        let pipeline =
            Pipeline::new(resolver).with_store(GraphStore::new("/dev/null/graph.json"));

        let outcome = pipeline.build(&root).unwrap();
        assert!(outcome
            .diagnostics
            .iter()
            .any(|d| d.code == "store.unavailable"));
    }

    #[test]
    fn load_or_build_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, root, _) = fixture();
        let pipeline =
            Pipeline::new(resolver).with_store(GraphStore::new(dir.path().join("graph.json")));

        let built = pipeline.build(&root).unwrap();
        assert!(built.diagnostics.is_empty());

        let loaded = pipeline.load_or_build(&root).unwrap();
        // Revalidation bumps last_validated, so compare structure
        assert_eq!(loaded.graph.root(), built.graph.root());
        assert_eq!(loaded.graph.edges(), built.graph.edges());
        for node in built.graph.nodes() {
            let restored = loaded.graph.node(node.resource_hash).unwrap();
            assert_eq!(restored.resource, node.resource);
            assert_eq!(restored.content_hash, node.content_hash);
        }
    }

    #[test]
    fn load_or_build_rebuilds_after_edit() {
        let dir = tempfile::tempdir().unwrap();
        let (resolver, root, child) = fixture();
        let pipeline =
            Pipeline::new(resolver).with_store(GraphStore::new(dir.path().join("graph.json")));

        pipeline.build(&root).unwrap();
        pipeline.resolver().set_bytes(&child, "# Child v2");

        let rebuilt = pipeline.load_or_build(&root).unwrap();
        let child_node = rebuilt.graph.node(resource_hash_of(&child)).unwrap();
        assert_eq!(child_node.content_hash, content_hash(b"# Child v2"));
    }
}

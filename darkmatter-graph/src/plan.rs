//! Work-plan generation
//!
//! Layered topological ordering over the dependency graph. Leaves (nodes
//! with no outstanding dependencies) are peeled first; every node in
//! layer `k` has all of its dependencies resolved in layers `< k`, and
//! nodes within one layer are independent, so a driver may process a
//! layer with unbounded parallelism. Layers are strictly ordered: layer
//! `k + 1` reads content hashes and cache entries produced by layer `k`.

use crate::error::{CycleEdge, GraphError};
use crate::graph::DocumentGraph;
use darkmatter_types::ResourceHash;
use std::collections::HashMap;

/// Ordered layers of independently processable resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkPlan {
    layers: Vec<Vec<ResourceHash>>,
}

impl WorkPlan {
    pub fn layers(&self) -> &[Vec<ResourceHash>] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Total number of resources across all layers
    pub fn resource_count(&self) -> usize {
        self.layers.iter().map(Vec::len).sum()
    }

    /// All resources in execution order, layer boundaries erased
    pub fn flatten(&self) -> Vec<ResourceHash> {
        self.layers.iter().flatten().copied().collect()
    }
}

/// Produce the layered execution order for a graph.
///
/// Fails with the residual edge set if the graph somehow contains a
/// cycle; nodes are never silently dropped.
pub fn plan(graph: &DocumentGraph) -> Result<WorkPlan, GraphError> {
    // Outstanding dependency count per node. A node is ready once every
    // resource it depends on has been peeled.
    let mut outstanding: HashMap<ResourceHash, usize> = graph
        .nodes()
        .map(|node| (node.resource_hash, graph.dependencies(node.resource_hash).len()))
        .collect();

    let mut layers = Vec::new();
    while !outstanding.is_empty() {
        let mut layer: Vec<ResourceHash> = outstanding
            .iter()
            .filter(|(_, count)| **count == 0)
            .map(|(hash, _)| *hash)
            .collect();

        if layer.is_empty() {
            // Zero progress with nodes left: a cycle the builder should
            // have rejected. Fail loudly with the residual edges.
            let residual: Vec<CycleEdge> = graph
                .edges()
                .iter()
                .filter(|e| {
                    outstanding.contains_key(&e.from) && outstanding.contains_key(&e.to)
                })
                .filter_map(|e| {
                    Some(CycleEdge {
                        from: graph.node(e.from)?.resource.clone(),
                        to: graph.node(e.to)?.resource.clone(),
                        reference_type: e.reference_type,
                    })
                })
                .collect();
            return Err(GraphError::Cycle(residual));
        }

        // In-layer order carries no meaning; sort for determinism
        layer.sort();

        for hash in &layer {
            outstanding.remove(hash);
            for &dependent in graph.dependents(*hash) {
                if let Some(count) = outstanding.get_mut(&dependent) {
                    *count = count.saturating_sub(1);
                }
            }
        }
        layers.push(layer);
    }

    Ok(WorkPlan { layers })
}

//! Graph construction
//!
//! Walks a root resource through the resolver, creating one node per
//! unique resource and one edge per reference. Cycle detection uses an
//! explicit on-path marker separate from the visited set, so a node
//! reached twice along independent paths (a diamond) is not mistaken for
//! a cycle.

use crate::error::{CycleEdge, GraphError};
use crate::graph::{DocumentGraph, DocumentNode, Edge};
use crate::hash::{content_hash, resource_hash_of};
use crate::resolver::{Reference, ResolveError, Resolver};
use chrono::Utc;
use darkmatter_types::{Diagnostic, Resource, ResourceHash};
use std::collections::HashSet;

/// A successful build: the graph plus any non-fatal diagnostics
#[derive(Debug)]
pub struct BuildOutcome {
    pub graph: DocumentGraph,
    pub diagnostics: Vec<Diagnostic>,
}

/// Walks resources through a resolver and assembles the dependency graph
pub struct GraphBuilder<'a, R: Resolver> {
    resolver: &'a R,
}

/// One frame of the traversal path, kept for cycle reporting
struct PathFrame {
    resource: Resource,
    hash: ResourceHash,
}

struct Walk {
    graph: DocumentGraph,
    diagnostics: Vec<Diagnostic>,

    /// Fully processed nodes
    visited: HashSet<ResourceHash>,

    /// Nodes on the current traversal path, in order
    path: Vec<PathFrame>,

    /// Membership index for `path`
    on_path: HashSet<ResourceHash>,

    /// Reference kinds along `path`: `path_kinds[i]` is the edge from
    /// `path[i]` to `path[i + 1]`
    path_kinds: Vec<darkmatter_types::ReferenceType>,
}

impl<'a, R: Resolver> GraphBuilder<'a, R> {
    pub fn new(resolver: &'a R) -> Self {
        GraphBuilder { resolver }
    }

    /// Build the dependency graph rooted at `root`.
    ///
    /// Fails atomically on a cycle or a missing required resource; no
    /// partial graph escapes. Missing optional resources are downgraded
    /// to diagnostics and their edges omitted.
    pub fn build(&self, root: &Resource) -> Result<BuildOutcome, GraphError> {
        let root_hash = resource_hash_of(root);
        let mut walk = Walk {
            graph: DocumentGraph::new(root_hash),
            diagnostics: Vec::new(),
            visited: HashSet::new(),
            path: Vec::new(),
            on_path: HashSet::new(),
            path_kinds: Vec::new(),
        };

        let resolved = self
            .resolver
            .resolve(root)
            .map_err(|source| GraphError::RootUnresolved {
                resource: root.clone(),
                source,
            })?;

        self.visit(&mut walk, root, root_hash, resolved.bytes, resolved.references)?;

        tracing::info!(
            nodes = walk.graph.node_count(),
            edges = walk.graph.edge_count(),
            diagnostics = walk.diagnostics.len(),
            "built dependency graph for {}",
            root
        );

        Ok(BuildOutcome {
            graph: walk.graph,
            diagnostics: walk.diagnostics,
        })
    }

    fn visit(
        &self,
        walk: &mut Walk,
        resource: &Resource,
        hash: ResourceHash,
        bytes: Vec<u8>,
        references: Vec<Reference>,
    ) -> Result<(), GraphError> {
        walk.graph.insert_node(DocumentNode {
            resource: resource.clone(),
            resource_hash: hash,
            content_hash: content_hash(&bytes),
            last_validated: Utc::now(),
        });

        walk.path.push(PathFrame {
            resource: resource.clone(),
            hash,
        });
        walk.on_path.insert(hash);

        for reference in references {
            let child_hash = resource_hash_of(&reference.target);

            if walk.on_path.contains(&child_hash) {
                return Err(GraphError::Cycle(cycle_edges(walk, &reference)));
            }

            if walk.visited.contains(&child_hash) {
                // Shared target, already fully processed: just the edge
                walk.graph.add_edge(Edge {
                    from: hash,
                    to: child_hash,
                    reference_type: reference.kind,
                    required: reference.required,
                });
                continue;
            }

            match self.resolver.resolve(&reference.target) {
                Ok(resolved) => {
                    walk.graph.add_edge(Edge {
                        from: hash,
                        to: child_hash,
                        reference_type: reference.kind,
                        required: reference.required,
                    });
                    walk.path_kinds.push(reference.kind);
                    self.visit(
                        walk,
                        &reference.target,
                        child_hash,
                        resolved.bytes,
                        resolved.references,
                    )?;
                    walk.path_kinds.pop();
                }
                Err(source) if reference.required => {
                    return Err(GraphError::MissingRequired {
                        referrer: resource.clone(),
                        reference: reference.target,
                        kind: reference.kind,
                        source,
                    });
                }
                Err(source) => {
                    // Optional references degrade to a warning; the edge
                    // is omitted entirely.
                    walk.diagnostics.push(optional_diagnostic(
                        resource,
                        &reference.target,
                        &source,
                    ));
                    tracing::warn!(
                        "optional resource {} unavailable (referenced from {}): {}",
                        reference.target,
                        resource,
                        source
                    );
                }
            }
        }

        walk.path.pop();
        walk.on_path.remove(&hash);
        walk.visited.insert(hash);
        Ok(())
    }
}

/// Reconstruct the edge list closing a cycle: the path segment from the
/// first occurrence of the repeated node down to the current node, plus
/// the back edge that closed the loop.
fn cycle_edges(walk: &Walk, closing: &Reference) -> Vec<CycleEdge> {
    let repeat_hash = resource_hash_of(&closing.target);
    let start = walk
        .path
        .iter()
        .position(|frame| frame.hash == repeat_hash)
        .unwrap_or(0);

    let mut edges = Vec::new();
    for i in start..walk.path.len() - 1 {
        edges.push(CycleEdge {
            from: walk.path[i].resource.clone(),
            to: walk.path[i + 1].resource.clone(),
            reference_type: walk.path_kinds[i],
        });
    }
    if let Some(last) = walk.path.last() {
        edges.push(CycleEdge {
            from: last.resource.clone(),
            to: closing.target.clone(),
            reference_type: closing.kind,
        });
    }
    edges
}

fn optional_diagnostic(
    referrer: &Resource,
    target: &Resource,
    source: &ResolveError,
) -> Diagnostic {
    Diagnostic::warning(
        "resource.missing_optional",
        format!(
            "optional resource {} unavailable (referenced from {}): {}",
            target, referrer, source
        ),
    )
    .with_resource(target.clone())
}

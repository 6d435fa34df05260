//! Document dependency graph
//!
//! One node per unique resource, keyed by resource hash, with directed
//! `depends_on` edges tagged by reference kind. Nodes live in an arena
//! keyed by their stable hash and edges are plain hash pairs, so graph
//! mutation across builds never runs into ownership cycles.

use chrono::{DateTime, Utc};
use darkmatter_types::{ContentHash, ReferenceType, Resource, ResourceHash};
use std::collections::{HashMap, HashSet, VecDeque};

/// One graph vertex per unique resource encountered during a build
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentNode {
    /// The resource this node stands for
    pub resource: Resource,

    /// Fingerprint of the resource's location; unique per node
    pub resource_hash: ResourceHash,

    /// Fingerprint of the resolved bytes at last validation
    pub content_hash: ContentHash,

    /// When this node was last successfully resolved
    pub last_validated: DateTime<Utc>,
}

/// Directed dependency: the `from` document depends on the `to` resource
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    pub from: ResourceHash,
    pub to: ResourceHash,
    pub reference_type: ReferenceType,
    pub required: bool,
}

/// The dependency graph for one root document.
///
/// Invariant: the edge set is acyclic. The builder refuses to construct a
/// cyclic graph, and the planner re-checks before producing layers.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentGraph {
    root: ResourceHash,
    nodes: HashMap<ResourceHash, DocumentNode>,
    edges: Vec<Edge>,

    /// Dependencies of each node (outgoing `depends_on` edges)
    outgoing: HashMap<ResourceHash, Vec<ResourceHash>>,

    /// Dependents of each node (reverse edges)
    incoming: HashMap<ResourceHash, Vec<ResourceHash>>,
}

impl DocumentGraph {
    pub fn new(root: ResourceHash) -> Self {
        DocumentGraph {
            root,
            nodes: HashMap::new(),
            edges: Vec::new(),
            outgoing: HashMap::new(),
            incoming: HashMap::new(),
        }
    }

    pub fn root(&self) -> ResourceHash {
        self.root
    }

    /// Insert or replace a node, deduplicated by resource hash
    pub fn insert_node(&mut self, node: DocumentNode) {
        self.nodes.insert(node.resource_hash, node);
    }

    pub fn node(&self, hash: ResourceHash) -> Option<&DocumentNode> {
        self.nodes.get(&hash)
    }

    pub fn node_mut(&mut self, hash: ResourceHash) -> Option<&mut DocumentNode> {
        self.nodes.get_mut(&hash)
    }

    pub fn contains(&self, hash: ResourceHash) -> bool {
        self.nodes.contains_key(&hash)
    }

    /// Add a dependency edge. Identical edges are deduplicated so a
    /// document transcluding the same target twice yields one edge.
    pub fn add_edge(&mut self, edge: Edge) {
        if self.edges.iter().any(|e| e == &edge) {
            return;
        }
        self.outgoing.entry(edge.from).or_default().push(edge.to);
        self.incoming.entry(edge.to).or_default().push(edge.from);
        self.edges.push(edge);
    }

    /// Resources this node depends on
    pub fn dependencies(&self, hash: ResourceHash) -> &[ResourceHash] {
        self.outgoing.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Resources that depend on this node
    pub fn dependents(&self, hash: ResourceHash) -> &[ResourceHash] {
        self.incoming.get(&hash).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn nodes(&self) -> impl Iterator<Item = &DocumentNode> {
        self.nodes.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remove a node and every edge touching it. Returns the node if it
    /// was present.
    pub fn remove_node(&mut self, hash: ResourceHash) -> Option<DocumentNode> {
        let node = self.nodes.remove(&hash)?;
        self.edges.retain(|e| e.from != hash && e.to != hash);
        self.rebuild_adjacency();
        Some(node)
    }

    /// Hashes transitively reachable from the root via dependency edges,
    /// including the root itself
    pub fn reachable_from_root(&self) -> HashSet<ResourceHash> {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::new();
        if self.nodes.contains_key(&self.root) {
            seen.insert(self.root);
            queue.push_back(self.root);
        }
        while let Some(current) = queue.pop_front() {
            for &dep in self.dependencies(current) {
                if seen.insert(dep) {
                    queue.push_back(dep);
                }
            }
        }
        seen
    }

    /// Drop nodes and edges not reachable from the root
    pub fn retain_reachable(&mut self) {
        let reachable = self.reachable_from_root();
        self.nodes.retain(|hash, _| reachable.contains(hash));
        self.edges
            .retain(|e| reachable.contains(&e.from) && reachable.contains(&e.to));
        self.rebuild_adjacency();
    }

    /// Recompute adjacency maps from the edge list. Called after edge
    /// removal.
    fn rebuild_adjacency(&mut self) {
        self.outgoing.clear();
        self.incoming.clear();
        for edge in &self.edges {
            self.outgoing.entry(edge.from).or_default().push(edge.to);
            self.incoming.entry(edge.to).or_default().push(edge.from);
        }
    }
}

//! Persistent graph store
//!
//! Writes the graph as a versioned JSON snapshot so a later process can
//! reload it without re-walking every resolver call. The snapshot carries
//! the `document` / `depends_on` schema with hashes as hex strings.
//! Persistence is atomic (temp file + rename), so readers never observe a
//! half-written graph. Freshness is not verified here; the store only
//! guarantees structural round-trip fidelity.

use crate::error::StoreError;
use crate::graph::{DocumentGraph, DocumentNode, Edge};
use crate::hash::resource_hash_of;
use chrono::{DateTime, Utc};
use darkmatter_types::{ContentHash, ReferenceType, Resource, ResourceHash};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const STORE_VERSION: &str = "1";

#[derive(Serialize, Deserialize)]
struct GraphSnapshot {
    version: String,
    generated_at: String,
    root: String,
    documents: Vec<DocumentRecord>,
    depends_on: Vec<EdgeRecord>,
}

#[derive(Serialize, Deserialize)]
struct DocumentRecord {
    resource_hash: String,
    content_hash: String,
    file_path: Option<String>,
    url: Option<String>,
    last_validated: DateTime<Utc>,
}

#[derive(Serialize, Deserialize)]
struct EdgeRecord {
    #[serde(rename = "in")]
    source: String,
    #[serde(rename = "out")]
    target: String,
    reference_type: ReferenceType,
    required: bool,
}

/// File-backed graph store holding one snapshot per file
#[derive(Debug, Clone)]
pub struct GraphStore {
    path: PathBuf,
}

impl GraphStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GraphStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist every node and edge of the graph.
    ///
    /// The snapshot is written to a sibling temp file and renamed into
    /// place, so a crash mid-write leaves the previous snapshot intact.
    pub fn persist(&self, graph: &DocumentGraph) -> Result<(), StoreError> {
        let mut documents: Vec<DocumentRecord> =
            graph.nodes().map(document_record).collect();
        // Stable output ordering keeps snapshots diffable
        documents.sort_by(|a, b| a.resource_hash.cmp(&b.resource_hash));

        let snapshot = GraphSnapshot {
            version: STORE_VERSION.to_string(),
            generated_at: Utc::now().to_rfc3339(),
            root: hash_string(graph.root()),
            documents,
            depends_on: graph.edges().iter().map(edge_record).collect(),
        };

        let json = serde_json::to_vec(&snapshot)?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, json).map_err(|source| StoreError::Io {
            path: tmp.clone(),
            source,
        })?;
        fs::rename(&tmp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        tracing::debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "persisted graph snapshot to {:?}",
            self.path
        );
        Ok(())
    }

    /// Load the graph for `root`, reconstructing only nodes transitively
    /// reachable from it.
    ///
    /// A missing file, a stale snapshot version, a different root, or a
    /// corrupt snapshot all load as `None` with a warning; builds then
    /// fall back to a full walk.
    pub fn load(&self, root: &Resource) -> Result<Option<DocumentGraph>, StoreError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(StoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let snapshot: GraphSnapshot = match serde_json::from_slice(&data) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                tracing::warn!("failed to parse graph snapshot {:?}: {}", self.path, err);
                return Ok(None);
            }
        };

        if snapshot.version != STORE_VERSION {
            tracing::warn!(
                "graph snapshot {:?} has version {}, expected {}",
                self.path,
                snapshot.version,
                STORE_VERSION
            );
            return Ok(None);
        }

        let root_hash = resource_hash_of(root);
        if snapshot.root != hash_string(root_hash) {
            return Ok(None);
        }

        let mut graph = DocumentGraph::new(root_hash);
        for record in &snapshot.documents {
            match restore_node(record) {
                Some(node) => graph.insert_node(node),
                None => {
                    tracing::warn!(
                        "skipping malformed document record {} in {:?}",
                        record.resource_hash,
                        self.path
                    );
                }
            }
        }
        for record in &snapshot.depends_on {
            let (Some(from), Some(to)) = (parse_hash(&record.source), parse_hash(&record.target))
            else {
                continue;
            };
            if graph.contains(ResourceHash(from)) && graph.contains(ResourceHash(to)) {
                graph.add_edge(Edge {
                    from: ResourceHash(from),
                    to: ResourceHash(to),
                    reference_type: record.reference_type,
                    required: record.required,
                });
            }
        }

        graph.retain_reachable();

        if !graph.contains(root_hash) {
            return Ok(None);
        }

        Ok(Some(graph))
    }
}

fn hash_string(hash: ResourceHash) -> String {
    format!("{:016x}", hash.as_u64())
}

fn parse_hash(s: &str) -> Option<u64> {
    u64::from_str_radix(s, 16).ok()
}

fn document_record(node: &DocumentNode) -> DocumentRecord {
    let (file_path, url) = match &node.resource {
        Resource::File(path) => (Some(path.to_string_lossy().into_owned()), None),
        Resource::Url(url) => (None, Some(url.clone())),
    };
    DocumentRecord {
        resource_hash: hash_string(node.resource_hash),
        content_hash: format!("{:016x}", node.content_hash.as_u64()),
        file_path,
        url,
        last_validated: node.last_validated,
    }
}

fn restore_node(record: &DocumentRecord) -> Option<DocumentNode> {
    let resource = match (&record.file_path, &record.url) {
        (Some(path), _) => Resource::file(path),
        (None, Some(url)) => Resource::url(url.clone()),
        (None, None) => return None,
    };
    Some(DocumentNode {
        resource,
        resource_hash: ResourceHash(parse_hash(&record.resource_hash)?),
        content_hash: ContentHash(parse_hash(&record.content_hash)?),
        last_validated: record.last_validated,
    })
}

fn edge_record(edge: &Edge) -> EdgeRecord {
    EdgeRecord {
        source: hash_string(edge.from),
        target: hash_string(edge.to),
        reference_type: edge.reference_type,
        required: edge.required,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use crate::resolver::{MemoryResolver, Reference};

    fn sample_graph(resolver: &MemoryResolver) -> DocumentGraph {
        let root = Resource::file("root.md");
        let child = Resource::file("child.md");
        let remote = Resource::url("https://example.com/banner.png");
        resolver.insert_with_references(
            root.clone(),
            "# Root",
            vec![
                Reference::required(child.clone(), ReferenceType::Transclusion),
                Reference::optional(remote.clone(), ReferenceType::Image),
            ],
        );
        resolver.insert(child, "# Child");
        resolver.insert(remote, [0u8, 1, 2, 3]);

        GraphBuilder::new(resolver).build(&root).unwrap().graph
    }

    #[test]
    fn persist_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path().join("graph.json"));
        let resolver = MemoryResolver::new();
        let graph = sample_graph(&resolver);

        store.persist(&graph).unwrap();
        let loaded = store.load(&Resource::file("root.md")).unwrap().unwrap();

        assert_eq!(loaded, graph);
    }

    #[test]
    fn load_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path().join("graph.json"));

        assert!(store.load(&Resource::file("root.md")).unwrap().is_none());
    }

    #[test]
    fn load_wrong_root_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path().join("graph.json"));
        let resolver = MemoryResolver::new();
        store.persist(&sample_graph(&resolver)).unwrap();

        assert!(store.load(&Resource::file("other.md")).unwrap().is_none());
    }

    #[test]
    fn load_corrupt_snapshot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        fs::write(&path, b"not json").unwrap();

        let store = GraphStore::new(path);
        assert!(store.load(&Resource::file("root.md")).unwrap().is_none());
    }

    #[test]
    fn load_stale_version_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        let snapshot = GraphSnapshot {
            version: "0".to_string(),
            generated_at: Utc::now().to_rfc3339(),
            root: "0000000000000000".to_string(),
            documents: vec![],
            depends_on: vec![],
        };
        fs::write(&path, serde_json::to_vec(&snapshot).unwrap()).unwrap();

        let store = GraphStore::new(path);
        assert!(store.load(&Resource::file("root.md")).unwrap().is_none());
    }

    #[test]
    fn snapshot_uses_schema_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = GraphStore::new(dir.path().join("graph.json"));
        let resolver = MemoryResolver::new();
        store.persist(&sample_graph(&resolver)).unwrap();

        let raw: serde_json::Value =
            serde_json::from_slice(&fs::read(store.path()).unwrap()).unwrap();
        let edge = &raw["depends_on"][0];
        assert!(edge.get("in").is_some());
        assert!(edge.get("out").is_some());
        assert!(edge.get("reference_type").is_some());
        assert!(edge.get("required").is_some());
        let doc = &raw["documents"][0];
        assert!(doc.get("resource_hash").is_some());
        assert!(doc.get("content_hash").is_some());
    }
}

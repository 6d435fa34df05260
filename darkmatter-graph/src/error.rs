//! Error taxonomy for graph construction and planning

use crate::resolver::ResolveError;
use darkmatter_types::{ReferenceType, Resource};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// One edge of a detected reference cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleEdge {
    pub from: Resource,
    pub to: Resource,
    pub reference_type: ReferenceType,
}

impl fmt::Display for CycleEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.reference_type)
    }
}

fn format_cycle(edges: &[CycleEdge]) -> String {
    edges
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Fatal build errors.
///
/// All of these abort the build atomically: no nodes or edges are
/// persisted and no cache entries are touched.
#[derive(Debug, Error)]
pub enum GraphError {
    /// The reference structure contains a cycle; the edge list closes it
    #[error("dependency cycle detected: {}", format_cycle(.0))]
    Cycle(Vec<CycleEdge>),

    /// A required reference could not be resolved
    #[error("missing required resource {reference} ({kind}), referenced from {referrer}")]
    MissingRequired {
        referrer: Resource,
        reference: Resource,
        kind: ReferenceType,
        #[source]
        source: ResolveError,
    },

    /// The root resource itself could not be resolved
    #[error("failed to resolve root resource {resource}")]
    RootUnresolved {
        resource: Resource,
        #[source]
        source: ResolveError,
    },

    /// The persistent store failed while a caller required it
    #[error("graph store error")]
    Store(#[from] StoreError),
}

/// Errors from the persistent graph store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error at {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize graph snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

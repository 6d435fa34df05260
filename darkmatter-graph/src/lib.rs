//! Darkmatter dependency graph engine
//!
//! This crate knows which documents and resources depend on which others,
//! detects what changed, decides what work must be redone, and keeps
//! expensive downstream work (transcoding, LLM calls) from being repeated.
//!
//! # Architecture
//!
//! ```text
//! resolver -> builder -> store (persist/load) -> plan (layers)
//!                                   |
//!                          invalidation (reverse edges -> cache evictions)
//! ```
//!
//! - [`hash`] computes the two 64-bit fingerprints: resource hash
//!   (location identity) and content hash (resolved bytes).
//! - [`resolver`] is the boundary to the external fetch/parse layer; the
//!   builder never does I/O of its own.
//! - [`builder`] walks a root through the resolver into a
//!   [`graph::DocumentGraph`], failing atomically on cycles and missing
//!   required resources.
//! - [`store`] persists the graph as a versioned JSON snapshot and loads
//!   it back with exact structural fidelity.
//! - [`plan`] peels the graph into layers; each layer is safe to process
//!   with unbounded parallelism once every earlier layer completes.
//! - [`invalidate`] cascades a content change along reverse edges,
//!   evicting every transitive dependent from graph and cache.
//! - [`pipeline`] composes the above into `build_and_plan`,
//!   `load_or_build`, and the revalidation sweep.
//!
//! # Example
//!
//! ```rust
//! use darkmatter_graph::prelude::*;
//!
//! let resolver = MemoryResolver::new();
//! let root = Resource::file("root.md");
//! let section = Resource::file("section.md");
//! resolver.insert_with_references(
//!     root.clone(),
//!     "# Root",
//!     vec![Reference::required(section.clone(), ReferenceType::Transclusion)],
//! );
//! resolver.insert(section, "# Section");
//!
//! let pipeline = Pipeline::new(resolver);
//! let outcome = pipeline.build_and_plan(&root).unwrap();
//! assert_eq!(outcome.plan.layer_count(), 2);
//! ```

#![warn(missing_debug_implementations)]

pub mod builder;
pub mod error;
pub mod graph;
pub mod hash;
pub mod invalidate;
pub mod pipeline;
pub mod plan;
pub mod resolver;
pub mod store;

// Re-export main types
pub use builder::{BuildOutcome, GraphBuilder};
pub use error::{CycleEdge, GraphError, StoreError};
pub use graph::{DocumentGraph, DocumentNode, Edge};
pub use hash::{content_hash, resource_hash, resource_hash_of};
pub use invalidate::{CacheSink, InvalidationEngine};
pub use pipeline::{Pipeline, PipelineOutcome};
pub use plan::{plan, WorkPlan};
pub use resolver::{FsResolver, MemoryResolver, Reference, Resolved, ResolveError, Resolver};
pub use store::GraphStore;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::builder::{BuildOutcome, GraphBuilder};
    pub use crate::error::GraphError;
    pub use crate::graph::DocumentGraph;
    pub use crate::hash::{content_hash, resource_hash, resource_hash_of};
    pub use crate::invalidate::{CacheSink, InvalidationEngine};
    pub use crate::pipeline::{Pipeline, PipelineOutcome};
    pub use crate::plan::WorkPlan;
    pub use crate::resolver::{MemoryResolver, Reference, Resolver};
    pub use crate::store::GraphStore;
    pub use darkmatter_types::{
        ContentHash, Diagnostic, ReferenceType, Resource, ResourceHash,
    };
}

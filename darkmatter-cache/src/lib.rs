//! Darkmatter typed cache family
//!
//! Content-addressed caches for the expensive artifacts of the
//! composition pipeline: rendered documents, media metadata, AI
//! responses, and vector embeddings. Every read is gated by the
//! resource's current content hash, so a stale entry can never outlive
//! an upstream edit; time-based expiry is layered on top as a per-kind
//! policy table.
//!
//! The [`manager::CacheManager`] implements the graph crate's
//! `CacheSink`, so cascade invalidation evicts entries here as it removes
//! nodes there.

#![warn(missing_debug_implementations)]

pub mod entry;
pub mod manager;
pub mod policy;
pub mod stats;

// Re-export main types
pub use entry::{AiEntry, CacheEntry, DocumentEntry, EmbeddingEntry, MediaEntry};
pub use manager::{AiCache, CacheManager, TypedCache};
pub use policy::ExpiryPolicy;
pub use stats::{CacheReport, CacheStats};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::entry::{AiEntry, DocumentEntry, EmbeddingEntry, MediaEntry};
    pub use crate::manager::CacheManager;
    pub use crate::policy::ExpiryPolicy;
    pub use crate::stats::{CacheReport, CacheStats};
    pub use darkmatter_types::{ContentHash, Resource, ResourceHash};
}

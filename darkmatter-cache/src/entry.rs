//! Cache entry types
//!
//! One entry shape per cached artifact kind. All entries share the
//! content-addressed key: an entry is only valid while the node's current
//! content hash matches the hash recorded here.

use chrono::{DateTime, Utc};
use darkmatter_types::{ContentHash, ResourceHash};
use serde::{Deserialize, Serialize};

/// Common behavior every cache entry kind implements
pub trait CacheEntry: Clone + Send + Sync + 'static {
    fn resource_hash(&self) -> ResourceHash;
    fn content_hash(&self) -> ContentHash;
    fn expires_at(&self) -> Option<DateTime<Utc>>;

    /// Expired entries are misses and are removed by the sweep
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at().is_some_and(|at| at <= now)
    }
}

macro_rules! impl_cache_entry {
    ($ty:ty) => {
        impl CacheEntry for $ty {
            fn resource_hash(&self) -> ResourceHash {
                self.resource_hash
            }
            fn content_hash(&self) -> ContentHash {
                self.content_hash
            }
            fn expires_at(&self) -> Option<DateTime<Utc>> {
                self.expires_at
            }
        }
    };
}

/// A rendered document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentEntry {
    pub resource_hash: ResourceHash,
    pub content_hash: ContentHash,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    /// Rendered output
    pub rendered: String,
}

impl_cache_entry!(DocumentEntry);

/// Extracted media metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaEntry {
    pub resource_hash: ResourceHash,
    pub content_hash: ContentHash,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    /// MIME type reported by the extractor
    pub media_type: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_secs: Option<f64>,
}

impl_cache_entry!(MediaEntry);

/// An AI-synthesized response.
///
/// Keyed additionally by `(operation, model)` so the same input caches
/// separately per model and per operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiEntry {
    pub resource_hash: ResourceHash,
    pub content_hash: ContentHash,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    /// Operation name, e.g. "summarize" or "extract_topics"
    pub operation: String,

    /// Model identifier the response came from
    pub model: String,

    pub response: String,
}

impl_cache_entry!(AiEntry);

/// A vector embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingEntry {
    pub resource_hash: ResourceHash,
    pub content_hash: ContentHash,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,

    pub vector: Vec<f32>,
}

impl_cache_entry!(EmbeddingEntry);

//! Expiration policy
//!
//! Time-based expiry is a configuration table, not hard logic. Content
//! hashes gate every read regardless; TTLs only bound how long an entry
//! whose input cannot be re-observed cheaply (remote content, model
//! output drift) is trusted.

use chrono::{DateTime, Duration, Utc};
use darkmatter_types::Resource;

/// Per-kind time-to-live table. `None` means no time-based expiry.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryPolicy {
    /// Local documents: content hash is cheap to recheck
    pub local_document_ttl: Option<Duration>,

    /// Remote documents: the origin may change without a local signal
    pub remote_document_ttl: Option<Duration>,

    /// AI responses: bounded so model updates eventually surface
    pub ai_response_ttl: Option<Duration>,

    /// Media metadata: derived purely from local bytes
    pub media_ttl: Option<Duration>,

    /// Embeddings: derived purely from content
    pub embedding_ttl: Option<Duration>,
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        ExpiryPolicy {
            local_document_ttl: None,
            remote_document_ttl: Some(Duration::hours(6)),
            ai_response_ttl: Some(Duration::weeks(2)),
            media_ttl: None,
            embedding_ttl: None,
        }
    }
}

impl ExpiryPolicy {
    /// TTL for a document entry, by locality of its resource
    pub fn document_ttl(&self, resource: &Resource) -> Option<Duration> {
        if resource.is_remote() {
            self.remote_document_ttl
        } else {
            self.local_document_ttl
        }
    }

    /// Absolute expiry timestamp for a document created at `created_at`
    pub fn document_expiry(
        &self,
        resource: &Resource,
        created_at: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        self.document_ttl(resource).map(|ttl| created_at + ttl)
    }

    pub fn ai_expiry(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.ai_response_ttl.map(|ttl| created_at + ttl)
    }

    pub fn media_expiry(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.media_ttl.map(|ttl| created_at + ttl)
    }

    pub fn embedding_expiry(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.embedding_ttl.map(|ttl| created_at + ttl)
    }
}

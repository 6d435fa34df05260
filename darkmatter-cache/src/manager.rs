//! Cache manager
//!
//! A family of typed caches, one per artifact kind, each keyed by
//! `(resource_hash, content_hash)`. `get` treats a content-hash mismatch
//! or a passed expiry as a miss; `upsert` replaces whatever entry was
//! live for the key, so at most one entry per resource per kind exists
//! (per `(operation, model)` for AI responses). Concurrent same-key
//! upserts resolve last-writer-wins, which is fine: the artifact is a
//! pure function of content.
//!
//! The manager is a capability handed to workers as an `Arc`, not a
//! singleton, so tests substitute their own instance freely.

use crate::entry::{AiEntry, CacheEntry, DocumentEntry, EmbeddingEntry, MediaEntry};
use crate::policy::ExpiryPolicy;
use crate::stats::{CacheReport, CacheStats};
use chrono::{DateTime, Utc};
use darkmatter_graph::CacheSink;
use darkmatter_types::{ContentHash, Resource, ResourceHash};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Content-addressed cache for one entry kind
#[derive(Debug)]
pub struct TypedCache<E: CacheEntry> {
    entries: DashMap<ResourceHash, E>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<E: CacheEntry> TypedCache<E> {
    fn new() -> Self {
        TypedCache {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Look up the entry for a resource at its current content hash.
    ///
    /// A stored entry whose content hash differs from `content_hash` is a
    /// miss regardless of expiry, and vice versa.
    pub fn get(&self, resource_hash: ResourceHash, content_hash: ContentHash) -> Option<E> {
        self.get_at(resource_hash, content_hash, Utc::now())
    }

    fn get_at(
        &self,
        resource_hash: ResourceHash,
        content_hash: ContentHash,
        now: DateTime<Utc>,
    ) -> Option<E> {
        let hit = self
            .entries
            .get(&resource_hash)
            .filter(|entry| entry.content_hash() == content_hash && !entry.is_expired(now))
            .map(|entry| entry.clone());

        match hit {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert the entry, replacing any live entry for the same resource
    pub fn upsert(&self, entry: E) {
        self.entries.insert(entry.resource_hash(), entry);
    }

    /// Remove the entry for a resource. Returns true if one was present.
    pub fn invalidate(&self, resource_hash: ResourceHash) -> bool {
        self.entries.remove(&resource_hash).is_some()
    }

    fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

/// AI-response cache, additionally keyed by `(operation, model)`
#[derive(Debug)]
pub struct AiCache {
    entries: DashMap<(ResourceHash, String, String), AiEntry>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl AiCache {
    fn new() -> Self {
        AiCache {
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn get(
        &self,
        resource_hash: ResourceHash,
        content_hash: ContentHash,
        operation: &str,
        model: &str,
    ) -> Option<AiEntry> {
        self.get_at(resource_hash, content_hash, operation, model, Utc::now())
    }

    fn get_at(
        &self,
        resource_hash: ResourceHash,
        content_hash: ContentHash,
        operation: &str,
        model: &str,
        now: DateTime<Utc>,
    ) -> Option<AiEntry> {
        let key = (resource_hash, operation.to_string(), model.to_string());
        let hit = self
            .entries
            .get(&key)
            .filter(|entry| entry.content_hash() == content_hash && !entry.is_expired(now))
            .map(|entry| entry.clone());

        match hit {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert, replacing any live entry for the same
    /// `(resource, operation, model)` triple
    pub fn upsert(&self, entry: AiEntry) {
        let key = (
            entry.resource_hash,
            entry.operation.clone(),
            entry.model.clone(),
        );
        self.entries.insert(key, entry);
    }

    /// Remove every operation/model entry for a resource
    pub fn invalidate(&self, resource_hash: ResourceHash) -> usize {
        let before = self.entries.len();
        self.entries.retain(|(hash, _, _), _| *hash != resource_hash);
        before - self.entries.len()
    }

    fn evict_expired(&self, now: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired(now));
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len(),
        }
    }
}

/// The full cache family, shared across workers as an `Arc` handle
#[derive(Debug)]
pub struct CacheManager {
    documents: TypedCache<DocumentEntry>,
    media: TypedCache<MediaEntry>,
    ai: AiCache,
    embeddings: TypedCache<EmbeddingEntry>,
    policy: ExpiryPolicy,
}

impl CacheManager {
    pub fn new() -> Self {
        Self::with_policy(ExpiryPolicy::default())
    }

    pub fn with_policy(policy: ExpiryPolicy) -> Self {
        CacheManager {
            documents: TypedCache::new(),
            media: TypedCache::new(),
            ai: AiCache::new(),
            embeddings: TypedCache::new(),
            policy,
        }
    }

    pub fn policy(&self) -> &ExpiryPolicy {
        &self.policy
    }

    pub fn documents(&self) -> &TypedCache<DocumentEntry> {
        &self.documents
    }

    pub fn media(&self) -> &TypedCache<MediaEntry> {
        &self.media
    }

    pub fn ai(&self) -> &AiCache {
        &self.ai
    }

    pub fn embeddings(&self) -> &TypedCache<EmbeddingEntry> {
        &self.embeddings
    }

    /// Stamp a document entry with the policy's TTL for its locality
    pub fn document_entry(
        &self,
        resource: &Resource,
        content_hash: ContentHash,
        rendered: impl Into<String>,
    ) -> DocumentEntry {
        let created_at = Utc::now();
        DocumentEntry {
            resource_hash: darkmatter_graph::resource_hash_of(resource),
            content_hash,
            created_at,
            expires_at: self.policy.document_expiry(resource, created_at),
            rendered: rendered.into(),
        }
    }

    /// Stamp a media-metadata entry; dimension fields start unset
    pub fn media_entry(
        &self,
        resource_hash: ResourceHash,
        content_hash: ContentHash,
        media_type: impl Into<String>,
    ) -> MediaEntry {
        let created_at = Utc::now();
        MediaEntry {
            resource_hash,
            content_hash,
            created_at,
            expires_at: self.policy.media_expiry(created_at),
            media_type: media_type.into(),
            width: None,
            height: None,
            duration_secs: None,
        }
    }

    /// Stamp an AI-response entry
    pub fn ai_entry(
        &self,
        resource_hash: ResourceHash,
        content_hash: ContentHash,
        operation: impl Into<String>,
        model: impl Into<String>,
        response: impl Into<String>,
    ) -> AiEntry {
        let created_at = Utc::now();
        AiEntry {
            resource_hash,
            content_hash,
            created_at,
            expires_at: self.policy.ai_expiry(created_at),
            operation: operation.into(),
            model: model.into(),
            response: response.into(),
        }
    }

    /// Stamp an embedding entry
    pub fn embedding_entry(
        &self,
        resource_hash: ResourceHash,
        content_hash: ContentHash,
        vector: Vec<f32>,
    ) -> EmbeddingEntry {
        let created_at = Utc::now();
        EmbeddingEntry {
            resource_hash,
            content_hash,
            created_at,
            expires_at: self.policy.embedding_expiry(created_at),
            vector,
        }
    }

    /// Remove a resource's entries from every kind
    pub fn invalidate(&self, resource_hash: ResourceHash) {
        self.documents.invalidate(resource_hash);
        self.media.invalidate(resource_hash);
        self.ai.invalidate(resource_hash);
        self.embeddings.invalidate(resource_hash);
        tracing::debug!("evicted cache entries for {}", resource_hash);
    }

    /// Expiration sweep across every kind. Returns entries removed.
    pub fn evict_expired(&self) -> usize {
        let now = Utc::now();
        let removed = self.documents.evict_expired(now)
            + self.media.evict_expired(now)
            + self.ai.evict_expired(now)
            + self.embeddings.evict_expired(now);
        if removed > 0 {
            tracing::info!(removed, "expired cache entries swept");
        }
        removed
    }

    pub fn report(&self) -> CacheReport {
        CacheReport {
            documents: self.documents.stats(),
            media: self.media.stats(),
            ai: self.ai.stats(),
            embeddings: self.embeddings.stats(),
        }
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheSink for CacheManager {
    fn evict(&self, resource_hash: ResourceHash) {
        self.invalidate(resource_hash);
    }
}

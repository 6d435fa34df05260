//! Resource and content fingerprints
//!
//! Two independent 64-bit fingerprints per resource: the resource hash
//! identifies a location, the content hash identifies the bytes resolved
//! from it. Both use XXH3-64: fast, well-distributed, and stable across
//! runs and processes. This is a change-detection mechanism, not a
//! security boundary.

use darkmatter_types::{ContentHash, Resource, ResourceHash};
use xxhash_rust::xxh3::xxh3_64;

/// Fingerprint a resource's location string
pub fn resource_hash(location: &str) -> ResourceHash {
    ResourceHash(xxh3_64(location.as_bytes()))
}

/// Fingerprint a resource directly
pub fn resource_hash_of(resource: &Resource) -> ResourceHash {
    resource_hash(&resource.location())
}

/// Fingerprint resolved bytes
pub fn content_hash(bytes: &[u8]) -> ContentHash {
    ContentHash(xxh3_64(bytes))
}

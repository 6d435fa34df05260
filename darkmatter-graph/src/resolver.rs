//! Resolver boundary
//!
//! The graph builder does not fetch anything itself. It consumes resolved
//! bytes and child-reference lists through the [`Resolver`] trait, so the
//! parser, network client, and media probes stay outside this crate.
//! Tests and drivers inject the implementation as a capability.

use darkmatter_types::{ReferenceType, Resource};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use thiserror::Error;

/// A reference from one resource to another, as reported by the resolver
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// The referenced resource
    pub target: Resource,

    /// Semantic kind of the reference
    pub kind: ReferenceType,

    /// Whether a failure to resolve the target is build-fatal
    pub required: bool,
}

impl Reference {
    pub fn required(target: Resource, kind: ReferenceType) -> Self {
        Reference {
            target,
            kind,
            required: true,
        }
    }

    pub fn optional(target: Resource, kind: ReferenceType) -> Self {
        Reference {
            target,
            kind,
            required: false,
        }
    }
}

/// The result of resolving a resource: its bytes plus outgoing references
#[derive(Debug, Clone, Default)]
pub struct Resolved {
    pub bytes: Vec<u8>,
    pub references: Vec<Reference>,
}

impl Resolved {
    pub fn leaf(bytes: impl Into<Vec<u8>>) -> Self {
        Resolved {
            bytes: bytes.into(),
            references: Vec::new(),
        }
    }

    pub fn with_references(bytes: impl Into<Vec<u8>>, references: Vec<Reference>) -> Self {
        Resolved {
            bytes: bytes.into(),
            references,
        }
    }
}

/// Errors a resolver may report
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("resource not found: {0}")]
    NotFound(Resource),

    #[error("failed to read {resource}: {source}")]
    Io {
        resource: Resource,
        #[source]
        source: std::io::Error,
    },

    #[error("network error fetching {resource}: {message}")]
    Network { resource: Resource, message: String },
}

/// External collaborator that turns a resource into bytes and references
pub trait Resolver {
    fn resolve(&self, resource: &Resource) -> Result<Resolved, ResolveError>;
}

/// In-memory resolver for tests and drivers that pre-resolve content.
///
/// Interior mutability lets a test edit a document after a build to
/// exercise revalidation.
#[derive(Debug, Default)]
pub struct MemoryResolver {
    docs: RwLock<HashMap<Resource, Resolved>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a leaf resource with no outgoing references
    pub fn insert(&self, resource: Resource, bytes: impl Into<Vec<u8>>) {
        self.docs.write().insert(resource, Resolved::leaf(bytes));
    }

    /// Register a resource together with its outgoing references
    pub fn insert_with_references(
        &self,
        resource: Resource,
        bytes: impl Into<Vec<u8>>,
        references: Vec<Reference>,
    ) {
        self.docs
            .write()
            .insert(resource, Resolved::with_references(bytes, references));
    }

    /// Replace a resource's bytes, keeping its references
    pub fn set_bytes(&self, resource: &Resource, bytes: impl Into<Vec<u8>>) {
        let mut docs = self.docs.write();
        if let Some(resolved) = docs.get_mut(resource) {
            resolved.bytes = bytes.into();
        } else {
            docs.insert(resource.clone(), Resolved::leaf(bytes));
        }
    }

    /// Remove a resource so later resolutions fail with NotFound
    pub fn remove(&self, resource: &Resource) {
        self.docs.write().remove(resource);
    }
}

impl Resolver for MemoryResolver {
    fn resolve(&self, resource: &Resource) -> Result<Resolved, ResolveError> {
        self.docs
            .read()
            .get(resource)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(resource.clone()))
    }
}

/// Filesystem resolver for local resources.
///
/// Reads bytes from disk and reports no references; reference extraction
/// belongs to the document parser, which sits outside this crate. Remote
/// resources fail with a network error since no fetcher is configured.
#[derive(Debug, Default)]
pub struct FsResolver;

impl FsResolver {
    pub fn new() -> Self {
        FsResolver
    }
}

impl Resolver for FsResolver {
    fn resolve(&self, resource: &Resource) -> Result<Resolved, ResolveError> {
        match resource.as_path() {
            Some(path) => match fs::read(path) {
                Ok(bytes) => Ok(Resolved::leaf(bytes)),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    Err(ResolveError::NotFound(resource.clone()))
                }
                Err(err) => Err(ResolveError::Io {
                    resource: resource.clone(),
                    source: err,
                }),
            },
            None => Err(ResolveError::Network {
                resource: resource.clone(),
                message: "no network fetcher configured".to_string(),
            }),
        }
    }
}

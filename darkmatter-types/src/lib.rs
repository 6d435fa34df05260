//! Shared types for darkmatter
//!
//! This crate provides common types used across the darkmatter ecosystem:
//! resource identities, the two fingerprint newtypes, reference kinds, and
//! build diagnostics.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// An addressable input: a local file or a remote URL.
///
/// Identity is positional - two resources with the same location are the
/// same resource regardless of what bytes currently live there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// A local filesystem path
    File(PathBuf),

    /// A remote URL
    Url(String),
}

impl Resource {
    /// Create a resource from a local path
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Resource::File(path.into())
    }

    /// Create a resource from a URL string
    pub fn url(url: impl Into<String>) -> Self {
        Resource::Url(url.into())
    }

    /// The canonical location string that identifies this resource
    pub fn location(&self) -> String {
        match self {
            Resource::File(path) => path.to_string_lossy().into_owned(),
            Resource::Url(url) => url.clone(),
        }
    }

    /// True for URL resources; drives the cache expiry policy
    pub fn is_remote(&self) -> bool {
        matches!(self, Resource::Url(_))
    }

    /// The local path, if this is a file resource
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Resource::File(path) => Some(path),
            Resource::Url(_) => None,
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.location())
    }
}

/// Fingerprint of a resource's location string.
///
/// This is the identity key for graph nodes and cache entries. It never
/// changes for a given location, even when the content does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceHash(pub u64);

impl ResourceHash {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Fingerprint of a resource's resolved bytes.
///
/// A mismatch between a node's current content hash and the hash recorded
/// in a cache entry makes that entry a miss, regardless of expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentHash(pub u64);

impl ContentHash {
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Semantic kind of a reference from one document to another
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    /// Embedding another document's resolved content inline
    Transclusion,

    /// Input to an AI summarization pass
    SummaryInput,

    /// Input to topic extraction
    TopicInput,

    /// An embedded image
    Image,

    /// An embedded audio clip
    Audio,

    /// A plain hyperlink
    Link,
}

impl ReferenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::Transclusion => "transclusion",
            ReferenceType::SummaryInput => "summary_input",
            ReferenceType::TopicInput => "topic_input",
            ReferenceType::Image => "image",
            ReferenceType::Audio => "audio",
            ReferenceType::Link => "link",
        }
    }
}

impl fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Severity of a build diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Warning,
    Info,
}

/// A non-fatal condition surfaced alongside a successful build.
///
/// Missing optional resources and store-unavailable fallbacks are reported
/// here rather than failing the build.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable machine-readable code, e.g. "resource.missing_optional"
    pub code: String,

    /// Human-readable description
    pub message: String,

    pub severity: DiagnosticSeverity,

    /// The resource the diagnostic is about, when one applies
    pub resource: Option<Resource>,
}

impl Diagnostic {
    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> Self {
        Diagnostic {
            code: code.into(),
            message: message.into(),
            severity: DiagnosticSeverity::Warning,
            resource: None,
        }
    }

    pub fn with_resource(mut self, resource: Resource) -> Self {
        self.resource = Some(resource);
        self
    }
}

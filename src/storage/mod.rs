//! Storage backend abstraction for document relay
//!
//! Documents live in one of two collections (`entries`, `summaries`). A
//! [`DocumentStore`] resolves a `(collection, name)` pair into concrete
//! locations for every backend and then runs each operation through an
//! ordered fallback chain: the WebDAV backend first (when configured), the
//! local filesystem last.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use tracing::info;
use utoipa::ToSchema;

pub mod factory;
pub mod fallback;
pub mod local;
pub mod resolver;
pub mod webdav;

use fallback::FallbackChain;
use resolver::PathResolver;

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// One of the two fixed document namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    /// Documents written by clients
    Entries,
    /// Derived `<stem>_summary.md` documents
    Summaries,
}

impl Collection {
    pub const ALL: [Collection; 2] = [Collection::Entries, Collection::Summaries];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Entries => "entries",
            Collection::Summaries => "summaries",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "entries" => Ok(Collection::Entries),
            "summaries" => Ok(Collection::Summaries),
            other => Err(StorageError::InvalidCollection(other.to_string())),
        }
    }
}

/// Which kind of backend served (or failed) an operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackendKind {
    Remote,
    Local,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendKind::Remote => f.write_str("remote"),
            BackendKind::Local => f.write_str("local"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid collection '{0}' (expected 'entries' or 'summaries')")]
    InvalidCollection(String),

    #[error("Invalid document name '{name}': {reason}")]
    InvalidPath { name: String, reason: String },

    #[error("Document not found: {collection}/{name}")]
    NotFound { collection: Collection, name: String },

    #[error("{backend} storage failure: {source}")]
    Backend {
        backend: BackendKind,
        #[source]
        source: anyhow::Error,
    },
}

impl StorageError {
    pub fn backend(backend: BackendKind, source: impl Into<anyhow::Error>) -> Self {
        StorageError::Backend { backend, source: source.into() }
    }

    pub fn not_found(location: &DocumentLocation) -> Self {
        StorageError::NotFound {
            collection: location.collection,
            name: location.name.clone(),
        }
    }
}

/// A collection's root directory in each backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionLocation {
    pub collection: Collection,
    /// Slash-joined path below the WebDAV root, e.g. `BACKBRAIN5.2_V2/01_inbox`
    pub remote_dir: String,
    /// Directory under the local storage root
    pub local_dir: PathBuf,
}

/// A single document resolved for every backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentLocation {
    pub collection: Collection,
    pub name: String,
    pub remote_path: String,
    pub local_path: PathBuf,
    pub parent: CollectionLocation,
}

/// Core storage backend trait that all storage implementations must implement
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Which side of the fallback chain this backend sits on
    fn kind(&self) -> BackendKind;

    /// Get a human-readable identifier for this storage backend type
    fn storage_type(&self) -> &'static str;

    /// Store a document, creating the collection directory first if needed.
    /// Overwrites any existing document with the same location.
    async fn write(&self, location: &DocumentLocation, data: &[u8]) -> StorageResult<()>;

    /// Retrieve a document's bytes
    async fn read(&self, location: &DocumentLocation) -> StorageResult<Vec<u8>>;

    /// Base names of the files (not directories) in a collection, unordered
    async fn list(&self, location: &CollectionLocation) -> StorageResult<Vec<String>>;

    /// Initialize the storage backend (validate access, prepare the root, etc.)
    async fn initialize(&self) -> anyhow::Result<()>;
}

/// What the caller gets back from a successful write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct WriteReceipt {
    /// Logical path of the document, `<target_folder>/<collection_dir>/<name>`
    pub path: String,
    pub collection: Collection,
    pub name: String,
}

/// Write/read/list over the resolved namespace with transparent backend fallback
pub struct DocumentStore {
    resolver: PathResolver,
    chain: FallbackChain,
}

impl DocumentStore {
    pub fn new(resolver: PathResolver, chain: FallbackChain) -> Self {
        Self { resolver, chain }
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn backends(&self) -> &[Arc<dyn StorageBackend>] {
        self.chain.backends()
    }

    /// Whether the WebDAV backend takes part in the chain
    pub fn remote_enabled(&self) -> bool {
        self.backends().iter().any(|b| b.kind() == BackendKind::Remote)
    }

    pub async fn write(
        &self,
        collection: Collection,
        name: &str,
        content: &[u8],
    ) -> StorageResult<WriteReceipt> {
        let location = self.resolver.resolve(collection, name)?;

        let served = self
            .chain
            .run("write", |backend| {
                let location = &location;
                async move { backend.write(location, content).await }
            })
            .await?;

        info!(
            "Stored {}/{} ({} bytes) via {} backend",
            collection,
            location.name,
            content.len(),
            served.backend
        );

        Ok(WriteReceipt {
            path: location.remote_path.clone(),
            collection,
            name: location.name,
        })
    }

    pub async fn read(&self, collection: Collection, name: &str) -> StorageResult<Vec<u8>> {
        let location = self.resolver.resolve(collection, name)?;

        let served = self
            .chain
            .run("read", |backend| {
                let location = &location;
                async move { backend.read(location).await }
            })
            .await?;

        Ok(served.value)
    }

    /// Read a document as text; invalid UTF-8 is replaced rather than rejected
    pub async fn read_text(&self, collection: Collection, name: &str) -> StorageResult<String> {
        let bytes = self.read(collection, name).await?;
        Ok(match String::from_utf8(bytes) {
            Ok(text) => text,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        })
    }

    /// Names in a collection, sorted lexicographically and truncated to `limit`
    pub async fn list(&self, collection: Collection, limit: usize) -> StorageResult<Vec<String>> {
        let location = self.resolver.collection(collection);

        let served = self
            .chain
            .run("list", |backend| {
                let location = &location;
                async move { backend.list(location).await }
            })
            .await?;

        let mut names = served.value;
        names.sort();
        names.dedup();
        names.truncate(limit);
        Ok(names)
    }
}

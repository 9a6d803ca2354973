//! Local filesystem storage backend implementation

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, error, info};

use super::{BackendKind, CollectionLocation, DocumentLocation, StorageBackend, StorageError, StorageResult};
use crate::utils::security::is_within_base;

/// Local filesystem storage backend
pub struct LocalStorageBackend {
    root: PathBuf,
}

impl LocalStorageBackend {
    /// Create a new local storage backend
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Get the storage root
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Recursively create a directory; an existing directory is not an error
    async fn ensure_dir(&self, dir: &Path) -> StorageResult<()> {
        match fs::create_dir_all(dir).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::AlreadyExists && dir.is_dir() => Ok(()),
            Err(e) => {
                error!("Failed to create directory {}: {}", dir.display(), e);
                Err(StorageError::backend(
                    BackendKind::Local,
                    anyhow!("Failed to create directory {}: {}", dir.display(), e),
                ))
            }
        }
    }

    fn check_location(&self, location: &DocumentLocation) -> StorageResult<()> {
        if is_within_base(&location.local_path, &location.parent.local_dir) {
            Ok(())
        } else {
            Err(StorageError::InvalidPath {
                name: location.name.clone(),
                reason: format!("{} escapes {}", location.local_path.display(), location.parent.local_dir.display()),
            })
        }
    }
}

#[async_trait]
impl StorageBackend for LocalStorageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Local
    }

    fn storage_type(&self) -> &'static str {
        "local"
    }

    async fn write(&self, location: &DocumentLocation, data: &[u8]) -> StorageResult<()> {
        self.check_location(location)?;
        self.ensure_dir(&location.parent.local_dir).await?;

        fs::write(&location.local_path, data).await.map_err(|e| {
            StorageError::backend(
                BackendKind::Local,
                anyhow!("Failed to write {}: {}", location.local_path.display(), e),
            )
        })?;

        debug!("Stored document locally: {}", location.local_path.display());
        Ok(())
    }

    async fn read(&self, location: &DocumentLocation) -> StorageResult<Vec<u8>> {
        self.check_location(location)?;

        match fs::read(&location.local_path).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == ErrorKind::NotFound => Err(StorageError::not_found(location)),
            Err(e) => Err(StorageError::backend(
                BackendKind::Local,
                anyhow!("Failed to read {}: {}", location.local_path.display(), e),
            )),
        }
    }

    async fn list(&self, location: &CollectionLocation) -> StorageResult<Vec<String>> {
        let mut entries = match fs::read_dir(&location.local_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Collection directory {} does not exist yet", location.local_dir.display());
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StorageError::backend(
                    BackendKind::Local,
                    anyhow!("Failed to list {}: {}", location.local_dir.display(), e),
                ))
            }
        };

        let mut names = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(StorageError::backend(
                        BackendKind::Local,
                        anyhow!("Failed to list {}: {}", location.local_dir.display(), e),
                    ))
                }
            };

            let is_file = match entry.file_type().await {
                Ok(file_type) => file_type.is_file(),
                Err(e) => {
                    debug!("Skipping {}: {}", entry.path().display(), e);
                    false
                }
            };
            if !is_file {
                continue;
            }

            match entry.file_name().into_string() {
                Ok(name) => names.push(name),
                Err(raw) => debug!("Skipping non UTF-8 file name {:?}", raw),
            }
        }

        Ok(names)
    }

    async fn initialize(&self) -> Result<()> {
        if let Err(e) = fs::create_dir_all(&self.root).await {
            error!("Failed to create storage root {:?}: {}", self.root, e);
            return Err(anyhow!("Failed to create storage root {}: {}", self.root.display(), e));
        }
        info!("Ensured local storage root exists: {:?}", self.root);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::resolver::{PathResolver, StorageLayout};
    use crate::storage::Collection;
    use tempfile::TempDir;

    fn setup() -> (TempDir, LocalStorageBackend, PathResolver) {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let root = temp_dir.path().join("store");
        let resolver = PathResolver::new(StorageLayout {
            target_folder: "remote".to_string(),
            entries_dir: "01_inbox".to_string(),
            summaries_dir: "summaries".to_string(),
            local_root: root.clone(),
        });
        (temp_dir, LocalStorageBackend::new(root), resolver)
    }

    #[tokio::test]
    async fn test_write_creates_collection_dir_lazily() {
        let (_tmp, backend, resolver) = setup();
        let location = resolver.resolve(Collection::Entries, "note1.txt").unwrap();
        assert!(!location.parent.local_dir.exists());

        backend.write(&location, b"hello world").await.unwrap();

        assert!(location.parent.local_dir.is_dir());
        assert_eq!(backend.read(&location).await.unwrap(), b"hello world");
    }

    #[tokio::test]
    async fn test_write_overwrites() {
        let (_tmp, backend, resolver) = setup();
        let location = resolver.resolve(Collection::Entries, "a.txt").unwrap();

        backend.write(&location, b"first").await.unwrap();
        backend.write(&location, b"second").await.unwrap();

        assert_eq!(backend.read(&location).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let (_tmp, backend, resolver) = setup();
        let location = resolver.resolve(Collection::Entries, "missing.txt").unwrap();

        let err = backend.read(&location).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_missing_dir_is_empty() {
        let (_tmp, backend, resolver) = setup();
        let names = backend.list(&resolver.collection(Collection::Summaries)).await.unwrap();
        assert!(names.is_empty());
    }

    #[tokio::test]
    async fn test_list_skips_subdirectories() {
        let (_tmp, backend, resolver) = setup();
        let location = resolver.resolve(Collection::Entries, "b.txt").unwrap();
        backend.write(&location, b"b").await.unwrap();
        std::fs::create_dir_all(location.parent.local_dir.join("nested")).unwrap();

        let names = backend.list(&location.parent).await.unwrap();
        assert_eq!(names, vec!["b.txt".to_string()]);
    }

    #[tokio::test]
    async fn test_initialize_creates_root() {
        let (_tmp, backend, _resolver) = setup();
        backend.initialize().await.unwrap();
        assert!(backend.root().is_dir());
        // Idempotent
        backend.initialize().await.unwrap();
    }
}

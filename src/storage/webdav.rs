//! WebDAV storage backend: the preferred side of the fallback chain

use anyhow::Result;
use async_trait::async_trait;
use bytes::Bytes;
use tracing::{info, warn};

use super::{BackendKind, CollectionLocation, DocumentLocation, StorageBackend, StorageError, StorageResult};
use crate::services::webdav::{WebDAVErrorClassifier, WebDAVService};

pub struct WebDAVStorageBackend {
    service: WebDAVService,
}

impl WebDAVStorageBackend {
    pub fn new(service: WebDAVService) -> Self {
        Self { service }
    }

    fn remote_failure(operation: &str, path: &str, error: anyhow::Error) -> StorageError {
        let kind = WebDAVErrorClassifier::classify(&error);
        warn!("WebDAV {} of '{}' failed ({}): {:#}", operation, path, kind, error);
        StorageError::backend(BackendKind::Remote, error)
    }
}

#[async_trait]
impl StorageBackend for WebDAVStorageBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Remote
    }

    fn storage_type(&self) -> &'static str {
        "webdav"
    }

    async fn write(&self, location: &DocumentLocation, data: &[u8]) -> StorageResult<()> {
        self.service
            .ensure_directory(&location.parent.remote_dir)
            .await
            .map_err(|e| Self::remote_failure("directory setup", &location.parent.remote_dir, e))?;

        // The in-memory buffer is dropped when the upload finishes or fails
        let buffer = Bytes::copy_from_slice(data);
        self.service
            .upload(&location.remote_path, buffer)
            .await
            .map_err(|e| Self::remote_failure("upload", &location.remote_path, e))
    }

    async fn read(&self, location: &DocumentLocation) -> StorageResult<Vec<u8>> {
        match self.service.download(&location.remote_path).await {
            Ok(Some(data)) => Ok(data),
            Ok(None) => Err(StorageError::not_found(location)),
            Err(e) => Err(Self::remote_failure("download", &location.remote_path, e)),
        }
    }

    async fn list(&self, location: &CollectionLocation) -> StorageResult<Vec<String>> {
        let entries = self
            .service
            .list_directory(&location.remote_dir)
            .await
            .map_err(|e| Self::remote_failure("listing", &location.remote_dir, e))?;

        Ok(entries
            .into_iter()
            .filter(|entry| !entry.is_directory)
            .map(|entry| entry.name)
            .collect())
    }

    /// An unreachable server is not fatal at startup; operations fall back instead
    async fn initialize(&self) -> Result<()> {
        match self.service.test_connection().await {
            Ok(()) => info!(
                "WebDAV storage ready at {}",
                self.service.get_config().webdav_url()
            ),
            Err(e) => warn!(
                "WebDAV server not reachable at startup, local fallback will be used: {:#}",
                e
            ),
        }
        Ok(())
    }
}

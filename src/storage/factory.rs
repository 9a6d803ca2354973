//! Factory for creating the document store based on configuration

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use super::fallback::FallbackChain;
use super::local::LocalStorageBackend;
use super::resolver::PathResolver;
use super::webdav::WebDAVStorageBackend;
use super::{DocumentStore, StorageBackend};
use crate::config::Config;
use crate::services::webdav::WebDAVService;

/// Storage configuration enum for the available chains
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Local filesystem only
    Local { root: String },
    /// WebDAV preferred, local filesystem as fallback
    WebDAV {
        webdav: crate::services::webdav::WebDAVConfig,
        retry: crate::services::webdav::RetryConfig,
        fallback_root: String,
    },
}

/// Create storage configuration from the loaded settings
pub fn storage_config_from_env(config: &Config) -> StorageConfig {
    match config.webdav_config() {
        Some(webdav) => StorageConfig::WebDAV {
            webdav,
            retry: config.retry_config(),
            fallback_root: config.local_root.clone(),
        },
        None => {
            if config.webdav_url.is_some() {
                warn!("WEBDAV_URL is set but credentials are incomplete, using local storage only");
            }
            StorageConfig::Local {
                root: config.local_root.clone(),
            }
        }
    }
}

/// Create the ordered backend list for a storage configuration
pub async fn create_storage_backends(storage: StorageConfig) -> Result<Vec<Arc<dyn StorageBackend>>> {
    let mut backends: Vec<Arc<dyn StorageBackend>> = Vec::new();

    let local_root = match storage {
        StorageConfig::Local { root } => root,
        StorageConfig::WebDAV { webdav, retry, fallback_root } => {
            match WebDAVService::new_with_retry(webdav, retry) {
                Ok(service) => {
                    let remote = WebDAVStorageBackend::new(service);
                    remote.initialize().await?;
                    backends.push(Arc::new(remote));
                }
                Err(e) => {
                    warn!("WebDAV is misconfigured, using local storage only: {:#}", e);
                }
            }
            fallback_root
        }
    };

    let local = LocalStorageBackend::new(local_root);
    local.initialize().await?;
    backends.push(Arc::new(local));

    Ok(backends)
}

/// Build the document store the service runs on
pub async fn create_document_store(config: &Config) -> Result<DocumentStore> {
    let layout = config.storage_layout();
    layout.validate()?;

    let backends = create_storage_backends(storage_config_from_env(config)).await?;
    let chain = backends
        .iter()
        .map(|b| b.storage_type())
        .collect::<Vec<_>>()
        .join(" -> ");
    info!("Document storage chain: {}", chain);

    Ok(DocumentStore::new(PathResolver::new(layout), FallbackChain::new(backends)?))
}

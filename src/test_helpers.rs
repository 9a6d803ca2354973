/*!
 * Test Helpers and Utilities
 *
 * Builders for configurations, stores and application state backed by a
 * caller-provided local directory. Tests can modify the returned objects as needed.
 */

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

use crate::{
    config::Config,
    services::summarizer::Summarizer,
    storage::{factory::create_document_store, DocumentStore},
    AppState,
};

/// Creates a local-only test configuration rooted at `local_root`
pub fn create_test_config(local_root: &Path) -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        local_root: local_root.to_string_lossy().to_string(),
        ..Config::default()
    }
}

/// Creates a local-only document store rooted at `local_root`
pub async fn create_test_store(local_root: &Path) -> DocumentStore {
    create_document_store(&create_test_config(local_root))
        .await
        .expect("Failed to create test document store")
}

/// Summarizer that answers without any network access
pub struct StubSummarizer {
    fail: bool,
}

impl StubSummarizer {
    pub fn new() -> Self {
        Self { fail: false }
    }

    /// A summarizer whose every call fails
    pub fn failing() -> Self {
        Self { fail: true }
    }
}

impl Default for StubSummarizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Summarizer for StubSummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        if self.fail {
            return Err(anyhow!("stub summarizer failure"));
        }
        Ok(format!("Zusammenfassung ({} Zeichen)", text.chars().count()))
    }
}

/// Creates a test AppState with a local-only store and the stub summarizer
pub async fn create_test_app_state(local_root: &Path) -> Arc<AppState> {
    create_test_app_state_with_config(create_test_config(local_root)).await
}

/// Creates a test AppState with a custom configuration
pub async fn create_test_app_state_with_config(config: Config) -> Arc<AppState> {
    create_test_app_state_with_summarizer(config, Arc::new(StubSummarizer::new())).await
}

pub async fn create_test_app_state_with_summarizer(
    config: Config,
    summarizer: Arc<dyn Summarizer>,
) -> Arc<AppState> {
    let store = create_document_store(&config)
        .await
        .expect("Failed to create test document store");

    Arc::new(AppState {
        config,
        store: Arc::new(store),
        summarizer,
    })
}

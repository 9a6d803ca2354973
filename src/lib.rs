pub mod commands;
pub mod config;
pub mod routes;
pub mod services;
pub mod storage;
pub mod test_helpers;
pub mod utils;


use std::sync::Arc;

use config::Config;
use services::summarizer::Summarizer;
use storage::DocumentStore;

/// Shared state handed to every request handler
pub struct AppState {
    pub config: Config,
    pub store: Arc<DocumentStore>,
    pub summarizer: Arc<dyn Summarizer>,
}

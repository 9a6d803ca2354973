//! Summaries through an OpenAI-compatible chat completions API

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::Config;
use crate::storage::{Collection, DocumentStore};

/// Returned instead of a summary when no API key is configured
pub const DISABLED_MARKER: &str = "[auto-summary disabled: missing OPENAI_API_KEY]";

const SYSTEM_PROMPT: &str = "Fasse deutsch, sachlich und kurz zusammen.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, text: &str) -> Result<String>;
}

/// Name of the summary document derived from an entry: `<stem>_summary.md`
pub fn summary_name(name: &str) -> String {
    let stem = Path::new(name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(name);
    format!("{}_summary.md", stem)
}

/// Short label for a summarizer failure
fn failure_kind(error: &anyhow::Error) -> &'static str {
    match error.chain().find_map(|e| e.downcast_ref::<reqwest::Error>()) {
        Some(e) if e.is_timeout() => "Timeout",
        Some(e) if e.is_connect() => "ConnectionError",
        Some(e) if e.is_status() => "HTTPError",
        Some(e) if e.is_decode() => "DecodeError",
        Some(_) => "RequestError",
        None => "SummaryError",
    }
}

/// Marker reported in place of a summary when summarizing failed
pub fn failure_marker(error: &anyhow::Error) -> String {
    format!("[auto-summary failed: {}]", failure_kind(error))
}

/// Summarize an entry and store the result as `<stem>_summary.md`.
///
/// Never fails: returns the summary text, or a failure marker when either
/// the summarizer or the store failed. Nothing is stored on failure.
pub async fn summarize_and_store(
    store: &DocumentStore,
    summarizer: &dyn Summarizer,
    name: &str,
    text: &str,
) -> String {
    let summary = match summarizer.summarize(text).await {
        Ok(summary) => summary,
        Err(e) => {
            warn!("Auto-summary for '{}' failed: {:#}", name, e);
            return failure_marker(&e);
        }
    };

    let target = summary_name(name);
    match store.write(Collection::Summaries, &target, summary.as_bytes()).await {
        Ok(_) => summary,
        Err(e) => {
            warn!("Could not store summary '{}': {}", target, e);
            "[auto-summary failed: StorageError]".to_string()
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

pub struct OpenAISummarizer {
    client: Client,
    api_key: Option<String>,
    base_url: String,
    model: String,
    words: u32,
}

impl OpenAISummarizer {
    pub fn new(api_key: Option<String>, base_url: &str, model: &str, words: u32) -> Result<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            words,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.openai_api_key.clone(),
            &config.openai_base_url,
            &config.summary_model,
            config.summary_words,
        )
    }
}

#[async_trait]
impl Summarizer for OpenAISummarizer {
    async fn summarize(&self, text: &str) -> Result<String> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Ok(DISABLED_MARKER.to_string());
        };

        let prompt = format!("Bitte ~{} Wörter:\n\n{}", self.words, text);
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: &prompt },
            ],
            temperature: 0.2,
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("Requesting summary from {} ({} chars of input)", url, text.len());

        let response: ChatResponse = self
            .client
            .post(&url)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .context("Summary request failed")?
            .error_for_status()
            .context("Summary request rejected")?
            .json()
            .await
            .context("Invalid summary response")?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Summary response contained no content"))?;

        Ok(content.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_name() {
        assert_eq!(summary_name("note1.txt"), "note1_summary.md");
        assert_eq!(summary_name("archive.tar.gz"), "archive.tar_summary.md");
        assert_eq!(summary_name("README"), "README_summary.md");
    }

    #[tokio::test]
    async fn test_missing_key_returns_disabled_marker() {
        let summarizer = OpenAISummarizer::new(None, "http://127.0.0.1:9", "gpt-4o-mini", 120).unwrap();
        assert_eq!(summarizer.summarize("text").await.unwrap(), DISABLED_MARKER);
    }

    struct Broken;

    #[async_trait]
    impl Summarizer for Broken {
        async fn summarize(&self, _text: &str) -> Result<String> {
            Err(anyhow!("model exploded"))
        }
    }

    struct Fixed;

    #[async_trait]
    impl Summarizer for Fixed {
        async fn summarize(&self, text: &str) -> Result<String> {
            Ok(format!("kurz: {}", text.len()))
        }
    }

    #[test]
    fn test_failure_marker() {
        assert_eq!(
            failure_marker(&anyhow!("model exploded")),
            "[auto-summary failed: SummaryError]"
        );
    }

    #[tokio::test]
    async fn test_summarize_and_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = crate::test_helpers::create_test_store(temp_dir.path()).await;

        let summary = summarize_and_store(&store, &Fixed, "note1.txt", "hello world").await;
        assert_eq!(summary, "kurz: 11");
        assert_eq!(
            store.read_text(Collection::Summaries, "note1_summary.md").await.unwrap(),
            "kurz: 11"
        );
    }

    #[tokio::test]
    async fn test_failed_summary_is_not_stored() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let store = crate::test_helpers::create_test_store(temp_dir.path()).await;

        let summary = summarize_and_store(&store, &Broken, "note1.txt", "hello world").await;
        assert_eq!(summary, "[auto-summary failed: SummaryError]");
        assert!(store.list(Collection::Summaries, 10).await.unwrap().is_empty());
    }
}

//! Process-wide settings, read once at startup
//!
//! Values come from the environment (a `.env` file is loaded by the binaries
//! through `dotenvy`). Unknown variables are ignored. Once built, a `Config`
//! is never mutated; it is handed to the store and the HTTP state explicitly.

use anyhow::{anyhow, Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::services::webdav::{RetryConfig, WebDAVConfig};
use crate::storage::resolver::StorageLayout;

#[derive(Clone, Debug)]
pub struct Config {
    pub server_address: String,

    // Remote (WebDAV) backend
    pub webdav_url: Option<String>,
    pub webdav_username: Option<String>,
    pub webdav_password: Option<String>,
    pub webdav_server_type: Option<String>,
    pub webdav_timeout_seconds: u64,
    pub webdav_max_retries: u32,

    // Layout shared by both backends
    pub target_folder: String,
    pub entries_dir: String,
    pub summaries_dir: String,
    pub local_root: String,

    // HTTP surface
    pub api_secret: Option<String>,
    pub enable_public_alias: bool,

    // Summaries
    pub auto_summary_on_write: bool,
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub summary_model: String,
    pub summary_words: u32,
    pub pdf_max_pages: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "0.0.0.0:8000".to_string(),
            webdav_url: None,
            webdav_username: None,
            webdav_password: None,
            webdav_server_type: None,
            webdav_timeout_seconds: 30,
            webdav_max_retries: 0,
            target_folder: "BACKBRAIN5.2_V2".to_string(),
            entries_dir: "01_inbox".to_string(),
            summaries_dir: "summaries".to_string(),
            local_root: "./data".to_string(),
            api_secret: None,
            enable_public_alias: true,
            auto_summary_on_write: false,
            openai_api_key: None,
            openai_base_url: "https://api.openai.com/v1".to_string(),
            summary_model: "gpt-4o-mini".to_string(),
            summary_words: 120,
            pdf_max_pages: None,
        }
    }
}

/// Non-empty value of an environment variable
fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn env_or(key: &str, default: &str) -> String {
    env_opt(key).unwrap_or_else(|| default.to_string())
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|e| anyhow!("Invalid value for {}: '{}' ({})", key, raw, e)),
        None => Ok(None),
    }
}

/// Parses 1/true/yes/on and 0/false/no/off (case-insensitive)
pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn env_flag(key: &str, default: bool) -> Result<bool> {
    match env_opt(key) {
        Some(raw) => parse_flag(&raw).ok_or_else(|| anyhow!("Invalid boolean for {}: '{}'", key, raw)),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let config = Config {
            server_address: env_or("SERVER_ADDRESS", &defaults.server_address),
            webdav_url: env_opt("WEBDAV_URL"),
            webdav_username: env_opt("WEBDAV_USERNAME"),
            webdav_password: env_opt("WEBDAV_PASSWORD"),
            webdav_server_type: env_opt("WEBDAV_SERVER_TYPE").map(|s| s.to_lowercase()),
            webdav_timeout_seconds: env_parse("WEBDAV_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.webdav_timeout_seconds),
            webdav_max_retries: env_parse("WEBDAV_MAX_RETRIES")?.unwrap_or(defaults.webdav_max_retries),
            // An empty target folder is allowed and anchors collections at the DAV root
            target_folder: env::var("WEBDAV_TARGET_FOLDER")
                .map(|v| v.trim().to_string())
                .unwrap_or(defaults.target_folder),
            entries_dir: env_or("ENTRIES_DIR", &defaults.entries_dir),
            summaries_dir: env_or("SUMMARIES_DIR", &defaults.summaries_dir),
            local_root: env_or("LOCAL_STORAGE_ROOT", &defaults.local_root),
            api_secret: env_opt("API_SECRET"),
            enable_public_alias: env_flag("ENABLE_PUBLIC_ALIAS", defaults.enable_public_alias)?,
            auto_summary_on_write: env_flag("AUTO_SUMMARY_ON_WRITE", defaults.auto_summary_on_write)?,
            openai_api_key: env_opt("OPENAI_API_KEY"),
            openai_base_url: env_or("OPENAI_BASE_URL", &defaults.openai_base_url),
            summary_model: env_or("SUMMARY_MODEL", &defaults.summary_model),
            summary_words: env_parse("SUMMARY_WORDS")?.unwrap_or(defaults.summary_words),
            pdf_max_pages: env_parse("PDF_MAX_PAGES")?,
        };

        config
            .storage_layout()
            .validate()
            .context("Invalid storage layout configuration")?;

        Ok(config)
    }

    /// The remote backend takes part only when URL, username and password are all set
    pub fn webdav_configured(&self) -> bool {
        self.webdav_config().is_some()
    }

    pub fn webdav_config(&self) -> Option<WebDAVConfig> {
        let server_url = self.webdav_url.as_ref().filter(|v| !v.is_empty())?;
        let username = self.webdav_username.as_ref().filter(|v| !v.is_empty())?;
        let password = self.webdav_password.as_ref().filter(|v| !v.is_empty())?;

        Some(WebDAVConfig {
            server_url: server_url.clone(),
            username: username.clone(),
            password: password.clone(),
            timeout_seconds: self.webdav_timeout_seconds,
            server_type: self.webdav_server_type.clone(),
        })
    }

    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.webdav_max_retries,
            ..RetryConfig::default()
        }
    }

    pub fn storage_layout(&self) -> StorageLayout {
        StorageLayout {
            target_folder: self.target_folder.clone(),
            entries_dir: self.entries_dir.clone(),
            summaries_dir: self.summaries_dir.clone(),
            local_root: PathBuf::from(&self.local_root),
        }
    }

    pub fn auth_enabled(&self) -> bool {
        self.api_secret.is_some()
    }
}

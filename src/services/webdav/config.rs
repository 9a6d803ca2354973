use anyhow::{anyhow, Result};
use std::time::Duration;

/// Connection settings for the remote WebDAV store
#[derive(Debug, Clone)]
pub struct WebDAVConfig {
    pub server_url: String,
    pub username: String,
    pub password: String,
    pub timeout_seconds: u64,
    pub server_type: Option<String>, // "nextcloud", "owncloud", "generic"
}

/// Retry behaviour for transport errors and 5xx responses
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_delay_ms: 250,
            max_delay_ms: 5_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl WebDAVConfig {
    pub fn validate(&self) -> Result<()> {
        if self.server_url.trim().is_empty() {
            return Err(anyhow!("WebDAV server URL is required"));
        }
        if self.username.is_empty() {
            return Err(anyhow!("WebDAV username is required"));
        }
        if self.password.is_empty() {
            return Err(anyhow!("WebDAV password is required"));
        }
        if self.timeout_seconds == 0 {
            return Err(anyhow!("WebDAV timeout must be at least one second"));
        }
        if let Some(server_type) = self.server_type.as_deref() {
            if !matches!(server_type, "nextcloud" | "owncloud" | "generic") {
                return Err(anyhow!(
                    "Unsupported WebDAV server type '{}' (expected nextcloud, owncloud or generic)",
                    server_type
                ));
            }
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Adds `https://` when no scheme is given and strips trailing slashes
    pub fn normalize_server_url(url: &str) -> String {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        }
    }

    /// Base URL of the DAV tree, following the server type's conventions
    pub fn webdav_url(&self) -> String {
        let base = Self::normalize_server_url(&self.server_url);
        match self.server_type.as_deref() {
            Some("nextcloud") => format!(
                "{}/remote.php/dav/files/{}",
                base,
                urlencoding::encode(&self.username)
            ),
            Some("owncloud") => format!("{}/remote.php/webdav", base),
            Some("generic") => format!("{}/webdav", base),
            _ => base,
        }
    }
}

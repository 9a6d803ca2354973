use anyhow::{anyhow, Context, Result};
use bytes::Bytes;
use rand::Rng;
use reqwest::{Client, Method, Response, StatusCode};
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::common::{build_user_agent, encode_path};
use super::config::{RetryConfig, WebDAVConfig};
use super::xml::{parse_propfind_response, DavEntry};

const PROPFIND_BODY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<D:propfind xmlns:D="DAV:">
    <D:prop>
        <D:resourcetype/>
        <D:getcontentlength/>
        <D:getlastmodified/>
    </D:prop>
</D:propfind>"#;

/// Outcome of a MKCOL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DirectoryStatus {
    Created,
    AlreadyExists,
}

/// WebDAV client covering the operations the document store needs
pub struct WebDAVService {
    client: Client,
    config: WebDAVConfig,
    retry_config: RetryConfig,
}

impl WebDAVService {
    /// Creates a new WebDAV service with the default (no retry) policy
    pub fn new(config: WebDAVConfig) -> Result<Self> {
        Self::new_with_retry(config, RetryConfig::default())
    }

    /// Creates a new WebDAV service with custom retry configuration
    pub fn new_with_retry(config: WebDAVConfig, retry_config: RetryConfig) -> Result<Self> {
        config.validate()?;

        // The store layer enforces no timeout of its own; this is the only one
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent(build_user_agent())
            .build()?;

        Ok(Self {
            client,
            config,
            retry_config,
        })
    }

    pub fn get_config(&self) -> &WebDAVConfig {
        &self.config
    }

    // ============================================================================
    // Request plumbing
    // ============================================================================

    /// Calculates retry delay with jitter to prevent thundering herd problems
    ///
    /// delay = base_delay * multiplier^attempt * (0.9 + rand(0.0..0.2)), capped at max_delay_ms
    fn calculate_retry_delay_with_jitter(&self, attempt: u32, base_delay: u64) -> u64 {
        let exponential_delay =
            (base_delay as f64 * self.retry_config.backoff_multiplier.powi(attempt as i32)) as u64;
        let capped = std::cmp::min(exponential_delay, self.retry_config.max_delay_ms);

        let jitter_multiplier = 0.9 + rand::rng().random::<f64>() * 0.2;
        let jittered_delay = (capped as f64 * jitter_multiplier) as u64;

        std::cmp::min(jittered_delay, self.retry_config.max_delay_ms)
    }

    /// Gets the WebDAV URL for a path relative to the DAV root
    pub fn get_url_for_path(&self, path: &str) -> String {
        let base_url = self.config.webdav_url();
        let clean_path = encode_path(path);

        if clean_path.is_empty() {
            format!("{}/", base_url.trim_end_matches('/'))
        } else {
            format!("{}/{}", base_url.trim_end_matches('/'), clean_path)
        }
    }

    /// Sends an authenticated request and returns the response whatever its
    /// status, except that transport errors and 5xx/429 responses are retried
    /// up to `max_retries` times and then reported as errors.
    pub async fn send_request(
        &self,
        method: Method,
        url: &str,
        body: Option<Bytes>,
        headers: &[(&str, &str)],
    ) -> Result<Response> {
        let mut attempt = 0;

        debug!("🌐 {} {} (user: {})", method, url, self.config.username);

        loop {
            let mut request = self
                .client
                .request(method.clone(), url)
                .basic_auth(&self.config.username, Some(&self.config.password));

            for (key, value) in headers {
                request = request.header(*key, *value);
            }
            if let Some(ref body) = body {
                request = request.body(body.clone());
            }

            match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!("📥 {} {} -> {}", method, url, status.as_u16());

                    let retryable = status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS;
                    if !retryable {
                        return Ok(response);
                    }

                    if attempt < self.retry_config.max_retries {
                        let delay = self.calculate_retry_delay_with_jitter(attempt, self.retry_config.initial_delay_ms);
                        warn!(
                            "Server answered {} for {} {}, retrying in {}ms (attempt {}/{})",
                            status, method, url, delay, attempt + 1, self.retry_config.max_retries
                        );
                        sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(anyhow!(
                        "{} failed for '{}' with status: {}",
                        method,
                        url,
                        status
                    ));
                }
                Err(e) => {
                    if attempt < self.retry_config.max_retries {
                        let delay = self.calculate_retry_delay_with_jitter(attempt, self.retry_config.initial_delay_ms);
                        warn!(
                            "Request error: {}, retrying in {}ms (attempt {}/{})",
                            e, delay, attempt + 1, self.retry_config.max_retries
                        );
                        sleep(Duration::from_millis(delay)).await;
                        attempt += 1;
                        continue;
                    }

                    return Err(anyhow::Error::new(e).context(format!(
                        "{} {} failed after {} attempt(s)",
                        method,
                        url,
                        attempt + 1
                    )));
                }
            }
        }
    }

    async fn propfind(&self, path: &str, depth: &str) -> Result<Response> {
        let url = self.get_url_for_path(path);
        self.send_request(
            Method::from_bytes(b"PROPFIND")?,
            &url,
            Some(Bytes::from_static(PROPFIND_BODY.as_bytes())),
            &[("Depth", depth), ("Content-Type", "application/xml")],
        )
        .await
    }

    // ============================================================================
    // Connection testing
    // ============================================================================

    /// Issues an OPTIONS request against the DAV root
    pub async fn test_connection(&self) -> Result<()> {
        let url = self.get_url_for_path("");
        info!("🔍 Testing WebDAV connection to {}", url);

        let response = self.send_request(Method::OPTIONS, &url, None, &[]).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(anyhow!("OPTIONS failed for '{}' with status: {}", url, status));
        }

        if let Some(dav) = response.headers().get("dav").and_then(|v| v.to_str().ok()) {
            debug!("Server DAV compliance: {}", dav);
        }
        info!("✅ WebDAV connection test successful");
        Ok(())
    }

    // ============================================================================
    // File and directory operations
    // ============================================================================

    /// Checks whether a resource exists (PROPFIND, Depth 0)
    pub async fn exists(&self, path: &str) -> Result<bool> {
        let response = self.propfind(path, "0").await?;
        match response.status() {
            StatusCode::OK | StatusCode::MULTI_STATUS => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => Err(anyhow!("PROPFIND failed for '{}' with status: {}", path, status)),
        }
    }

    /// Creates a single collection. A 405 means the collection is already there.
    pub async fn create_directory(&self, path: &str) -> Result<DirectoryStatus> {
        let url = self.get_url_for_path(path);
        let response = self
            .send_request(Method::from_bytes(b"MKCOL")?, &url, None, &[])
            .await?;

        match response.status() {
            StatusCode::CREATED | StatusCode::OK | StatusCode::NO_CONTENT => {
                debug!("📁 Created remote directory {}", path);
                Ok(DirectoryStatus::Created)
            }
            StatusCode::METHOD_NOT_ALLOWED => Ok(DirectoryStatus::AlreadyExists),
            status => {
                // Another writer may have won the race between our check and MKCOL
                if self.exists(path).await.unwrap_or(false) {
                    debug!("Remote directory {} appeared concurrently", path);
                    return Ok(DirectoryStatus::AlreadyExists);
                }
                Err(anyhow!("MKCOL failed for '{}' with status: {}", path, status))
            }
        }
    }

    /// Walks `path` segment by segment and creates whatever is missing
    pub async fn ensure_directory(&self, path: &str) -> Result<()> {
        let mut current = String::new();
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            if !current.is_empty() {
                current.push('/');
            }
            current.push_str(segment);

            if !self.exists(&current).await? {
                self.create_directory(&current)
                    .await
                    .with_context(|| format!("Failed to create remote directory '{}'", current))?;
            }
        }
        Ok(())
    }

    /// Uploads `data` to `path`, replacing any existing file
    pub async fn upload(&self, path: &str, data: Bytes) -> Result<()> {
        let url = self.get_url_for_path(path);
        let size = data.len();
        let response = self
            .send_request(
                Method::PUT,
                &url,
                Some(data),
                &[("Content-Type", "application/octet-stream")],
            )
            .await?;

        match response.status() {
            StatusCode::OK | StatusCode::CREATED | StatusCode::NO_CONTENT => {
                debug!("⬆️ Uploaded {} bytes to {}", size, path);
                Ok(())
            }
            status => Err(anyhow!("PUT failed for '{}' with status: {}", path, status)),
        }
    }

    /// Downloads a file; `None` when the server reports 404
    pub async fn download(&self, path: &str) -> Result<Option<Vec<u8>>> {
        let url = self.get_url_for_path(path);
        let response = self.send_request(Method::GET, &url, None, &[]).await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => {
                let content = response.bytes().await?;
                debug!("⬇️ Downloaded {} bytes from {}", content.len(), path);
                Ok(Some(content.to_vec()))
            }
            status => Err(anyhow!("GET failed for '{}' with status: {}", path, status)),
        }
    }

    /// Lists the direct children of a collection (PROPFIND, Depth 1).
    /// The collection itself is not part of the result.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DavEntry>> {
        let response = self.propfind(path, "1").await?;
        let status = response.status();
        if status != StatusCode::MULTI_STATUS && status != StatusCode::OK {
            return Err(anyhow!("PROPFIND failed for '{}' with status: {}", path, status));
        }

        let body = response.text().await?;
        let entries = parse_propfind_response(&body)?;

        let own_path = path.trim_matches('/');
        let children = entries
            .into_iter()
            .filter(|entry| !(entry.is_directory && is_same_collection(&entry.href, own_path)))
            .collect();
        Ok(children)
    }
}

fn is_same_collection(href: &str, own_path: &str) -> bool {
    let decoded = urlencoding::decode(href)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| href.to_string());
    let decoded = decoded.trim_end_matches('/');
    if own_path.is_empty() {
        return true;
    }
    decoded == own_path || decoded.ends_with(&format!("/{}", own_path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> WebDAVConfig {
        WebDAVConfig {
            server_url: "https://test.example.com".to_string(),
            username: "test_user".to_string(),
            password: "test_password".to_string(),
            timeout_seconds: 30,
            server_type: Some("nextcloud".to_string()),
        }
    }

    #[test]
    fn test_url_construction() {
        let service = WebDAVService::new(config()).expect("Failed to create WebDAV service");

        assert_eq!(
            service.get_url_for_path("BACKBRAIN5.2_V2/01_inbox/my note.txt"),
            "https://test.example.com/remote.php/dav/files/test_user/BACKBRAIN5.2_V2/01_inbox/my%20note.txt"
        );
        assert_eq!(
            service.get_url_for_path("/"),
            "https://test.example.com/remote.php/dav/files/test_user/"
        );
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = config();
        config.username.clear();
        assert!(WebDAVService::new(config).is_err());
    }

    #[test]
    fn test_same_collection_detection() {
        assert!(is_same_collection("/remote.php/dav/files/u/root/01_inbox/", "root/01_inbox"));
        assert!(is_same_collection("/dav/My%20Folder/", "My Folder"));
        assert!(!is_same_collection("/dav/root/01_inbox/archive/", "root/01_inbox"));
    }

    #[test]
    fn test_retry_delay_with_jitter() {
        let retry_config = RetryConfig {
            max_retries: 3,
            initial_delay_ms: 1000,
            max_delay_ms: 10000,
            backoff_multiplier: 2.0,
        };

        let service = WebDAVService::new_with_retry(config(), retry_config).expect("Failed to create WebDAV service");

        for attempt in 0..5 {
            let delay = service.calculate_retry_delay_with_jitter(attempt, 1000);
            let expected_base = (1000.0 * 2.0_f64.powi(attempt as i32)) as u64;
            let capped_base = std::cmp::min(expected_base, 10000);
            let expected_min = (capped_base as f64 * 0.9) as u64;

            assert!(delay >= expected_min, "Delay {} for attempt {} is below minimum expected {}", delay, attempt, expected_min);
            assert!(delay <= 10000, "Delay {} for attempt {} exceeds max_delay_ms", delay, attempt);
        }

        let delays: Vec<u64> = (0..10).map(|_| service.calculate_retry_delay_with_jitter(1, 1000)).collect();
        let first_delay = delays[0];
        assert!(
            delays.iter().any(|&d| d != first_delay),
            "Jitter should produce some variation, but all delays were {}",
            first_delay
        );
    }
}

use std::fmt;

/// Why a remote operation failed; used to make fallback warnings actionable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteFailureKind {
    Timeout,
    NetworkError,
    PermissionDenied,
    NotFound,
    ServerError,
    XmlParseError,
    Unknown,
}

impl fmt::Display for RemoteFailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RemoteFailureKind::Timeout => "timeout",
            RemoteFailureKind::NetworkError => "network error",
            RemoteFailureKind::PermissionDenied => "permission denied",
            RemoteFailureKind::NotFound => "not found",
            RemoteFailureKind::ServerError => "server error",
            RemoteFailureKind::XmlParseError => "malformed response",
            RemoteFailureKind::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// WebDAV-specific error classifier
pub struct WebDAVErrorClassifier;

impl WebDAVErrorClassifier {
    /// Classify an error by its transport cause first, then by message
    pub fn classify(error: &anyhow::Error) -> RemoteFailureKind {
        if let Some(reqwest_error) = error.chain().find_map(|e| e.downcast_ref::<reqwest::Error>()) {
            if reqwest_error.is_timeout() {
                return RemoteFailureKind::Timeout;
            }
            if reqwest_error.is_connect() {
                return RemoteFailureKind::NetworkError;
            }
        }

        if let Some(status) = Self::extract_http_status(error) {
            return match status {
                401 | 403 => RemoteFailureKind::PermissionDenied,
                404 => RemoteFailureKind::NotFound,
                500..=599 => RemoteFailureKind::ServerError,
                _ => RemoteFailureKind::Unknown,
            };
        }

        let error_str = format!("{:#}", error).to_lowercase();
        if error_str.contains("timeout") || error_str.contains("timed out") {
            RemoteFailureKind::Timeout
        } else if error_str.contains("permission denied")
            || error_str.contains("forbidden")
            || error_str.contains("unauthorized")
        {
            RemoteFailureKind::PermissionDenied
        } else if error_str.contains("connection refused")
            || error_str.contains("error sending request")
            || error_str.contains("network")
            || error_str.contains("dns")
            || error_str.contains("unreachable")
        {
            RemoteFailureKind::NetworkError
        } else if error_str.contains("xml") || error_str.contains("malformed") {
            RemoteFailureKind::XmlParseError
        } else if error_str.contains("not found") {
            RemoteFailureKind::NotFound
        } else {
            RemoteFailureKind::Unknown
        }
    }

    /// Extract an HTTP status code from an error message of the form `... status: 404 ...`
    pub fn extract_http_status(error: &anyhow::Error) -> Option<u16> {
        let error_str = format!("{:#}", error);
        let (_, rest) = error_str.split_once("status: ")?;
        let code: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        code.parse().ok().filter(|code| (100..600).contains(code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_classify_by_status() {
        let cases = [
            ("PUT failed for 'a' with status: 401 Unauthorized", RemoteFailureKind::PermissionDenied),
            ("PROPFIND failed for 'a' with status: 404 Not Found", RemoteFailureKind::NotFound),
            ("GET failed for 'a' with status: 503 Service Unavailable", RemoteFailureKind::ServerError),
            ("MKCOL failed for 'a' with status: 409 Conflict", RemoteFailureKind::Unknown),
        ];
        for (message, expected) in cases {
            assert_eq!(WebDAVErrorClassifier::classify(&anyhow!(message)), expected, "{message}");
        }
    }

    #[test]
    fn test_classify_by_message() {
        assert_eq!(
            WebDAVErrorClassifier::classify(&anyhow!("Request failed: connection refused")),
            RemoteFailureKind::NetworkError
        );
        assert_eq!(
            WebDAVErrorClassifier::classify(&anyhow!("operation timed out")),
            RemoteFailureKind::Timeout
        );
        assert_eq!(
            WebDAVErrorClassifier::classify(&anyhow!("Malformed PROPFIND XML at position 3")),
            RemoteFailureKind::XmlParseError
        );
        assert_eq!(
            WebDAVErrorClassifier::classify(&anyhow!("something odd")),
            RemoteFailureKind::Unknown
        );
    }

    #[test]
    fn test_extract_http_status() {
        assert_eq!(WebDAVErrorClassifier::extract_http_status(&anyhow!("with status: 207")), Some(207));
        assert_eq!(WebDAVErrorClassifier::extract_http_status(&anyhow!("no status here")), None);
        assert_eq!(WebDAVErrorClassifier::extract_http_status(&anyhow!("status: 9999")), None);
    }
}

//! Common utilities and shared functions for WebDAV services

/// Build a standardized User-Agent string for all WebDAV requests
pub fn build_user_agent() -> String {
    format!("Backbrain/{} (WebDAV-Relay)", env!("CARGO_PKG_VERSION"))
}

/// Percent-encode each segment of a slash-separated path, keeping the slashes
pub fn encode_path(path: &str) -> String {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Last non-empty segment of a (possibly percent-encoded) href
pub fn href_basename(href: &str) -> Option<String> {
    let segment = href.trim_end_matches('/').rsplit('/').next()?;
    if segment.is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string());
    Some(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_format() {
        let user_agent = build_user_agent();
        assert!(user_agent.starts_with("Backbrain/"));
        assert!(user_agent.contains(env!("CARGO_PKG_VERSION")));
        assert!(user_agent.ends_with("(WebDAV-Relay)"));
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(encode_path("/BACKBRAIN5.2_V2/01_inbox/"), "BACKBRAIN5.2_V2/01_inbox");
        assert_eq!(encode_path("a b/c#d.txt"), "a%20b/c%23d.txt");
    }

    #[test]
    fn test_href_basename() {
        assert_eq!(
            href_basename("/remote.php/dav/files/anna/inbox/my%20note.txt").as_deref(),
            Some("my note.txt")
        );
        assert_eq!(href_basename("/dav/inbox/").as_deref(), Some("inbox"));
        assert_eq!(href_basename("/"), None);
    }
}

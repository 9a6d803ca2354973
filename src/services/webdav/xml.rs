//! PROPFIND multistatus parsing

use anyhow::{anyhow, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

use super::common::href_basename;

/// One `<D:response>` of a multistatus body
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DavEntry {
    /// Raw href as sent by the server (percent-encoded)
    pub href: String,
    /// Decoded last path segment
    pub name: String,
    pub is_directory: bool,
    pub content_length: Option<u64>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Href,
    ContentLength,
}

fn create_reader(xml: &str) -> Reader<&[u8]> {
    let mut reader = Reader::from_str(xml);
    let config = reader.config_mut();
    config.trim_text(true);
    config.expand_empty_elements = false;
    reader
}

/// Parse a `207 Multi-Status` PROPFIND body into entries.
///
/// Namespace prefixes vary between servers (`D:`, `d:`, none), so elements
/// are matched on their local name only. An href ending in `/` is treated as
/// a directory even when the server omits `<resourcetype>`.
pub fn parse_propfind_response(xml: &str) -> Result<Vec<DavEntry>> {
    let mut reader = create_reader(xml);
    let mut buf = Vec::new();

    let mut entries = Vec::new();
    let mut in_response = false;
    let mut field = Field::None;
    let mut href = String::new();
    let mut is_collection = false;
    let mut content_length: Option<u64> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => match e.local_name().as_ref() {
                b"response" => {
                    in_response = true;
                    href.clear();
                    is_collection = false;
                    content_length = None;
                }
                b"href" if in_response => field = Field::Href,
                b"getcontentlength" if in_response => field = Field::ContentLength,
                b"collection" if in_response => is_collection = true,
                _ => {}
            },
            Ok(Event::Empty(ref e)) => {
                if in_response && e.local_name().as_ref() == b"collection" {
                    is_collection = true;
                }
            }
            Ok(Event::Text(e)) => {
                let text = e.unescape().map_err(|e| anyhow!("Text unescape error: {}", e))?;
                match field {
                    Field::Href => href.push_str(&text),
                    Field::ContentLength => content_length = text.trim().parse().ok(),
                    Field::None => {}
                }
            }
            Ok(Event::End(ref e)) => match e.local_name().as_ref() {
                b"href" | b"getcontentlength" => field = Field::None,
                b"response" => {
                    in_response = false;
                    let href = href.trim().to_string();
                    if let Some(name) = href_basename(&href) {
                        entries.push(DavEntry {
                            is_directory: is_collection || href.ends_with('/'),
                            href,
                            name,
                            content_length,
                        });
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(anyhow!(
                    "Malformed PROPFIND XML at position {}: {}",
                    reader.buffer_position(),
                    e
                ))
            }
            _ => {}
        }
        buf.clear();
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    const NEXTCLOUD_LISTING: &str = r#"<?xml version="1.0"?>
<d:multistatus xmlns:d="DAV:" xmlns:oc="http://owncloud.org/ns">
  <d:response>
    <d:href>/remote.php/dav/files/anna/BACKBRAIN5.2_V2/01_inbox/</d:href>
    <d:propstat>
      <d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/remote.php/dav/files/anna/BACKBRAIN5.2_V2/01_inbox/note%201.txt</d:href>
    <d:propstat>
      <d:prop>
        <d:resourcetype/>
        <d:getcontentlength>11</d:getcontentlength>
      </d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
  <d:response>
    <d:href>/remote.php/dav/files/anna/BACKBRAIN5.2_V2/01_inbox/archive/</d:href>
    <d:propstat>
      <d:prop><d:resourcetype><d:collection/></d:resourcetype></d:prop>
      <d:status>HTTP/1.1 200 OK</d:status>
    </d:propstat>
  </d:response>
</d:multistatus>"#;

    #[test]
    fn test_parse_nextcloud_listing() {
        let entries = parse_propfind_response(NEXTCLOUD_LISTING).unwrap();
        assert_eq!(entries.len(), 3);

        assert!(entries[0].is_directory);
        assert_eq!(entries[0].name, "01_inbox");

        assert!(!entries[1].is_directory);
        assert_eq!(entries[1].name, "note 1.txt");
        assert_eq!(entries[1].content_length, Some(11));

        assert!(entries[2].is_directory);
        assert_eq!(entries[2].name, "archive");
    }

    #[test]
    fn test_parse_uppercase_prefix_and_escaped_href() {
        let xml = r#"<D:multistatus xmlns:D="DAV:">
            <D:response><D:href>/dav/summaries/a&amp;b_summary.md</D:href>
            <D:propstat><D:prop><D:resourcetype></D:resourcetype></D:prop></D:propstat></D:response>
        </D:multistatus>"#;

        let entries = parse_propfind_response(xml).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a&b_summary.md");
        assert!(!entries[0].is_directory);
    }

    #[test]
    fn test_parse_empty_multistatus() {
        let entries = parse_propfind_response(r#"<d:multistatus xmlns:d="DAV:"/>"#).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_parse_malformed_xml() {
        assert!(parse_propfind_response("<d:multistatus><d:response></d:multi").is_err());
    }
}

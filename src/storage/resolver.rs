//! Maps a logical `(collection, name)` pair to a location in every backend.
//!
//! Remote paths are anchored at `<target_folder>/<collection_dir>/<name>`,
//! local paths at `<local_root>/<collection_dir>/<name>`. Resolution is pure:
//! nothing here touches storage.

use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::warn;

use super::{Collection, CollectionLocation, DocumentLocation, StorageError, StorageResult};
use crate::utils::security::validate_document_name;

/// Directory names shared by both backends
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    /// Folder below the WebDAV root that holds both collections
    pub target_folder: String,
    pub entries_dir: String,
    pub summaries_dir: String,
    /// Root directory of the local fallback store
    pub local_root: PathBuf,
}

impl StorageLayout {
    pub fn validate(&self) -> Result<()> {
        for (label, dir) in [
            ("entries directory", &self.entries_dir),
            ("summaries directory", &self.summaries_dir),
        ] {
            if dir.trim_matches('/').is_empty() {
                return Err(anyhow!("The {} name must not be empty", label));
            }
            if dir.contains("..") {
                return Err(anyhow!("The {} name must not contain '..': {}", label, dir));
            }
        }
        if self.target_folder.contains("..") {
            return Err(anyhow!("The remote target folder must not contain '..': {}", self.target_folder));
        }
        if self.entries_dir.trim_matches('/') == self.summaries_dir.trim_matches('/') {
            return Err(anyhow!(
                "Entries and summaries must use different directories (both are '{}')",
                self.entries_dir
            ));
        }
        Ok(())
    }

    pub fn collection_dir(&self, collection: Collection) -> &str {
        match collection {
            Collection::Entries => &self.entries_dir,
            Collection::Summaries => &self.summaries_dir,
        }
    }
}

/// Joins path segments with `/`, dropping empty segments and normalising
/// backslashes so that `a/`, `/b` and `c\d` become `a/b/c/d`.
pub fn join_remote(parts: &[&str]) -> String {
    parts
        .iter()
        .flat_map(|part| part.split(['/', '\\']))
        .filter(|segment| !segment.is_empty())
        .collect::<Vec<_>>()
        .join("/")
}

#[derive(Debug, Clone)]
pub struct PathResolver {
    layout: StorageLayout,
}

impl PathResolver {
    pub fn new(layout: StorageLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Parse a collection name and resolve a document in one step
    pub fn resolve_named(&self, collection: &str, name: &str) -> StorageResult<DocumentLocation> {
        let collection: Collection = collection.parse()?;
        self.resolve(collection, name)
    }

    pub fn collection(&self, collection: Collection) -> CollectionLocation {
        let dir = self.layout.collection_dir(collection);
        let mut local_dir = self.layout.local_root.clone();
        local_dir.extend(dir.split(['/', '\\']).filter(|s| !s.is_empty()));

        CollectionLocation {
            collection,
            remote_dir: join_remote(&[&self.layout.target_folder, dir]),
            local_dir,
        }
    }

    pub fn resolve(&self, collection: Collection, name: &str) -> StorageResult<DocumentLocation> {
        validate_document_name(name).map_err(|e| StorageError::InvalidPath {
            name: name.to_string(),
            reason: e.to_string(),
        })?;

        let parent = self.collection(collection);
        let remote_path = join_remote(&[&parent.remote_dir, name]);
        if remote_path.contains("..") {
            warn!("Path traversal attempt detected: {}", remote_path);
            return Err(StorageError::InvalidPath {
                name: name.to_string(),
                reason: "Path traversal not allowed".to_string(),
            });
        }

        Ok(DocumentLocation {
            collection,
            name: name.to_string(),
            remote_path,
            local_path: parent.local_dir.join(name),
            parent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layout() -> StorageLayout {
        StorageLayout {
            target_folder: "BACKBRAIN5.2_V2".to_string(),
            entries_dir: "01_inbox".to_string(),
            summaries_dir: "summaries".to_string(),
            local_root: PathBuf::from("/srv/backbrain"),
        }
    }

    #[test]
    fn test_resolves_both_backend_forms() {
        let resolver = PathResolver::new(layout());
        let location = resolver.resolve(Collection::Entries, "note1.txt").unwrap();

        assert_eq!(location.remote_path, "BACKBRAIN5.2_V2/01_inbox/note1.txt");
        assert_eq!(location.local_path, PathBuf::from("/srv/backbrain/01_inbox/note1.txt"));
        assert_eq!(location.parent.remote_dir, "BACKBRAIN5.2_V2/01_inbox");
        assert_eq!(location.parent.local_dir, PathBuf::from("/srv/backbrain/01_inbox"));
    }

    #[test]
    fn test_collections_are_disjoint() {
        let resolver = PathResolver::new(layout());
        let entry = resolver.resolve(Collection::Entries, "a.md").unwrap();
        let summary = resolver.resolve(Collection::Summaries, "a.md").unwrap();

        assert_ne!(entry.remote_path, summary.remote_path);
        assert_ne!(entry.local_path, summary.local_path);
        assert_eq!(summary.remote_path, "BACKBRAIN5.2_V2/summaries/a.md");
    }

    #[test]
    fn test_rejects_parent_traversal() {
        let resolver = PathResolver::new(layout());
        for name in ["..", "../secret.txt", "a..b", "..\\x.txt", "notes/../../etc"] {
            let err = resolver.resolve(Collection::Entries, name).unwrap_err();
            assert!(
                matches!(err, StorageError::InvalidPath { .. }),
                "expected InvalidPath for {name:?}, got {err:?}"
            );
        }
    }

    #[test]
    fn test_rejects_nested_and_empty_names() {
        let resolver = PathResolver::new(layout());
        for name in ["", "sub/file.txt", "/abs.txt", "bad\0name"] {
            assert!(resolver.resolve(Collection::Summaries, name).is_err(), "{name:?}");
        }
    }

    #[test]
    fn test_unknown_collection() {
        let resolver = PathResolver::new(layout());
        let err = resolver.resolve_named("drafts", "a.txt").unwrap_err();
        assert!(matches!(err, StorageError::InvalidCollection(ref c) if c == "drafts"));
        assert!(resolver.resolve_named("summaries", "a.txt").is_ok());
    }

    #[test]
    fn test_empty_target_folder_anchors_at_root() {
        let mut layout = layout();
        layout.target_folder = String::new();
        let resolver = PathResolver::new(layout);

        let location = resolver.resolve(Collection::Entries, "x.txt").unwrap();
        assert_eq!(location.remote_path, "01_inbox/x.txt");
    }

    #[test]
    fn test_join_remote_normalises_separators() {
        assert_eq!(join_remote(&["a/", "/b", "c\\d"]), "a/b/c/d");
        assert_eq!(join_remote(&["", "x"]), "x");
    }

    #[test]
    fn test_layout_validation() {
        assert!(layout().validate().is_ok());

        let mut same = layout();
        same.summaries_dir = "01_inbox".to_string();
        assert!(same.validate().is_err());

        let mut escaping = layout();
        escaping.entries_dir = "../inbox".to_string();
        assert!(escaping.validate().is_err());

        let mut empty = layout();
        empty.summaries_dir = "/".to_string();
        assert!(empty.validate().is_err());
    }
}

// WebDAV client used by the remote storage backend

pub mod common;
pub mod config;
pub mod error_classifier;
pub mod service;
pub mod xml;

// Re-export main types for convenience
pub use config::{RetryConfig, WebDAVConfig};
pub use error_classifier::{RemoteFailureKind, WebDAVErrorClassifier};
pub use service::{DirectoryStatus, WebDAVService};
pub use xml::DavEntry;

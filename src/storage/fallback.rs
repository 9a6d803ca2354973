//! Ordered chain of storage backends
//!
//! Each operation is tried against the backends in order. A failure of any
//! backend but the last is logged and the next backend is tried; the last
//! backend's result is returned as-is. Which failures fall through is decided
//! by [`falls_through`].

use anyhow::{anyhow, Result};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

use super::{BackendKind, StorageBackend, StorageError, StorageResult};

/// A value together with the backend that produced it
#[derive(Debug)]
pub struct Served<T> {
    pub value: T,
    pub backend: BackendKind,
}

/// Whether an error from a non-final backend hands the operation to the next one.
///
/// Backend failures always do. A remote "not found" does too, so a document
/// that only exists in the local fallback directory is still found. Input
/// errors never reach a backend and never fall through.
pub fn falls_through(error: &StorageError) -> bool {
    match error {
        StorageError::Backend { .. } | StorageError::NotFound { .. } => true,
        StorageError::InvalidCollection(_) | StorageError::InvalidPath { .. } => false,
    }
}

pub struct FallbackChain {
    backends: Vec<Arc<dyn StorageBackend>>,
}

impl FallbackChain {
    pub fn new(backends: Vec<Arc<dyn StorageBackend>>) -> Result<Self> {
        if backends.is_empty() {
            return Err(anyhow!("A storage chain needs at least one backend"));
        }
        Ok(Self { backends })
    }

    pub fn backends(&self) -> &[Arc<dyn StorageBackend>] {
        &self.backends
    }

    pub async fn run<T, F, Fut>(&self, operation: &str, op: F) -> StorageResult<Served<T>>
    where
        F: Fn(Arc<dyn StorageBackend>) -> Fut,
        Fut: Future<Output = StorageResult<T>>,
    {
        let Some((last, preferred)) = self.backends.split_last() else {
            return Err(StorageError::backend(
                BackendKind::Local,
                anyhow!("No storage backend configured"),
            ));
        };

        for (position, backend) in preferred.iter().enumerate() {
            let next = self.backends[position + 1].storage_type();
            match op(Arc::clone(backend)).await {
                Ok(value) => {
                    return Ok(Served { value, backend: backend.kind() });
                }
                Err(e) if falls_through(&e) => {
                    warn!(
                        "{} {} failed, falling back to {}: {}",
                        backend.storage_type(),
                        operation,
                        next,
                        e
                    );
                }
                Err(e) => return Err(e),
            }
        }

        debug!("Running {} on {} backend", operation, last.storage_type());
        let value = op(Arc::clone(last)).await?;
        Ok(Served { value, backend: last.kind() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{Collection, CollectionLocation, DocumentLocation};
    use async_trait::async_trait;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend that answers every call with a fixed outcome and counts calls
    struct Scripted {
        kind: BackendKind,
        fail_with: Option<fn() -> StorageError>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn ok(kind: BackendKind) -> Arc<Self> {
            Arc::new(Self { kind, fail_with: None, calls: AtomicUsize::new(0) })
        }

        fn failing(kind: BackendKind, fail_with: fn() -> StorageError) -> Arc<Self> {
            Arc::new(Self { kind, fail_with: Some(fail_with), calls: AtomicUsize::new(0) })
        }

        fn outcome(&self) -> StorageResult<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.fail_with {
                Some(f) => Err(f()),
                None => Ok(()),
            }
        }
    }

    #[async_trait]
    impl StorageBackend for Scripted {
        fn kind(&self) -> BackendKind {
            self.kind
        }

        fn storage_type(&self) -> &'static str {
            match self.kind {
                BackendKind::Remote => "scripted-remote",
                BackendKind::Local => "scripted-local",
            }
        }

        async fn write(&self, _location: &DocumentLocation, _data: &[u8]) -> StorageResult<()> {
            self.outcome()
        }

        async fn read(&self, _location: &DocumentLocation) -> StorageResult<Vec<u8>> {
            self.outcome().map(|_| self.storage_type().as_bytes().to_vec())
        }

        async fn list(&self, _location: &CollectionLocation) -> StorageResult<Vec<String>> {
            self.outcome().map(|_| vec![self.storage_type().to_string()])
        }

        async fn initialize(&self) -> anyhow::Result<()> {
            Ok(())
        }
    }

    fn location() -> DocumentLocation {
        let parent = CollectionLocation {
            collection: Collection::Entries,
            remote_dir: "root/01_inbox".to_string(),
            local_dir: PathBuf::from("/tmp/none/01_inbox"),
        };
        DocumentLocation {
            collection: Collection::Entries,
            name: "a.txt".to_string(),
            remote_path: "root/01_inbox/a.txt".to_string(),
            local_path: PathBuf::from("/tmp/none/01_inbox/a.txt"),
            parent,
        }
    }

    fn chain_of(remote: &Arc<Scripted>, local: &Arc<Scripted>) -> FallbackChain {
        let remote: Arc<dyn StorageBackend> = remote.clone();
        let local: Arc<dyn StorageBackend> = local.clone();
        FallbackChain::new(vec![remote, local]).unwrap()
    }

    fn remote_down() -> StorageError {
        StorageError::backend(BackendKind::Remote, anyhow!("connection refused"))
    }

    fn remote_missing() -> StorageError {
        StorageError::NotFound { collection: Collection::Entries, name: "a.txt".to_string() }
    }

    fn local_missing() -> StorageError {
        StorageError::NotFound { collection: Collection::Entries, name: "a.txt".to_string() }
    }

    fn local_denied() -> StorageError {
        StorageError::backend(BackendKind::Local, anyhow!("permission denied"))
    }

    #[test]
    fn test_fall_through_policy() {
        assert!(falls_through(&remote_down()));
        assert!(falls_through(&remote_missing()));
        assert!(!falls_through(&StorageError::InvalidCollection("x".into())));
        assert!(!falls_through(&StorageError::InvalidPath {
            name: "../x".into(),
            reason: "traversal".into()
        }));
    }

    #[test]
    fn test_empty_chain_rejected() {
        assert!(FallbackChain::new(Vec::new()).is_err());
    }

    #[tokio::test]
    async fn test_first_backend_wins_when_healthy() {
        let remote = Scripted::ok(BackendKind::Remote);
        let local = Scripted::ok(BackendKind::Local);
        let chain = chain_of(&remote, &local);
        let location = location();

        let served = chain
            .run("read", |b| {
                let location = &location;
                async move { b.read(location).await }
            })
            .await
            .unwrap();

        assert_eq!(served.backend, BackendKind::Remote);
        assert_eq!(served.value, b"scripted-remote".to_vec());
        assert_eq!(local.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_remote_failure_falls_back_to_local() {
        let remote = Scripted::failing(BackendKind::Remote, remote_down);
        let local = Scripted::ok(BackendKind::Local);
        let chain = chain_of(&remote, &local);
        let location = location();

        let served = chain
            .run("write", |b| {
                let location = &location;
                async move { b.write(location, b"data").await }
            })
            .await
            .unwrap();

        assert_eq!(served.backend, BackendKind::Local);
        assert_eq!(remote.calls.load(Ordering::SeqCst), 1);
        assert_eq!(local.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_remote_not_found_falls_back_and_local_not_found_surfaces() {
        let remote = Scripted::failing(BackendKind::Remote, remote_missing);
        let local = Scripted::failing(BackendKind::Local, local_missing);
        let chain = chain_of(&remote, &local);
        let location = location();

        let err = chain
            .run("read", |b| {
                let location = &location;
                async move { b.read(location).await }
            })
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_last_backend_error_is_surfaced() {
        let remote = Scripted::failing(BackendKind::Remote, remote_down);
        let local = Scripted::failing(BackendKind::Local, local_denied);
        let chain = chain_of(&remote, &local);

        let err = chain
            .run("list", |b| {
                let location = location().parent;
                async move { b.list(&location).await }
            })
            .await
            .unwrap_err();

        match err {
            StorageError::Backend { backend, .. } => assert_eq!(backend, BackendKind::Local),
            other => panic!("expected local backend error, got {other:?}"),
        }
    }
}

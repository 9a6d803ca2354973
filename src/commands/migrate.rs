use tracing::{info, warn};

use crate::storage::{resolver::PathResolver, Collection, StorageBackend, StorageResult};

/// Outcome of copying fallback documents to the preferred backend
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    pub found: usize,
    pub migrated: usize,
    pub failed: Vec<String>,
}

/// Copy every document `source` holds in `collections` to `target`.
///
/// Listing failures of the source abort the run; a document that cannot be
/// read or written is recorded in `failed` and the run continues. With
/// `dry_run` nothing is written.
pub async fn migrate_documents(
    resolver: &PathResolver,
    source: &dyn StorageBackend,
    target: &dyn StorageBackend,
    collections: &[Collection],
    limit: Option<usize>,
    dry_run: bool,
) -> StorageResult<MigrationReport> {
    let mut report = MigrationReport::default();

    for &collection in collections {
        let mut names = source.list(&resolver.collection(collection)).await?;
        names.sort();
        if let Some(limit) = limit {
            names.truncate(limit);
        }
        report.found += names.len();
        info!("📋 Found {} {} on {} storage", names.len(), collection, source.storage_type());

        for name in names {
            let location = resolver.resolve(collection, &name)?;

            if dry_run {
                info!("  - {} ({})", location.remote_path, location.local_path.display());
                continue;
            }

            let copied = match source.read(&location).await {
                Ok(data) => target.write(&location, &data).await,
                Err(e) => Err(e),
            };

            match copied {
                Ok(()) => {
                    report.migrated += 1;
                    info!("✅ Migrated {}", location.remote_path);
                }
                Err(e) => {
                    warn!("❌ Failed to migrate {}: {}", location.remote_path, e);
                    report.failed.push(location.remote_path);
                }
            }
        }
    }

    Ok(report)
}

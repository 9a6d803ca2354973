//! Migration utility to push locally stored fallback documents to WebDAV
//!
//! Usage: cargo run --bin migrate_to_webdav -- [--dry-run] [--collection entries] [--limit N]
//!
//! Documents land on the local backend whenever the WebDAV server was
//! unreachable during a write. Once the server is back, this utility copies
//! them to the same `<target_folder>/<collection_dir>/<name>` location
//! remotely. Local files are left in place.

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use backbrain::{
    commands::migrate::migrate_documents,
    config::Config,
    services::webdav::WebDAVService,
    storage::{
        local::LocalStorageBackend, resolver::PathResolver, webdav::WebDAVStorageBackend,
        Collection,
    },
};

#[derive(Parser)]
#[command(name = "migrate_to_webdav")]
#[command(about = "Copy locally stored fallback documents to the WebDAV server")]
struct Args {
    /// Dry run - only show what would be migrated
    #[arg(short, long)]
    dry_run: bool,

    /// Only migrate one collection (entries or summaries)
    #[arg(short, long)]
    collection: Option<Collection>,

    /// Limit number of documents per collection
    #[arg(short, long)]
    limit: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    info!("🚀 Starting WebDAV migration utility");

    let config = Config::from_env()?;
    let webdav_config = config.webdav_config().ok_or_else(|| {
        anyhow!("WebDAV is not configured. Set WEBDAV_URL, WEBDAV_USERNAME and WEBDAV_PASSWORD.")
    })?;

    info!("☁️  Initializing WebDAV service...");
    let service = WebDAVService::new_with_retry(webdav_config, config.retry_config())?;
    if let Err(e) = service.test_connection().await {
        error!("❌ WebDAV connection failed: {:#}", e);
        return Err(e);
    }
    info!("✅ WebDAV connection successful");

    let resolver = PathResolver::new(config.storage_layout());
    let local = LocalStorageBackend::new(&config.local_root);
    let remote = WebDAVStorageBackend::new(service);

    let collections: Vec<Collection> = match args.collection {
        Some(collection) => vec![collection],
        None => Collection::ALL.to_vec(),
    };

    if args.dry_run {
        info!("🔍 DRY RUN - Would migrate the following files:");
    }

    let report = migrate_documents(
        &resolver,
        &local,
        &remote,
        &collections,
        args.limit,
        args.dry_run,
    )
    .await?;

    if args.dry_run {
        info!("💡 Run without --dry-run to migrate {} documents", report.found);
        return Ok(());
    }

    info!("🎉 Migration completed!");
    info!("✅ Successfully migrated: {} documents", report.migrated);
    if !report.failed.is_empty() {
        error!("❌ Failed to migrate {} documents:", report.failed.len());
        for path in &report.failed {
            error!("  - {}", path);
        }
        return Err(anyhow!("{} documents could not be migrated", report.failed.len()));
    }

    Ok(())
}

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use backbrain::{
    commands::force_summarize::force_summarize,
    config::Config,
    routes,
    services::summarizer::{OpenAISummarizer, Summarizer},
    storage::factory::create_document_store,
    AppState,
};

#[derive(Parser)]
#[command(name = "backbrain")]
#[command(about = "File relay with WebDAV storage, local fallback and optional summaries")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Create the missing summary for every entry, then exit
    ForceSummarize {
        /// Maximum number of entries to consider
        #[arg(short, long, default_value_t = 2000)]
        limit: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;

    let store = Arc::new(create_document_store(&config).await?);
    let summarizer: Arc<dyn Summarizer> = Arc::new(OpenAISummarizer::from_config(&config)?);
    if config.openai_api_key.is_none() {
        warn!("OPENAI_API_KEY is not set, summaries will only contain a placeholder");
    }

    match cli.command.unwrap_or(Command::Serve) {
        Command::ForceSummarize { limit } => {
            let created = force_summarize(&store, summarizer.as_ref(), limit).await?;
            println!("Created {} summaries", created);
            Ok(())
        }
        Command::Serve => {
            serve(AppState {
                config,
                store,
                summarizer,
            })
            .await
        }
    }
}

async fn serve(state: AppState) -> Result<()> {
    info!("Starting backbrain v{}", env!("CARGO_PKG_VERSION"));
    info!("  Remote storage: {}", if state.store.remote_enabled() { "WebDAV" } else { "disabled" });
    info!("  Local root: {}", state.config.local_root);
    info!("  API secret: {}", if state.config.auth_enabled() { "required" } else { "disabled" });
    info!("  Public aliases: {}", state.config.enable_public_alias);
    info!("  Auto-summary on write: {}", state.config.auto_summary_on_write);

    let address = state.config.server_address.clone();
    let app = routes::create_app(Arc::new(state));

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;
    info!("Listening on http://{}", address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        info!("Received Ctrl+C, initiating shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
                info!("Received SIGTERM, initiating shutdown");
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

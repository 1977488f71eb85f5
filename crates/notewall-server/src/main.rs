use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use notewall_application::NoteBoardService;
use notewall_core::auth::SessionGate;
use notewall_infrastructure::{AppConfig, ConfigOverrides, JsonNoteRepository, MemorySessionStore};

mod render;
mod routes;
mod session_cookie;

#[derive(Parser)]
#[command(name = "notewall")]
#[command(about = "Notewall - a single-password shared notes board", long_about = None)]
struct Cli {
    /// TOML config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080
    #[arg(long)]
    bind: Option<String>,

    /// Directory holding notes.json
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig::load(
        cli.config.as_deref(),
        ConfigOverrides {
            data_dir: cli.data_dir,
            bind: cli.bind,
        },
    )
    .context("Refusing to start")?;

    let gate = Arc::new(SessionGate::new(config.password.clone())?);
    let repository = Arc::new(JsonNoteRepository::new(config.paths().notes_file()));
    let sessions = MemorySessionStore::new(config.session_ttl);

    let mut service = NoteBoardService::new(repository, Arc::new(sessions.clone()), gate);
    if config.serialize_mutations {
        tracing::info!("Serializing note mutations in-process");
        service = service.with_serialized_mutations();
    }
    service
        .initialize()
        .await
        .context("Failed to initialize notes store")?;

    spawn_session_sweeper(sessions, config.session_ttl);

    let state = routes::AppState {
        service: Arc::new(service),
        renderer: Arc::new(render::Renderer::new()?),
    };
    let app = routes::router(state);

    tracing::info!(
        "notewall listening on http://{} (data dir {:?})",
        config.bind,
        config.data_dir
    );
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("notewall stopped");
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

/// Periodically drops expired sessions from memory.
fn spawn_session_sweeper(sessions: MemorySessionStore, ttl: Duration) {
    let period = (ttl / 2).max(Duration::from_secs(1));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            let purged = sessions.purge_expired().await;
            if purged > 0 {
                tracing::debug!("Purged {} expired sessions", purged);
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}

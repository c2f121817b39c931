use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use notes_backend_lib::{config::Settings, router, storage::FlatFileStorage, AppState};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Multi-tenant notes REST backend
#[derive(Parser, Debug)]
#[command(name = "notes-server", version, about)]
struct Args {
    /// Configuration file (TOML). Missing files fall back to defaults.
    #[arg(short, long, default_value = notes_backend_lib::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Override the bind address
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Override the data directory
    #[arg(long)]
    data_dir: Option<PathBuf>,
}

fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.log_level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if settings.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut settings = Settings::load_from(&args.config)?;
    if let Some(bind) = args.bind {
        settings.bind_addr = bind;
    }
    if let Some(data_dir) = args.data_dir {
        settings.data_dir = data_dir;
    }

    init_tracing(&settings);
    info!(config = %args.config.display(), ?settings, "configuration loaded");

    let storage = FlatFileStorage::new(&settings.data_dir)?;
    let state = Arc::new(AppState::new(storage, &settings)?);
    let app = router::create_router(state);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    info!(addr = %settings.bind_addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

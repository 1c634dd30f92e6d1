// ============================
// crates/backend-bin/src/main.rs
// ============================
//! Tokio / Axum entry-point: GraphQL endpoint plus push channel.

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use logincount_backend::{config::Settings, AppState};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "logincount-server", about = "Login counter GraphQL and push server")]
struct Args {
    /// TOML configuration file (defaults to ./logincount.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// GraphQL bind address
    #[arg(long)]
    api_addr: Option<SocketAddr>,

    /// Push-channel bind address
    #[arg(long)]
    push_addr: Option<SocketAddr>,

    /// SQLite database file
    #[arg(long)]
    database: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    /// Accept tokens wrapped in double quotes
    #[arg(long)]
    legacy_quoted_tokens: bool,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load_from(path)?,
            None => Settings::load()?,
        };
        if let Some(addr) = self.api_addr {
            settings.api_addr = addr;
        }
        if let Some(addr) = self.push_addr {
            settings.push_addr = addr;
        }
        if let Some(path) = &self.database {
            settings.database_path = path.clone();
        }
        if let Some(level) = &self.log_level {
            settings.log_level = level.clone();
        }
        if self.legacy_quoted_tokens {
            settings.legacy_quoted_tokens = true;
        }
        Ok(settings)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let settings = args.settings().context("failed to load configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_addr = settings.api_addr;
    let push_addr = settings.push_addr;
    let database = settings.database_path.clone();
    let state = AppState::new(settings).context("failed to initialize application state")?;
    info!(database = %database.display(), "credential store opened");

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    let api = state
        .api_router()
        .layer(cors)
        .layer(TraceLayer::new_for_http());
    let push = state.push_router();

    let api_listener = TcpListener::bind(api_addr)
        .await
        .with_context(|| format!("failed to bind GraphQL listener on {api_addr}"))?;
    let push_listener = TcpListener::bind(push_addr)
        .await
        .with_context(|| format!("failed to bind push listener on {push_addr}"))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("shutdown requested");
                let _ = shutdown_tx.send(true);
            },
            Err(e) => {
                warn!("cannot listen for ctrl-c, running until killed: {e}");
                std::future::pending::<()>().await;
            },
        }
    });

    info!("GraphQL server ready at http://{api_addr}/");
    info!("push channel listening on ws://{push_addr}/");

    let api_server = axum::serve(api_listener, api)
        .with_graceful_shutdown(shutdown(shutdown_rx.clone()))
        .into_future();
    let push_server = axum::serve(push_listener, push)
        .with_graceful_shutdown(shutdown(shutdown_rx))
        .into_future();

    tokio::try_join!(api_server, push_server)?;
    info!("server stopped");
    Ok(())
}

async fn shutdown(mut rx: watch::Receiver<bool>) {
    // a dropped sender also ends the wait
    let _ = rx.wait_for(|stop| *stop).await;
}

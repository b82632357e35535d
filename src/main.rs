use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use service_review_api::auth::TokenService;
use service_review_api::config;
use service_review_api::database::DatabaseManager;
use service_review_api::{app, AppState};

#[derive(Debug, Parser)]
#[command(name = "service-review-api", version, about = "Services and reviews REST API")]
struct Args {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT, default 5000)
    #[arg(long, short)]
    port: Option<u16>,
}

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
}

/// Resolves on Ctrl-C or, on unix, SIGTERM. A handler that cannot be
/// installed never resolves so the other one still works.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received Ctrl-C, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, ACCESS_TOKEN_SECRET, etc.
    let _ = dotenvy::dotenv();
    init_logging();

    let args = Args::parse();
    let config = config::config();
    info!("Starting service review API in {:?} mode", config.environment);

    let tokens = TokenService::new(
        &config.security.token_secret,
        config.security.token_expiry_hours,
    )
    .context("invalid token settings (ACCESS_TOKEN_SECRET must be set, TOKEN_EXPIRY_HOURS in range)")?;

    let store = DatabaseManager::connect(&config.database)
        .await
        .context("failed to open document store")?;

    let state = AppState::new(store.clone(), tokens);
    let router = app(state, &config.api);

    let host = args.host.unwrap_or_else(|| config.server.host.clone());
    let port = args.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", host, port))?;

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!(%addr, "App running");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store.close().await;
    Ok(())
}

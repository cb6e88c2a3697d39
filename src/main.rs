use std::sync::Arc;

use clap::Parser;
use spa_fallback::config::{Cli, Config, default_config_path};
use spa_fallback::fallback::SpaFallback;
use spa_fallback::handler;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    tracing::info!("spa-fallback.svc starting");

    let config_path = args
        .config_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(default_config_path);

    let cfg = Config::new(&config_path).unwrap_or_else(|e| {
        tracing::error!(error = %e, path = ?config_path, "failed to load config file");
        std::process::exit(1);
    });

    let fallback = Arc::new(SpaFallback::from_config(&cfg.app));
    if !fallback.index_path().exists() {
        tracing::warn!(index = ?fallback.index_path(), "spa index not found, unmatched routes will return 404");
    }

    let app = handler::app(fallback);

    let address = format!("0.0.0.0:{}", cfg.app.get_port());
    let cancellation_token = CancellationToken::new();

    let listener = tokio::net::TcpListener::bind(&address).await.unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to setup tcp listener");
        std::process::exit(1);
    });

    let shutdown_token = cancellation_token.clone();
    tokio::spawn(async move {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl+c");
            return;
        }
        tracing::info!("ctrl+c signal received, preparing to shutdown");
        shutdown_token.cancel();
    });

    tracing::info!("spa-fallback.svc running on {}", &address);
    let result = axum::serve(listener, app)
        .with_graceful_shutdown(cancellation_token.cancelled_owned())
        .await;

    if let Err(err) = result {
        tracing::error!(error = %err, "server exited with error");
        std::process::exit(1);
    }

    tracing::info!("spa-fallback.svc going off, graceful shutdown complete");
}

pub mod api_contracts;
pub mod auth;
pub mod config;
pub mod credentials;
pub mod drive_client;
pub mod handler;
pub mod logging;
pub mod multipart_form;
pub mod services;
pub mod storage;

#[cfg(test)]
mod test_harness;

use config::ServerConfig;
use handler::AppState;
use multipart_form::FormLimits;
use std::sync::Arc;
use storage::DriveConnector;

/// Build the application router for a configuration
pub fn app(config: &ServerConfig) -> axum::Router {
    let connector = DriveConnector::new(config.drive_upload_base.clone(), config.http_timeout);

    let state = AppState {
        connector: Arc::new(connector),
        limits: FormLimits {
            max_file_size: config.max_file_size,
            temp_dir: config.temp_dir.clone(),
        },
        upload_concurrency: config.upload_concurrency,
    };

    handler::router(state, config.max_request_size)
}

/// Serve the relay until Ctrl-C / SIGTERM
pub async fn run(config: ServerConfig) -> Result<(), String> {
    tokio::fs::create_dir_all(&config.temp_dir)
        .await
        .map_err(|e| format!("Failed to create temp directory {}: {}", config.temp_dir.display(), e))?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| format!("Failed to bind {}: {}", config.bind_addr, e))?;

    tracing::info!(
        max_file_size = config.max_file_size,
        temp_dir = %config.temp_dir.display(),
        concurrency = config.upload_concurrency,
        "Drive upload relay listening on {}",
        config.bind_addr
    );

    axum::serve(listener, app(&config))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {}", e))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
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

    tracing::info!("Shutdown signal received, draining connections");
}

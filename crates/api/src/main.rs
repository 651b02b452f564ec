use std::net::SocketAddr;
use std::sync::Arc;

use formgate_api::config::ServerConfig;
use formgate_api::router::build_app_router;
use formgate_api::state::AppState;
use formgate_core::{FormService, TypeRegistry};
use formgate_notion::NotionClient;
use formgate_storage::S3BlobStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formgate_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        host = %config.host,
        port = %config.port,
        database_id = %config.notion.database_id,
        required = ?config.notion.required_columns,
        "Loaded server configuration"
    );

    // --- Collaborators ---
    let notion = Arc::new(NotionClient::new(config.notion.integration_token.clone()));

    let mut forms = FormService::new(
        Arc::new(TypeRegistry::standard()),
        config.notion.database_id.clone(),
        notion.clone(),
        notion,
    )
    .with_required_columns(config.notion.required_columns.clone());

    match &config.storage {
        Some(storage) => {
            let store = S3BlobStore::connect(storage).await;
            forms = forms.with_blob_store(Arc::new(store));
        }
        None => tracing::info!("R2_BUCKET or R2_BUCKET_URL not set, uploads disabled"),
    }

    // --- Router ---
    let app = build_app_router(AppState::new(config.clone(), forms), &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
    }
}

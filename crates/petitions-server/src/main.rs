use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use petitions_api::{AppState, AppStateInner, create_router};
use petitions_db::Database;

const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "petitions_server=debug,petitions_api=debug,petitions_db=info,tower_http=debug".into()
            }),
        )
        .init();

    // Config
    let host = std::env::var("PETITIONS_HOST").unwrap_or_else(|_| "0.0.0.0".into());
    let port: u16 = std::env::var("PETITIONS_PORT")
        .unwrap_or_else(|_| "4941".into())
        .parse()?;
    let db_path: PathBuf = std::env::var("PETITIONS_DB_PATH")
        .unwrap_or_else(|_| "petitions.db".into())
        .into();
    let image_dir: PathBuf = std::env::var("PETITIONS_STORAGE_DIR")
        .unwrap_or_else(|_| "./storage/images".into())
        .into();
    let max_upload_bytes: usize = std::env::var("PETITIONS_MAX_UPLOAD_BYTES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

    let db = Database::open(&db_path)?;
    tokio::fs::create_dir_all(&image_dir).await?;
    info!("Storing images in {}", image_dir.display());

    let state: AppState = Arc::new(AppStateInner {
        db,
        image_dir,
        max_upload_bytes,
    });

    let app = create_router(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive()),
    );

    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Petitions server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}

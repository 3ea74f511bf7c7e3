use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use common::storage::ObjectStore;
use common::storage::memory::MemoryObjectStore;
use common::storage::s3::S3ObjectStore;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chat_server::config::AppConfig;
use chat_server::database::init_db;
use chat_server::services::directory::NullDirectory;
use chat_server::services::search::select_searcher;
use chat_server::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load().context("Failed to load config")?;

    let db = init_db(&config.database.url, config.database.max_connections)
        .await
        .context("Failed to initialize database")?;
    info!("Database ready");

    let upload_ttl = Duration::from_secs(config.storage.upload_url_ttl_secs);
    let object_store: Arc<dyn ObjectStore> = match &config.storage.s3 {
        Some(settings) => {
            let store = S3ObjectStore::new(settings, upload_ttl)
                .context("Failed to configure object storage")?;
            info!(bucket = %settings.bucket, "Using S3 object storage");
            Arc::new(store)
        }
        None => {
            warn!("No S3 bucket configured, attachments are kept in process memory");
            Arc::new(MemoryObjectStore::new(upload_ttl))
        }
    };

    let searcher = select_searcher(&db).await;

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState {
        db,
        config,
        object_store,
        directory: Arc::new(NullDirectory),
        searcher,
    };
    let app = chat_server::build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("Server running at http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

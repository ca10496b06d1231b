mod candidates;
mod config;
mod db;
mod errors;
mod ingest;
mod llm_client;
mod models;
mod routes;
mod search;
mod state;
mod storage;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::candidates::store::CandidateStore;
use crate::config::{Config, StorageBackend};
use crate::db::{create_pool, migrate};
use crate::ingest::pipeline::Ingestor;
use crate::llm_client::{LlmClient, TextModel};
use crate::routes::build_router;
use crate::search::executor::Searcher;
use crate::state::AppState;
use crate::storage::{FileStore, LocalFileStore, S3FileStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Candidex API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize SQLite and apply the schema
    let pool = create_pool(&config.database_url).await?;
    migrate(&pool).await?;
    let store = CandidateStore::new(pool);

    // Initialize file storage
    let files = build_file_store(&config.storage).await;

    // Initialize LLM client
    let model: Arc<dyn TextModel> = Arc::new(LlmClient::new(
        config.anthropic_api_key.clone(),
        config.llm_timeout,
    )?);
    info!(
        "LLM client initialized (model: {}, timeout: {:?})",
        llm_client::MODEL,
        config.llm_timeout
    );

    let state = AppState {
        ingestor: Ingestor::new(store.clone(), model.clone(), files),
        searcher: Searcher::new(store.clone(), model),
        store,
        max_upload_bytes: config.max_upload_bytes,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once a front-end host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn build_file_store(backend: &StorageBackend) -> Arc<dyn FileStore> {
    match backend {
        StorageBackend::Local { root } => {
            info!("Storing resumes on local disk under {}", root.display());
            Arc::new(LocalFileStore::new(root.clone()))
        }
        StorageBackend::S3 {
            bucket,
            endpoint,
            access_key_id,
            secret_access_key,
        } => {
            let client = build_s3_client(endpoint, access_key_id, secret_access_key).await;
            info!("Storing resumes in S3 bucket {bucket}");
            Arc::new(S3FileStore::new(client, bucket.clone()))
        }
    }
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(
    endpoint: &str,
    access_key_id: &str,
    secret_access_key: &str,
) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        access_key_id,
        secret_access_key,
        None,
        None,
        "candidex-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use qrstory_mongo::{GridFsBlobStore, MongoClient, MongoStoryStore};
use qrstory_server::{router, AppState, ServerConfig};
use qrstory_service::{StoryService, StoryServiceConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = ServerConfig::from_env();

    let mongo_uri = config
        .mongo_uri
        .as_deref()
        .context("MONGO_URI missing. Set it in environment variables.")?;

    let client = MongoClient::connect(mongo_uri, &config.db_name)
        .await
        .context("failed to connect to MongoDB")?;

    let blobs = GridFsBlobStore::new(&client, &config.bucket_name);
    let stories = MongoStoryStore::new(&client, &config.collection_name)
        .await
        .context("failed to prepare story collection")?;

    let service = StoryService::with_config(
        blobs,
        stories,
        StoryServiceConfig::default()
            .with_id_prefix(config.id_prefix.clone())
            .with_id_length(config.id_length)
            .with_max_blob_bytes(config.max_blob_bytes),
    );

    let state = AppState::new(service, config.reveal_page.clone());

    let app = router(state)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http());

    let addr = config.listen_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    info!(%addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() || allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

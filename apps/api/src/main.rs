mod applications;
mod config;
mod db;
mod embedding;
mod errors;
mod interviews;
mod jobs;
mod llm_client;
mod models;
mod recommend;
mod routes;
mod state;
mod users;
mod vector_store;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::embedding::{
    EmbeddingProvider, FallbackEmbedder, HuggingFaceEmbedder, OpenAiEmbedder, HF_EMBED_MODEL,
    OPENAI_EMBED_MODEL,
};
use crate::llm_client::LlmClient;
use crate::recommend::blender::Recommender;
use crate::recommend::scorer::LlmRelevanceScorer;
use crate::routes::build_router;
use crate::state::AppState;
use crate::vector_store::{ChromaIndex, VectorIndex, JOBS_COLLECTION, PROFILES_COLLECTION};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
            EnvFilter::new(format!("{}={}", crate_target, &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobGrid API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;

    // Initialize LLM client
    let llm = LlmClient::new(config.anthropic_api_key.clone());
    info!(
        "LLM client initialized (model: {}, fallback: {})",
        llm_client::MODEL,
        llm_client::FALLBACK_MODEL
    );

    // Embedding chain: OpenAI primary, HuggingFace per-call fallback
    let primary = Arc::new(OpenAiEmbedder::new(
        config.openai_api_key.clone(),
        config.openai_base_url.clone(),
    ));
    let secondary = Arc::new(HuggingFaceEmbedder::new(
        config.hf_api_key.clone(),
        config.hf_base_url.clone(),
    ));
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(FallbackEmbedder::new(primary, secondary));
    info!(
        "Embedding providers initialized (primary: {}, fallback: {})",
        OPENAI_EMBED_MODEL, HF_EMBED_MODEL
    );

    // Vector store collections (created lazily on first use)
    let jobs_index: Arc<dyn VectorIndex> = Arc::new(ChromaIndex::new(
        config.chroma_url.clone(),
        JOBS_COLLECTION,
    ));
    let profiles_index: Arc<dyn VectorIndex> = Arc::new(ChromaIndex::new(
        config.chroma_url.clone(),
        PROFILES_COLLECTION,
    ));
    info!("Vector store client initialized ({})", config.chroma_url);

    // Recommendation orchestrator
    let scorer = Arc::new(LlmRelevanceScorer::new(llm.clone()));
    let recommender = Arc::new(Recommender::new(
        embedder.clone(),
        jobs_index.clone(),
        scorer,
    ));

    // Build app state
    let state = AppState {
        db,
        config: config.clone(),
        embedder,
        jobs_index,
        profiles_index,
        recommender,
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

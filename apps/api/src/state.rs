use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::recommend::blender::Recommender;
use crate::vector_store::VectorIndex;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    /// Full config kept for handler-level tuning knobs.
    #[allow(dead_code)]
    pub config: Config,
    /// Embedding provider chain (primary with per-call fallback).
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub jobs_index: Arc<dyn VectorIndex>,
    pub profiles_index: Arc<dyn VectorIndex>,
    /// Dependency-injected recommendation orchestrator.
    pub recommender: Arc<Recommender>,
}

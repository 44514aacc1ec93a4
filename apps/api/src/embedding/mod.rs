//! Embedding clients — convert free text into fixed-length vectors.
//!
//! Two concrete providers (OpenAI primary, HuggingFace Inference secondary)
//! behind the `EmbeddingProvider` trait, plus a `FallbackEmbedder` decorator
//! that retries a failed call once against the secondary. Every returned
//! `Embedding` is tagged with the provider that produced it so the vector
//! index can refuse to mix incompatible vector spaces (the two providers
//! produce 1536-dim and 384-dim vectors respectively).

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const OPENAI_EMBED_MODEL: &str = "text-embedding-3-small";
pub const OPENAI_EMBED_DIMENSION: usize = 1536;

pub const HF_EMBED_MODEL: &str = "sentence-transformers/all-MiniLM-L6-v2";
pub const HF_EMBED_DIMENSION: usize = 384;

const EMBED_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed embedding response: {0}")]
    MalformedResponse(String),
}

/// A provider-tagged embedding vector.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    /// Name of the provider that produced the vector. Vectors from different
    /// providers live in different spaces and must never be compared.
    pub provider: String,
    pub vector: Vec<f32>,
}

impl Embedding {
    pub fn new(provider: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            provider: provider.into(),
            vector,
        }
    }

    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}

/// Strategy interface over remote embedding APIs.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn dimension(&self) -> usize;
    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError>;
}

// ────────────────────────────────────────────────────────────────────────────
// OpenAI embeddings (primary)
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingResponse {
    data: Vec<OpenAiEmbeddingRecord>,
}

#[derive(Debug, Deserialize)]
struct OpenAiEmbeddingRecord {
    embedding: Vec<f32>,
}

/// OpenAI embeddings API client (`POST {base_url}/embeddings`).
pub struct OpenAiEmbedder {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAiEmbedder {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn dimension(&self) -> usize {
        OPENAI_EMBED_DIMENSION
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&json!({
                "model": OPENAI_EMBED_MODEL,
                "input": [text],
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        let parsed: OpenAiEmbeddingResponse = response.json().await?;
        let record = parsed.data.into_iter().next().ok_or_else(|| {
            EmbeddingError::MalformedResponse("empty data array".to_string())
        })?;

        debug!(
            "OpenAI embedding: model={}, dim={}",
            OPENAI_EMBED_MODEL,
            record.embedding.len()
        );

        Ok(Embedding::new(self.name(), record.embedding))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// HuggingFace Inference embeddings (secondary)
// ────────────────────────────────────────────────────────────────────────────

/// HuggingFace feature-extraction client
/// (`POST {base_url}/{model}` with `{"inputs": [text]}`).
pub struct HuggingFaceEmbedder {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl HuggingFaceEmbedder {
    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(EMBED_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            base_url,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for HuggingFaceEmbedder {
    fn name(&self) -> &'static str {
        "huggingface"
    }

    fn dimension(&self) -> usize {
        HF_EMBED_DIMENSION
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), HF_EMBED_MODEL);
        let mut request = self.client.post(&url).json(&json!({ "inputs": [text] }));
        if let Some(key) = &self.api_key {
            request = request.header("Authorization", format!("Bearer {key}"));
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        // The inference API returns [[f32]] for batched input and [f32] for
        // single-string input. Accept both.
        let value: serde_json::Value = response.json().await?;
        let vector = parse_hf_vector(&value).ok_or_else(|| {
            EmbeddingError::MalformedResponse(format!("unexpected shape: {value}"))
        })?;

        debug!("HuggingFace embedding: model={}, dim={}", HF_EMBED_MODEL, vector.len());

        Ok(Embedding::new(self.name(), vector))
    }
}

fn parse_hf_vector(value: &serde_json::Value) -> Option<Vec<f32>> {
    let outer = value.as_array()?;
    let first = outer.first()?;
    let flat = match first {
        serde_json::Value::Array(inner) => inner,
        serde_json::Value::Number(_) => outer,
        _ => return None,
    };
    flat.iter()
        .map(|v| v.as_f64().map(|f| f as f32))
        .collect::<Option<Vec<f32>>>()
}

// ────────────────────────────────────────────────────────────────────────────
// Fallback decorator
// ────────────────────────────────────────────────────────────────────────────

/// Tries the primary provider; on any error, retries the same call once
/// against the secondary. The switch is per-call, never sticky.
///
/// The returned `Embedding` keeps the concrete provider's tag, so a
/// secondary-provider vector queried against a primary-provider collection is
/// rejected by the index rather than silently compared.
pub struct FallbackEmbedder {
    primary: Arc<dyn EmbeddingProvider>,
    secondary: Arc<dyn EmbeddingProvider>,
}

impl FallbackEmbedder {
    pub fn new(primary: Arc<dyn EmbeddingProvider>, secondary: Arc<dyn EmbeddingProvider>) -> Self {
        Self { primary, secondary }
    }
}

#[async_trait]
impl EmbeddingProvider for FallbackEmbedder {
    fn name(&self) -> &'static str {
        self.primary.name()
    }

    fn dimension(&self) -> usize {
        self.primary.dimension()
    }

    async fn embed(&self, text: &str) -> Result<Embedding, EmbeddingError> {
        match self.primary.embed(text).await {
            Ok(embedding) => Ok(embedding),
            Err(e) => {
                warn!(
                    "Embedding provider {} failed ({e}), trying {}",
                    self.primary.name(),
                    self.secondary.name()
                );
                self.secondary.embed(text).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedEmbedder {
        name: &'static str,
        dim: usize,
        fail: bool,
    }

    #[async_trait]
    impl EmbeddingProvider for FixedEmbedder {
        fn name(&self) -> &'static str {
            self.name
        }

        fn dimension(&self) -> usize {
            self.dim
        }

        async fn embed(&self, _text: &str) -> Result<Embedding, EmbeddingError> {
            if self.fail {
                return Err(EmbeddingError::Api {
                    status: 503,
                    message: "unavailable".to_string(),
                });
            }
            Ok(Embedding::new(self.name, vec![0.5; self.dim]))
        }
    }

    #[tokio::test]
    async fn test_fallback_uses_primary_when_healthy() {
        let embedder = FallbackEmbedder::new(
            Arc::new(FixedEmbedder {
                name: "openai",
                dim: 1536,
                fail: false,
            }),
            Arc::new(FixedEmbedder {
                name: "huggingface",
                dim: 384,
                fail: false,
            }),
        );

        let embedding = embedder.embed("Python backend developer").await.unwrap();
        assert_eq!(embedding.provider, "openai");
        assert_eq!(embedding.dimension(), 1536);
    }

    #[tokio::test]
    async fn test_fallback_switches_to_secondary_on_error() {
        let embedder = FallbackEmbedder::new(
            Arc::new(FixedEmbedder {
                name: "openai",
                dim: 1536,
                fail: true,
            }),
            Arc::new(FixedEmbedder {
                name: "huggingface",
                dim: 384,
                fail: false,
            }),
        );

        let embedding = embedder.embed("Python backend developer").await.unwrap();
        // The tag must reflect the provider that actually produced the vector.
        assert_eq!(embedding.provider, "huggingface");
        assert_eq!(embedding.dimension(), 384);
    }

    #[tokio::test]
    async fn test_fallback_surfaces_error_when_both_fail() {
        let embedder = FallbackEmbedder::new(
            Arc::new(FixedEmbedder {
                name: "openai",
                dim: 1536,
                fail: true,
            }),
            Arc::new(FixedEmbedder {
                name: "huggingface",
                dim: 384,
                fail: true,
            }),
        );

        assert!(embedder.embed("anything").await.is_err());
    }

    #[test]
    fn test_parse_hf_vector_batched_shape() {
        let value = serde_json::json!([[0.1, 0.2, 0.3]]);
        assert_eq!(parse_hf_vector(&value), Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_parse_hf_vector_flat_shape() {
        let value = serde_json::json!([0.1, 0.2, 0.3]);
        assert_eq!(parse_hf_vector(&value), Some(vec![0.1, 0.2, 0.3]));
    }

    #[test]
    fn test_parse_hf_vector_rejects_strings() {
        let value = serde_json::json!(["not", "numbers"]);
        assert_eq!(parse_hf_vector(&value), None);
    }

    #[test]
    fn test_provider_dimensions_are_incompatible() {
        assert_ne!(OPENAI_EMBED_DIMENSION, HF_EMBED_DIMENSION);
    }
}

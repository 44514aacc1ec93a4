//! Vector store client — nearest-neighbor search over job and profile
//! embeddings via ChromaDB's REST API.
//!
//! The `VectorIndex` trait is the seam the recommendation blender depends on;
//! `ChromaIndex` is the production implementation, one instance per
//! collection. Each index guards its vector space: once a collection has seen
//! vectors from one embedding provider, writes and queries carrying a
//! different provider or dimension are rejected instead of being silently
//! compared.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::sync::RwLock;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::embedding::Embedding;

const CHROMA_TIMEOUT_SECS: u64 = 30;

pub const JOBS_COLLECTION: &str = "jobs";
pub const PROFILES_COLLECTION: &str = "profiles";

#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error(
        "Vector space mismatch in collection '{collection}': \
         index holds {expected_provider} ({expected_dim}-dim), \
         got {got_provider} ({got_dim}-dim)"
    )]
    SpaceMismatch {
        collection: String,
        expected_provider: String,
        expected_dim: usize,
        got_provider: String,
        got_dim: usize,
    },
}

/// One nearest-neighbor result.
#[derive(Debug, Clone)]
pub struct VectorHit {
    pub id: Uuid,
    /// Raw cosine distance as reported by the store, in [0, 2].
    pub distance: f32,
    /// Distance normalized to a [0, 1] similarity.
    pub similarity: f32,
}

/// Maps a cosine distance in [0, 2] onto a [0, 1] similarity score.
pub fn similarity_from_cosine_distance(distance: f32) -> f32 {
    (1.0 - distance / 2.0).clamp(0.0, 1.0)
}

/// Seam between the blender and the vector database.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    fn collection(&self) -> &str;

    /// Writes the vector under `id`, replacing any previous vector for it.
    async fn upsert(
        &self,
        id: Uuid,
        embedding: &Embedding,
        document: &str,
    ) -> Result<(), VectorStoreError>;

    async fn query(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<VectorHit>, VectorStoreError>;

    async fn delete(&self, id: Uuid) -> Result<(), VectorStoreError>;
}

// ────────────────────────────────────────────────────────────────────────────
// Vector space guard
// ────────────────────────────────────────────────────────────────────────────

/// Records the provider/dimension of the first vector a collection sees and
/// rejects everything that does not match. `ChromaIndex` seeds the
/// fingerprint from the collection's stored vectors on first contact, so the
/// guard survives process restarts.
#[derive(Debug, Default)]
pub struct SpaceGuard {
    fingerprint: RwLock<Option<(String, usize)>>,
}

impl SpaceGuard {
    pub fn check(&self, collection: &str, embedding: &Embedding) -> Result<(), VectorStoreError> {
        {
            let guard = self.fingerprint.read().expect("space guard poisoned");
            if let Some((provider, dim)) = guard.as_ref() {
                if provider != &embedding.provider || *dim != embedding.dimension() {
                    return Err(VectorStoreError::SpaceMismatch {
                        collection: collection.to_string(),
                        expected_provider: provider.clone(),
                        expected_dim: *dim,
                        got_provider: embedding.provider.clone(),
                        got_dim: embedding.dimension(),
                    });
                }
                return Ok(());
            }
        }

        let mut guard = self.fingerprint.write().expect("space guard poisoned");
        // Another request may have set it between the locks; re-check.
        match guard.as_ref() {
            Some((provider, dim))
                if provider != &embedding.provider || *dim != embedding.dimension() =>
            {
                Err(VectorStoreError::SpaceMismatch {
                    collection: collection.to_string(),
                    expected_provider: provider.clone(),
                    expected_dim: *dim,
                    got_provider: embedding.provider.clone(),
                    got_dim: embedding.dimension(),
                })
            }
            Some(_) => Ok(()),
            None => {
                *guard = Some((embedding.provider.clone(), embedding.dimension()));
                Ok(())
            }
        }
    }

    /// Adopts a fingerprint recovered from the store. No-op once one is set.
    pub fn seed(&self, provider: &str, dim: usize) {
        let mut guard = self.fingerprint.write().expect("space guard poisoned");
        if guard.is_none() {
            *guard = Some((provider.to_string(), dim));
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ChromaDB client
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct ChromaCollection {
    id: String,
}

/// ChromaDB REST client bound to a single named collection.
/// The collection is created lazily (get-or-create, cosine space) on first use.
pub struct ChromaIndex {
    client: Client,
    base_url: String,
    name: String,
    collection_id: OnceCell<String>,
    space: SpaceGuard,
}

impl ChromaIndex {
    pub fn new(base_url: String, name: impl Into<String>) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(CHROMA_TIMEOUT_SECS))
                .build()
                .expect("Failed to build HTTP client"),
            base_url,
            name: name.into(),
            collection_id: OnceCell::new(),
            space: SpaceGuard::default(),
        }
    }

    async fn collection_id(&self) -> Result<&str, VectorStoreError> {
        let id = self
            .collection_id
            .get_or_try_init(|| async {
                let url = format!("{}/api/v1/collections", self.base_url.trim_end_matches('/'));
                let response = self
                    .client
                    .post(&url)
                    .json(&json!({
                        "name": self.name,
                        "get_or_create": true,
                        "metadata": { "hnsw:space": "cosine" },
                    }))
                    .send()
                    .await?;

                let status = response.status();
                if !status.is_success() {
                    let body = response.text().await.unwrap_or_default();
                    return Err(VectorStoreError::Api {
                        status: status.as_u16(),
                        message: body,
                    });
                }

                let collection: ChromaCollection = response.json().await?;
                info!("Chroma collection '{}' resolved: {}", self.name, collection.id);

                if let Some((provider, dim)) = self.peek_stored_space(&collection.id).await {
                    debug!(
                        "Collection '{}' already holds {provider} ({dim}-dim) vectors",
                        self.name
                    );
                    self.space.seed(&provider, dim);
                }

                Ok(collection.id)
            })
            .await?;
        Ok(id.as_str())
    }

    async fn post(
        &self,
        action: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, VectorStoreError> {
        let collection_id = self.collection_id().await?;
        let url = format!(
            "{}/api/v1/collections/{}/{}",
            self.base_url.trim_end_matches('/'),
            collection_id,
            action
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VectorStoreError::Api {
                status: status.as_u16(),
                message: body,
            });
        }

        response.json().await.map_err(VectorStoreError::Http)
    }

    /// Fetches one stored item so the space guard can adopt the provider and
    /// dimension the collection was built with. Best-effort: an empty
    /// collection or a failed read leaves the guard unseeded.
    async fn peek_stored_space(&self, collection_id: &str) -> Option<(String, usize)> {
        let url = format!(
            "{}/api/v1/collections/{}/get",
            self.base_url.trim_end_matches('/'),
            collection_id
        );
        let body = json!({ "limit": 1, "include": ["embeddings", "metadatas"] });

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(r) if r.status().is_success() => r,
            Ok(r) => {
                warn!(
                    "Could not inspect collection '{}' (status {})",
                    self.name,
                    r.status()
                );
                return None;
            }
            Err(e) => {
                warn!("Could not inspect collection '{}' ({e})", self.name);
                return None;
            }
        };

        let value: serde_json::Value = response.json().await.ok()?;
        stored_space_fingerprint(&value)
    }
}

#[async_trait]
impl VectorIndex for ChromaIndex {
    fn collection(&self) -> &str {
        &self.name
    }

    async fn upsert(
        &self,
        id: Uuid,
        embedding: &Embedding,
        document: &str,
    ) -> Result<(), VectorStoreError> {
        self.space.check(&self.name, embedding)?;

        self.post(
            "upsert",
            json!({
                "ids": [id.to_string()],
                "embeddings": [&embedding.vector],
                "documents": [document],
                "metadatas": [{ "provider": embedding.provider }],
            }),
        )
        .await?;

        debug!("Upserted {} into '{}'", id, self.name);
        Ok(())
    }

    async fn query(
        &self,
        embedding: &Embedding,
        top_k: usize,
    ) -> Result<Vec<VectorHit>, VectorStoreError> {
        self.space.check(&self.name, embedding)?;

        let value = self
            .post(
                "query",
                json!({
                    "query_embeddings": [&embedding.vector],
                    "n_results": top_k,
                    "include": ["distances"],
                }),
            )
            .await?;

        let hits = parse_query_response(&value)?;
        if let Some(best) = hits.first() {
            debug!(
                "Query against '{}': {} hits, nearest {} (distance {:.3})",
                self.name,
                hits.len(),
                best.id,
                best.distance
            );
        }
        Ok(hits)
    }

    async fn delete(&self, id: Uuid) -> Result<(), VectorStoreError> {
        self.post("delete", json!({ "ids": [id.to_string()] }))
            .await?;
        debug!("Deleted {} from '{}'", id, self.name);
        Ok(())
    }
}

/// Reads the provider metadata and vector dimension from a `/get` response
/// holding at least one item. Unlike `/query`, `/get` responses are flat:
/// one metadata object and one embedding vector per stored item.
fn stored_space_fingerprint(value: &serde_json::Value) -> Option<(String, usize)> {
    let provider = value
        .get("metadatas")?
        .as_array()?
        .first()?
        .get("provider")?
        .as_str()?
        .to_string();
    let dim = value
        .get("embeddings")?
        .as_array()?
        .first()?
        .as_array()?
        .len();
    Some((provider, dim))
}

/// Parses Chroma's query response shape: ids and distances are nested one
/// level per query embedding; we always send exactly one.
fn parse_query_response(value: &serde_json::Value) -> Result<Vec<VectorHit>, VectorStoreError> {
    let malformed = |what: &str| VectorStoreError::MalformedResponse(what.to_string());

    let ids = value
        .get("ids")
        .and_then(|v| v.as_array())
        .and_then(|v| v.first())
        .and_then(|v| v.as_array())
        .ok_or_else(|| malformed("missing ids"))?;

    let distances = value
        .get("distances")
        .and_then(|v| v.as_array())
        .and_then(|v| v.first())
        .and_then(|v| v.as_array())
        .ok_or_else(|| malformed("missing distances"))?;

    if ids.len() != distances.len() {
        return Err(malformed("ids/distances length mismatch"));
    }

    let mut hits = Vec::with_capacity(ids.len());
    for (id, distance) in ids.iter().zip(distances) {
        let id = id
            .as_str()
            .and_then(|s| Uuid::parse_str(s).ok())
            .ok_or_else(|| malformed("non-uuid id"))?;
        let distance = distance.as_f64().ok_or_else(|| malformed("non-numeric distance"))? as f32;
        hits.push(VectorHit {
            id,
            distance,
            similarity: similarity_from_cosine_distance(distance),
        });
    }

    Ok(hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_similarity_normalization_endpoints() {
        assert_eq!(similarity_from_cosine_distance(0.0), 1.0);
        assert_eq!(similarity_from_cosine_distance(1.0), 0.5);
        assert_eq!(similarity_from_cosine_distance(2.0), 0.0);
    }

    #[test]
    fn test_similarity_clamped_for_out_of_range_distances() {
        assert_eq!(similarity_from_cosine_distance(-0.5), 1.0);
        assert_eq!(similarity_from_cosine_distance(3.0), 0.0);
    }

    #[test]
    fn test_space_guard_accepts_consistent_provider() {
        let guard = SpaceGuard::default();
        let a = Embedding::new("openai", vec![0.0; 1536]);
        let b = Embedding::new("openai", vec![1.0; 1536]);

        assert!(guard.check("jobs", &a).is_ok());
        assert!(guard.check("jobs", &b).is_ok());
    }

    #[test]
    fn test_space_guard_rejects_cross_provider_mixing() {
        let guard = SpaceGuard::default();
        let primary = Embedding::new("openai", vec![0.0; 1536]);
        let secondary = Embedding::new("huggingface", vec![0.0; 384]);

        guard.check("jobs", &primary).unwrap();
        let err = guard.check("jobs", &secondary).unwrap_err();
        assert!(matches!(err, VectorStoreError::SpaceMismatch { .. }));
    }

    #[test]
    fn test_space_guard_rejects_same_provider_wrong_dimension() {
        let guard = SpaceGuard::default();
        guard
            .check("jobs", &Embedding::new("openai", vec![0.0; 1536]))
            .unwrap();
        let err = guard
            .check("jobs", &Embedding::new("openai", vec![0.0; 384]))
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::SpaceMismatch { .. }));
    }

    #[test]
    fn test_space_guard_seed_enforces_stored_fingerprint() {
        // A guard seeded from the store must reject the other provider even
        // though this process has never written a vector.
        let guard = SpaceGuard::default();
        guard.seed("openai", 1536);

        let err = guard
            .check("jobs", &Embedding::new("huggingface", vec![0.0; 384]))
            .unwrap_err();
        assert!(matches!(err, VectorStoreError::SpaceMismatch { .. }));
        assert!(guard
            .check("jobs", &Embedding::new("openai", vec![0.0; 1536]))
            .is_ok());
    }

    #[test]
    fn test_space_guard_seed_does_not_overwrite() {
        let guard = SpaceGuard::default();
        guard
            .check("jobs", &Embedding::new("openai", vec![0.0; 1536]))
            .unwrap();
        guard.seed("huggingface", 384);

        assert!(guard
            .check("jobs", &Embedding::new("openai", vec![0.0; 1536]))
            .is_ok());
    }

    #[test]
    fn test_stored_space_fingerprint_from_get_response() {
        let value = serde_json::json!({
            "ids": [Uuid::new_v4().to_string()],
            "embeddings": [[0.1, 0.2, 0.3, 0.4]],
            "metadatas": [{ "provider": "openai" }],
        });
        assert_eq!(
            stored_space_fingerprint(&value),
            Some(("openai".to_string(), 4))
        );
    }

    #[test]
    fn test_stored_space_fingerprint_empty_collection_is_none() {
        let value = serde_json::json!({ "ids": [], "embeddings": [], "metadatas": [] });
        assert_eq!(stored_space_fingerprint(&value), None);
    }

    #[test]
    fn test_parse_query_response_happy_path() {
        let id_a = Uuid::new_v4();
        let id_b = Uuid::new_v4();
        let value = serde_json::json!({
            "ids": [[id_a.to_string(), id_b.to_string()]],
            "distances": [[0.2, 0.8]],
        });

        let hits = parse_query_response(&value).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, id_a);
        assert!((hits[0].similarity - 0.9).abs() < 1e-6);
        assert!((hits[1].similarity - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_parse_query_response_rejects_length_mismatch() {
        let value = serde_json::json!({
            "ids": [[Uuid::new_v4().to_string()]],
            "distances": [[0.2, 0.8]],
        });
        assert!(parse_query_response(&value).is_err());
    }

    #[test]
    fn test_parse_query_response_rejects_missing_distances() {
        let value = serde_json::json!({ "ids": [[]] });
        assert!(parse_query_response(&value).is_err());
    }
}

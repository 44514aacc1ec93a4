//! Recommendation blender — produces a ranked list of job matches for a
//! seeker profile.
//!
//! Happy path: embed the profile, query the jobs vector index for the top-K
//! candidates, re-score the top 5 with the LLM, blend vector and LLM scores
//! 70/30, stable-sort descending, return the top N. Any failure on the
//! embed/query leg degrades the whole request to keyword matching; a scorer
//! failure degrades only that job to its vector score. The endpoint always
//! returns some ranking.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::errors::AppError;
use crate::models::job::JobRow;
use crate::models::user::UserRow;
use crate::recommend::keyword::keyword_overlap_score;
use crate::recommend::profile::{job_text, profile_text};
use crate::recommend::scorer::RelevanceScorer;
use crate::vector_store::{VectorHit, VectorIndex};

pub const VECTOR_WEIGHT: f64 = 0.7;
pub const LLM_WEIGHT: f64 = 0.3;
/// Only this many of the top vector hits are sent to the LLM for re-scoring.
pub const LLM_RESCORE_DEPTH: usize = 5;
pub const DEFAULT_LIMIT: usize = 10;
/// Query at least this many vector candidates regardless of the request limit.
const MIN_CANDIDATES: usize = 10;

/// A single ranked result. Never persisted.
#[derive(Debug, Clone, Serialize)]
pub struct JobMatch {
    pub job: JobRow,
    /// Blended score in [0, 1]; the list is sorted descending on this.
    pub match_score: f64,
    pub reasons: Vec<String>,
    /// "blended" | "vector" | "keyword" — which path produced the score.
    pub scoring_path: String,
}

/// Dependency-injected recommendation orchestrator.
/// Holds the embedding, vector-index, and scorer seams so every leg can be
/// swapped in tests.
pub struct Recommender {
    embedder: Arc<dyn EmbeddingProvider>,
    jobs_index: Arc<dyn VectorIndex>,
    scorer: Arc<dyn RelevanceScorer>,
}

impl Recommender {
    pub fn new(
        embedder: Arc<dyn EmbeddingProvider>,
        jobs_index: Arc<dyn VectorIndex>,
        scorer: Arc<dyn RelevanceScorer>,
    ) -> Self {
        Self {
            embedder,
            jobs_index,
            scorer,
        }
    }

    /// Returns the top `limit` job matches for `user`, best first.
    pub async fn recommend(
        &self,
        pool: &PgPool,
        user: &UserRow,
        limit: usize,
    ) -> Result<Vec<JobMatch>, AppError> {
        let profile = profile_text(user);

        let hits = match self.vector_candidates(&profile, limit).await {
            Ok(hits) if !hits.is_empty() => hits,
            Ok(_) => {
                warn!("Vector index returned no candidates, using keyword fallback");
                return keyword_fallback(pool, user, limit).await;
            }
            Err(e) => {
                warn!("Vector path unavailable ({e}), using keyword fallback");
                return keyword_fallback(pool, user, limit).await;
            }
        };

        let candidates = load_jobs_in_rank_order(pool, &hits).await?;
        if candidates.is_empty() {
            // Every hit was stale (job deleted or closed since indexing).
            warn!("All vector candidates were stale, using keyword fallback");
            return keyword_fallback(pool, user, limit).await;
        }

        let mut matches = self.rescore_and_blend(&profile, candidates).await;
        rank(&mut matches);
        matches.truncate(limit);
        Ok(matches)
    }

    async fn vector_candidates(
        &self,
        profile: &str,
        limit: usize,
    ) -> Result<Vec<VectorHit>, AppError> {
        let embedding = self
            .embedder
            .embed(profile)
            .await
            .map_err(|e| AppError::Embedding(e.to_string()))?;

        let top_k = limit.max(MIN_CANDIDATES);
        self.jobs_index
            .query(&embedding, top_k)
            .await
            .map_err(|e| AppError::VectorStore(e.to_string()))
    }

    /// LLM-scores the first `LLM_RESCORE_DEPTH` candidates and blends; the
    /// rest keep their vector score alone. Input order is vector rank.
    pub(crate) async fn rescore_and_blend(
        &self,
        profile: &str,
        candidates: Vec<(JobRow, f64)>,
    ) -> Vec<JobMatch> {
        let mut matches = Vec::with_capacity(candidates.len());

        for (rank, (job, similarity)) in candidates.into_iter().enumerate() {
            if rank < LLM_RESCORE_DEPTH {
                match self.scorer.score(&job_text(&job), profile).await {
                    Ok(judgment) => {
                        debug!(
                            "Job {} blended: vector={similarity:.3}, llm={}",
                            job.id, judgment.score
                        );
                        matches.push(JobMatch {
                            match_score: blend(similarity, judgment.score),
                            reasons: judgment.reasons,
                            scoring_path: "blended".to_string(),
                            job,
                        });
                        continue;
                    }
                    Err(e) => {
                        warn!("LLM scoring failed for job {} ({e}), keeping vector score", job.id);
                    }
                }
            }

            matches.push(JobMatch {
                match_score: similarity,
                reasons: Vec::new(),
                scoring_path: "vector".to_string(),
                job,
            });
        }

        matches
    }
}

/// blended = 0.7 × vector similarity + 0.3 × (llm score / 100).
pub fn blend(similarity: f64, llm_score: u32) -> f64 {
    VECTOR_WEIGHT * similarity + LLM_WEIGHT * (llm_score as f64 / 100.0)
}

/// Stable descending sort by match score; ties keep their incoming
/// (vector-rank) order.
pub fn rank(matches: &mut [JobMatch]) {
    matches.sort_by(|a, b| {
        b.match_score
            .partial_cmp(&a.match_score)
            .unwrap_or(Ordering::Equal)
    });
}

/// Fetches the still-open job rows for a set of vector hits, preserving the
/// hits' rank order and dropping stale ids the index still remembers.
async fn load_jobs_in_rank_order(
    pool: &PgPool,
    hits: &[VectorHit],
) -> Result<Vec<(JobRow, f64)>, AppError> {
    let ids: Vec<Uuid> = hits.iter().map(|h| h.id).collect();

    let rows: Vec<JobRow> =
        sqlx::query_as("SELECT * FROM jobs WHERE id = ANY($1) AND status = 'open'")
            .bind(&ids)
            .fetch_all(pool)
            .await?;

    let mut by_id: HashMap<Uuid, JobRow> = rows.into_iter().map(|j| (j.id, j)).collect();

    Ok(hits
        .iter()
        .filter_map(|hit| by_id.remove(&hit.id).map(|job| (job, hit.similarity as f64)))
        .collect())
}

/// Full keyword fallback: rank every open job by skill overlap.
async fn keyword_fallback(
    pool: &PgPool,
    user: &UserRow,
    limit: usize,
) -> Result<Vec<JobMatch>, AppError> {
    let jobs: Vec<JobRow> =
        sqlx::query_as("SELECT * FROM jobs WHERE status = 'open' ORDER BY created_at DESC")
            .fetch_all(pool)
            .await?;

    Ok(keyword_rank(user, jobs, limit))
}

/// Pure keyword ranking over a set of jobs.
pub fn keyword_rank(user: &UserRow, jobs: Vec<JobRow>, limit: usize) -> Vec<JobMatch> {
    let mut matches: Vec<JobMatch> = jobs
        .into_iter()
        .map(|job| JobMatch {
            match_score: keyword_overlap_score(&user.skills, &job.required_skills),
            reasons: Vec::new(),
            scoring_path: "keyword".to_string(),
            job,
        })
        .collect();

    rank(&mut matches);
    matches.truncate(limit);
    matches
}

//! Axum route handlers for the Recommendation API.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::recommend::blender::{JobMatch, DEFAULT_LIMIT};
use crate::state::AppState;

/// Keep requests from dragging the whole jobs table through the blender.
const MAX_LIMIT: usize = 50;

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub user_id: Uuid,
    pub limit: Option<usize>,
}

/// GET /api/v1/recommendations?user_id=...&limit=...
///
/// Resolves the user's profile server-side and returns the top matches,
/// best first. Degrades to keyword matching rather than failing when the
/// AI services are down.
pub async fn handle_recommendations(
    State(state): State<AppState>,
    Query(params): Query<RecommendationQuery>,
) -> Result<Json<Vec<JobMatch>>, AppError> {
    let limit = params.limit.unwrap_or(DEFAULT_LIMIT);
    if limit == 0 || limit > MAX_LIMIT {
        return Err(AppError::Validation(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(params.user_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {} not found", params.user_id)))?;

    let matches = state.recommender.recommend(&state.db, &user, limit).await?;
    Ok(Json(matches))
}

//! Axum route handlers for the Interviews API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::interview::{InterviewRow, INTERVIEW_MODES, INTERVIEW_STATUSES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ScheduleInterviewRequest {
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub mode: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListInterviewsQuery {
    pub application_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInterviewStatusRequest {
    pub status: String,
    pub notes: Option<String>,
}

/// POST /api/v1/interviews
pub async fn handle_schedule_interview(
    State(state): State<AppState>,
    Json(request): Json<ScheduleInterviewRequest>,
) -> Result<(StatusCode, Json<InterviewRow>), AppError> {
    if !INTERVIEW_MODES.contains(&request.mode.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown interview mode '{}'",
            request.mode
        )));
    }

    let application_exists: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM applications WHERE id = $1")
            .bind(request.application_id)
            .fetch_optional(&state.db)
            .await?;
    if application_exists.is_none() {
        return Err(AppError::UnprocessableEntity(format!(
            "Application {} does not exist",
            request.application_id
        )));
    }

    let interview: InterviewRow = sqlx::query_as(
        r#"
        INSERT INTO interviews (id, application_id, scheduled_at, mode, status, notes)
        VALUES ($1, $2, $3, $4, 'scheduled', $5)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.application_id)
    .bind(request.scheduled_at)
    .bind(&request.mode)
    .bind(&request.notes)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(interview)))
}

/// GET /api/v1/interviews?application_id=...
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Query(params): Query<ListInterviewsQuery>,
) -> Result<Json<Vec<InterviewRow>>, AppError> {
    let interviews: Vec<InterviewRow> = sqlx::query_as(
        r#"
        SELECT * FROM interviews
        WHERE ($1::uuid IS NULL OR application_id = $1)
        ORDER BY scheduled_at ASC
        "#,
    )
    .bind(params.application_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(interviews))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewRow>, AppError> {
    let interview: InterviewRow = sqlx::query_as("SELECT * FROM interviews WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;

    Ok(Json(interview))
}

/// PATCH /api/v1/interviews/:id/status
pub async fn handle_update_interview_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateInterviewStatusRequest>,
) -> Result<Json<InterviewRow>, AppError> {
    if !INTERVIEW_STATUSES.contains(&request.status.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown interview status '{}'",
            request.status
        )));
    }

    let interview: InterviewRow = sqlx::query_as(
        r#"
        UPDATE interviews SET
            status = $2,
            notes = COALESCE($3, notes)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&request.status)
    .bind(&request.notes)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Interview {id} not found")))?;

    Ok(Json(interview))
}

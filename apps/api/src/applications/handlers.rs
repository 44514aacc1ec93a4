//! Axum route handlers for the Applications API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::application::{ApplicationRow, APPLICATION_STATUSES};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateApplicationRequest {
    pub job_id: Uuid,
    pub user_id: Uuid,
    pub resume_text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListApplicationsQuery {
    pub job_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

/// POST /api/v1/applications
pub async fn handle_create_application(
    State(state): State<AppState>,
    Json(request): Json<CreateApplicationRequest>,
) -> Result<(StatusCode, Json<ApplicationRow>), AppError> {
    let job_status: Option<(String,)> = sqlx::query_as("SELECT status FROM jobs WHERE id = $1")
        .bind(request.job_id)
        .fetch_optional(&state.db)
        .await?;
    let job_status = job_status.ok_or_else(|| {
        AppError::UnprocessableEntity(format!("Job {} does not exist", request.job_id))
    })?;
    if job_status.0 != "open" {
        return Err(AppError::UnprocessableEntity(format!(
            "Job {} is not open for applications",
            request.job_id
        )));
    }

    let user_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1")
        .bind(request.user_id)
        .fetch_optional(&state.db)
        .await?;
    if user_exists.is_none() {
        return Err(AppError::UnprocessableEntity(format!(
            "User {} does not exist",
            request.user_id
        )));
    }

    let duplicate: Option<(Uuid,)> =
        sqlx::query_as("SELECT id FROM applications WHERE job_id = $1 AND user_id = $2")
            .bind(request.job_id)
            .bind(request.user_id)
            .fetch_optional(&state.db)
            .await?;
    if duplicate.is_some() {
        return Err(AppError::UnprocessableEntity(
            "User has already applied to this job".to_string(),
        ));
    }

    let application: ApplicationRow = sqlx::query_as(
        r#"
        INSERT INTO applications (id, job_id, user_id, resume_text, status)
        VALUES ($1, $2, $3, $4, 'submitted')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.job_id)
    .bind(request.user_id)
    .bind(&request.resume_text)
    .fetch_one(&state.db)
    .await?;

    Ok((StatusCode::CREATED, Json(application)))
}

/// GET /api/v1/applications?job_id=...&user_id=...
pub async fn handle_list_applications(
    State(state): State<AppState>,
    Query(params): Query<ListApplicationsQuery>,
) -> Result<Json<Vec<ApplicationRow>>, AppError> {
    let applications: Vec<ApplicationRow> = sqlx::query_as(
        r#"
        SELECT * FROM applications
        WHERE ($1::uuid IS NULL OR job_id = $1)
          AND ($2::uuid IS NULL OR user_id = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(params.job_id)
    .bind(params.user_id)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(applications))
}

/// GET /api/v1/applications/:id
pub async fn handle_get_application(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApplicationRow>, AppError> {
    let application: ApplicationRow = sqlx::query_as("SELECT * FROM applications WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    Ok(Json(application))
}

/// PATCH /api/v1/applications/:id/status
pub async fn handle_update_application_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ApplicationRow>, AppError> {
    if !APPLICATION_STATUSES.contains(&request.status.as_str()) {
        return Err(AppError::Validation(format!(
            "Unknown application status '{}'",
            request.status
        )));
    }

    let application: ApplicationRow = sqlx::query_as(
        "UPDATE applications SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .bind(&request.status)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Application {id} not found")))?;

    Ok(Json(application))
}

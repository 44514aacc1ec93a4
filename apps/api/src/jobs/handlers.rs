//! Axum route handlers for the Jobs API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::jobs::indexing::{deindex_job, index_job};
use crate::models::job::JobRow;
use crate::state::AppState;

pub const JOB_STATUSES: &[&str] = &["open", "closed"];

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateJobRequest {
    pub title: String,
    pub company: String,
    pub description: String,
    #[serde(default)]
    pub required_skills: Vec<String>,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateJobRequest {
    pub title: Option<String>,
    pub company: Option<String>,
    pub description: Option<String>,
    pub required_skills: Option<Vec<String>>,
    pub location: Option<String>,
    pub salary_min: Option<i32>,
    pub salary_max: Option<i32>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListJobsQuery {
    pub status: Option<String>,
}

fn validate_salary_range(min: Option<i32>, max: Option<i32>) -> Result<(), AppError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(AppError::Validation(
                "salary_min cannot exceed salary_max".to_string(),
            ));
        }
    }
    Ok(())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/jobs
///
/// Creates a job and indexes it into the vector store. Indexing is
/// best-effort: the job is created even if the embedding provider is down.
pub async fn handle_create_job(
    State(state): State<AppState>,
    Json(request): Json<CreateJobRequest>,
) -> Result<(StatusCode, Json<JobRow>), AppError> {
    if request.title.trim().is_empty() {
        return Err(AppError::Validation("title cannot be empty".to_string()));
    }
    if request.description.trim().is_empty() {
        return Err(AppError::Validation("description cannot be empty".to_string()));
    }
    validate_salary_range(request.salary_min, request.salary_max)?;

    let job: JobRow = sqlx::query_as(
        r#"
        INSERT INTO jobs
            (id, title, company, description, required_skills, location,
             salary_min, salary_max, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'open')
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.title.trim())
    .bind(request.company.trim())
    .bind(request.description.trim())
    .bind(&request.required_skills)
    .bind(&request.location)
    .bind(request.salary_min)
    .bind(request.salary_max)
    .fetch_one(&state.db)
    .await?;

    index_job(state.embedder.as_ref(), state.jobs_index.as_ref(), &job).await;

    Ok((StatusCode::CREATED, Json(job)))
}

/// GET /api/v1/jobs?status=open
pub async fn handle_list_jobs(
    State(state): State<AppState>,
    Query(params): Query<ListJobsQuery>,
) -> Result<Json<Vec<JobRow>>, AppError> {
    if let Some(status) = &params.status {
        if !JOB_STATUSES.contains(&status.as_str()) {
            return Err(AppError::Validation(format!("Unknown job status '{status}'")));
        }
    }

    let jobs: Vec<JobRow> = sqlx::query_as(
        "SELECT * FROM jobs WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC",
    )
    .bind(&params.status)
    .fetch_all(&state.db)
    .await?;

    Ok(Json(jobs))
}

/// GET /api/v1/jobs/:id
pub async fn handle_get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobRow>, AppError> {
    let job: JobRow = sqlx::query_as("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    Ok(Json(job))
}

/// PUT /api/v1/jobs/:id
///
/// Partial update; reindexes on content change, removes the vector when the
/// job is closed.
pub async fn handle_update_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateJobRequest>,
) -> Result<Json<JobRow>, AppError> {
    if let Some(status) = &request.status {
        if !JOB_STATUSES.contains(&status.as_str()) {
            return Err(AppError::Validation(format!("Unknown job status '{status}'")));
        }
    }
    validate_salary_range(request.salary_min, request.salary_max)?;

    let job: JobRow = sqlx::query_as(
        r#"
        UPDATE jobs SET
            title = COALESCE($2, title),
            company = COALESCE($3, company),
            description = COALESCE($4, description),
            required_skills = COALESCE($5, required_skills),
            location = COALESCE($6, location),
            salary_min = COALESCE($7, salary_min),
            salary_max = COALESCE($8, salary_max),
            status = COALESCE($9, status),
            updated_at = NOW()
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&request.title)
    .bind(&request.company)
    .bind(&request.description)
    .bind(&request.required_skills)
    .bind(&request.location)
    .bind(request.salary_min)
    .bind(request.salary_max)
    .bind(&request.status)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("Job {id} not found")))?;

    if job.status == "closed" {
        deindex_job(state.jobs_index.as_ref(), job.id).await;
    } else {
        index_job(state.embedder.as_ref(), state.jobs_index.as_ref(), &job).await;
    }

    Ok(Json(job))
}

/// DELETE /api/v1/jobs/:id
pub async fn handle_delete_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted: Option<(Uuid,)> = sqlx::query_as("DELETE FROM jobs WHERE id = $1 RETURNING id")
        .bind(id)
        .fetch_optional(&state.db)
        .await?;

    if deleted.is_none() {
        return Err(AppError::NotFound(format!("Job {id} not found")));
    }

    deindex_job(state.jobs_index.as_ref(), id).await;

    Ok(StatusCode::NO_CONTENT)
}

//! Axum route handlers for the Users API.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::user::UserRow;
use crate::recommend::profile::profile_text;
use crate::state::AppState;

pub const USER_ROLES: &[&str] = &["seeker", "employer"];

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub name: String,
    pub role: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub experience_years: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub skills: Option<Vec<String>>,
    pub bio: Option<String>,
    pub experience_years: Option<i32>,
}

/// POST /api/v1/users
pub async fn handle_create_user(
    State(state): State<AppState>,
    Json(request): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserRow>), AppError> {
    if !request.email.contains('@') {
        return Err(AppError::Validation("email is not valid".to_string()));
    }
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("name cannot be empty".to_string()));
    }

    let role = request.role.as_deref().unwrap_or("seeker");
    if !USER_ROLES.contains(&role) {
        return Err(AppError::Validation(format!("Unknown role '{role}'")));
    }

    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM users WHERE email = $1")
        .bind(&request.email)
        .fetch_optional(&state.db)
        .await?;
    if existing.is_some() {
        return Err(AppError::UnprocessableEntity(format!(
            "A user with email '{}' already exists",
            request.email
        )));
    }

    let user: UserRow = sqlx::query_as(
        r#"
        INSERT INTO users (id, email, name, role, skills, bio, experience_years)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(request.email.trim())
    .bind(request.name.trim())
    .bind(role)
    .bind(&request.skills)
    .bind(&request.bio)
    .bind(request.experience_years.unwrap_or(0))
    .fetch_one(&state.db)
    .await?;

    index_profile(&state, &user).await;

    Ok((StatusCode::CREATED, Json(user)))
}

/// GET /api/v1/users/:id
pub async fn handle_get_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserRow>, AppError> {
    let user: UserRow = sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    Ok(Json(user))
}

/// PUT /api/v1/users/:id/profile
///
/// Updates the seeker profile and refreshes the profiles collection.
pub async fn handle_update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserRow>, AppError> {
    if let Some(years) = request.experience_years {
        if years < 0 {
            return Err(AppError::Validation(
                "experience_years cannot be negative".to_string(),
            ));
        }
    }

    let user: UserRow = sqlx::query_as(
        r#"
        UPDATE users SET
            skills = COALESCE($2, skills),
            bio = COALESCE($3, bio),
            experience_years = COALESCE($4, experience_years)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(&request.skills)
    .bind(&request.bio)
    .bind(request.experience_years)
    .fetch_optional(&state.db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("User {id} not found")))?;

    index_profile(&state, &user).await;

    Ok(Json(user))
}

/// Best-effort write into the profiles collection. The recommendation path
/// embeds profiles fresh per request; this copy serves reverse lookups
/// (candidate search for a job) and is allowed to go stale.
async fn index_profile(state: &AppState, user: &UserRow) {
    let text = profile_text(user);
    if text.is_empty() {
        return;
    }

    let embedding = match state.embedder.embed(&text).await {
        Ok(embedding) => embedding,
        Err(e) => {
            warn!("Failed to embed profile {} ({e})", user.id);
            return;
        }
    };

    if let Err(e) = state.profiles_index.upsert(user.id, &embedding, &text).await {
        warn!("Failed to index profile {} ({e})", user.id);
    }
}

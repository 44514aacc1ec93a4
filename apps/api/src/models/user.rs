use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A portal user. Job seekers carry an inline profile (skills, bio,
/// experience) that the recommendation path reads; employers leave it empty.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    /// "seeker" | "employer"
    pub role: String,
    pub skills: Vec<String>,
    pub bio: Option<String>,
    pub experience_years: i32,
    pub created_at: DateTime<Utc>,
}

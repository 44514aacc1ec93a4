use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const INTERVIEW_MODES: &[&str] = &["phone", "video", "onsite"];
pub const INTERVIEW_STATUSES: &[&str] = &["scheduled", "completed", "cancelled"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub application_id: Uuid,
    pub scheduled_at: DateTime<Utc>,
    pub mode: String,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

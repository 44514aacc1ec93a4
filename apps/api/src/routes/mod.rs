pub mod health;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use crate::applications::handlers as applications;
use crate::interviews::handlers as interviews;
use crate::jobs::handlers as jobs;
use crate::recommend::handlers as recommend;
use crate::state::AppState;
use crate::users::handlers as users;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Recommendations
        .route(
            "/api/v1/recommendations",
            get(recommend::handle_recommendations),
        )
        // Jobs
        .route(
            "/api/v1/jobs",
            post(jobs::handle_create_job).get(jobs::handle_list_jobs),
        )
        .route(
            "/api/v1/jobs/:id",
            get(jobs::handle_get_job)
                .put(jobs::handle_update_job)
                .delete(jobs::handle_delete_job),
        )
        // Users
        .route("/api/v1/users", post(users::handle_create_user))
        .route("/api/v1/users/:id", get(users::handle_get_user))
        .route("/api/v1/users/:id/profile", put(users::handle_update_profile))
        // Applications
        .route(
            "/api/v1/applications",
            post(applications::handle_create_application)
                .get(applications::handle_list_applications),
        )
        .route(
            "/api/v1/applications/:id",
            get(applications::handle_get_application),
        )
        .route(
            "/api/v1/applications/:id/status",
            patch(applications::handle_update_application_status),
        )
        // Interviews
        .route(
            "/api/v1/interviews",
            post(interviews::handle_schedule_interview).get(interviews::handle_list_interviews),
        )
        .route("/api/v1/interviews/:id", get(interviews::handle_get_interview))
        .route(
            "/api/v1/interviews/:id/status",
            patch(interviews::handle_update_interview_status),
        )
        .with_state(state)
}

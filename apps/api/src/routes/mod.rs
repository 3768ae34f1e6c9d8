pub mod health;

use axum::{
    routing::{get, patch},
    Router,
};

use crate::registrations::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/interview-registrations", get(handlers::handle_list))
        .route("/api/interview-registrations/", get(handlers::handle_list))
        .route(
            "/api/interview-registrations/stats/overview",
            get(handlers::handle_overview),
        )
        .route(
            "/api/interview-registrations/stats/summary",
            get(handlers::handle_summary_stats),
        )
        .route(
            "/api/interview-registrations/:id",
            get(handlers::handle_get),
        )
        .route(
            "/api/interview-registrations/:id/feedback",
            patch(handlers::handle_update_feedback),
        )
        .route(
            "/api/interview-registrations/:id/role-details",
            patch(handlers::handle_update_role_details),
        )
        .route(
            "/api/interview-registrations/:id/status",
            patch(handlers::handle_update_status),
        )
        .route(
            "/api/interview-registrations/:id/hr-review",
            patch(handlers::handle_update_hr_review),
        )
        .route(
            "/api/interview-registrations/:id/hr-answer",
            patch(handlers::handle_update_hr_answer),
        )
        .with_state(state)
}

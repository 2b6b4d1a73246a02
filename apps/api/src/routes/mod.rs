pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::hiring::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Candidate intake
        .route("/api/v1/candidates", post(handlers::handle_register))
        .route("/api/v1/candidates/upload", post(handlers::handle_upload))
        // Evaluation rounds
        .route(
            "/api/v1/candidates/:id/evaluate",
            post(handlers::handle_evaluate),
        )
        .route(
            "/api/v1/candidates/:id/evaluations/:role",
            put(handlers::handle_submit_evaluation),
        )
        .route(
            "/api/v1/candidates/:id/decision",
            get(handlers::handle_get_decision).post(handlers::handle_finalize),
        )
        .route("/api/v1/candidates/:id/status", get(handlers::handle_status))
        .route(
            "/api/v1/candidates/:id/history",
            get(handlers::handle_history),
        )
        .route(
            "/api/v1/candidates/:id/onboarding",
            get(handlers::handle_onboarding),
        )
        .with_state(state)
}

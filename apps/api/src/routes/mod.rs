pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::analysis::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analysis API
        .route(
            "/api/analyze-skills",
            post(handlers::handle_analyze_skills),
        )
        .route("/api/auto-generate", post(handlers::handle_auto_generate))
        .with_state(state)
}

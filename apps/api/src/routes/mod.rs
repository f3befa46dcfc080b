pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::batch::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/roster/preview", post(handlers::handle_preview))
        .route("/api/v1/exams", post(handlers::handle_exam_batch))
        .route("/api/v1/evaluations", post(handlers::handle_evaluation_batch))
        .with_state(state)
}

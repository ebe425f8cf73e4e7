//! JSON HTTP surface over [`SubmissionWorkflow`](crate::workflow::SubmissionWorkflow).

mod api;
mod extract;

use axum::{
    routing::{get, patch, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/submissions",
            post(api::create_submission).get(api::list_submissions),
        )
        .route("/api/submissions/:id", get(api::get_submission))
        .route("/api/submissions/:id/assign", post(api::assign_reviewer))
        .route("/api/submissions/:id/decision", post(api::record_decision))
        .route("/api/submissions/:id/status", post(api::set_status))
        .route("/api/reviewers", post(api::create_reviewer))
        .route("/api/reviewers/assignable", get(api::assignable_reviewers))
        .route("/api/reviewers/:id/active", patch(api::set_reviewer_active))
        .route(
            "/api/reviewers/:id/submissions",
            get(api::reviewer_submissions),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

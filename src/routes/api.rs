use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use uuid::Uuid;

use super::extract::{ApiJson, ApiPath};
use crate::db::{NewReviewer, NewSubmission, SubmissionStatus};
use crate::errors::{Result, WorkflowError};
use crate::state::AppState;
use crate::workflow::Actor;

#[derive(Deserialize)]
pub struct AssignRequest {
    pub reviewer_id: Uuid,
}

#[derive(Deserialize)]
pub struct DecisionRequest {
    pub status: String,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Deserialize)]
pub struct StatusRequest {
    pub status: String,
}

#[derive(Deserialize)]
pub struct ActiveRequest {
    pub is_active: bool,
}

fn parse_status(raw: &str) -> Result<SubmissionStatus> {
    raw.parse().map_err(WorkflowError::Validation)
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

/// Public submission form. Without actor headers the caller is the author.
pub async fn create_submission(
    State(state): State<AppState>,
    actor: Option<Actor>,
    ApiJson(payload): ApiJson<NewSubmission>,
) -> Result<impl IntoResponse> {
    let actor = actor.unwrap_or(Actor::Author);
    let created = state.workflow.create_submission(actor, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn list_submissions(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.workflow.list_submissions().await?))
}

pub async fn get_submission(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.workflow.get_submission(id).await?))
}

pub async fn assign_reviewer(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<AssignRequest>,
) -> Result<impl IntoResponse> {
    let result = state
        .workflow
        .assign_reviewer(actor, id, payload.reviewer_id)
        .await?;
    Ok(Json(result))
}

pub async fn record_decision(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<DecisionRequest>,
) -> Result<impl IntoResponse> {
    let status = parse_status(&payload.status)?;
    let result = state
        .workflow
        .record_decision(actor, id, status, payload.remarks)
        .await?;
    Ok(Json(result))
}

pub async fn set_status(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<StatusRequest>,
) -> Result<impl IntoResponse> {
    let status = parse_status(&payload.status)?;
    Ok(Json(state.workflow.set_status(actor, id, status).await?))
}

// ---------------------------------------------------------------------------
// Reviewers
// ---------------------------------------------------------------------------

pub async fn create_reviewer(
    State(state): State<AppState>,
    actor: Actor,
    ApiJson(payload): ApiJson<NewReviewer>,
) -> Result<impl IntoResponse> {
    let created = state.workflow.create_reviewer(actor, payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn assignable_reviewers(State(state): State<AppState>) -> Result<impl IntoResponse> {
    Ok(Json(state.workflow.assignable_reviewers().await?))
}

pub async fn set_reviewer_active(
    State(state): State<AppState>,
    actor: Actor,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(payload): ApiJson<ActiveRequest>,
) -> Result<impl IntoResponse> {
    let reviewer = state
        .workflow
        .set_reviewer_active(actor, id, payload.is_active)
        .await?;
    Ok(Json(reviewer))
}

pub async fn reviewer_submissions(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<impl IntoResponse> {
    Ok(Json(state.workflow.submissions_for_reviewer(id).await?))
}

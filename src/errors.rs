use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::db::StoreError;

pub type Result<T> = std::result::Result<T, WorkflowError>;

/// Failures that leave the submission unchanged.
///
/// Notification problems never appear here; they are reported inside the
/// operation results.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("{0}")]
    Validation(String),
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: Uuid },
    #[error("storage failure: {0}")]
    Persistence(#[from] StoreError),
}

impl WorkflowError {
    pub fn validation(message: impl Into<String>) -> Self {
        WorkflowError::Validation(message.into())
    }

    pub fn submission_not_found(id: Uuid) -> Self {
        WorkflowError::NotFound {
            entity: "submission",
            id,
        }
    }

    pub fn reviewer_not_found(id: Uuid) -> Self {
        WorkflowError::NotFound {
            entity: "reviewer",
            id,
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            WorkflowError::Validation(_) => StatusCode::BAD_REQUEST,
            WorkflowError::NotFound { .. } => StatusCode::NOT_FOUND,
            WorkflowError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            WorkflowError::Validation(_) => "VALIDATION_ERROR",
            WorkflowError::NotFound { .. } => "NOT_FOUND",
            WorkflowError::Persistence(_) => "PERSISTENCE_ERROR",
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl IntoResponse for WorkflowError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            WorkflowError::Persistence(e) => {
                tracing::error!("Storage failure: {}", e);
                "Database error.".to_string()
            }
            other => other.to_string(),
        };
        (
            status,
            Json(ErrorBody {
                error: self.code(),
                message,
            }),
        )
            .into_response()
    }
}

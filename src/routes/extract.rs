//! Extractors whose rejections use the same JSON error body as the handlers.

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use uuid::Uuid;

use crate::errors::WorkflowError;
use crate::workflow::Actor;

const ROLE_HEADER: &str = "x-actor-role";
const ID_HEADER: &str = "x-actor-id";

/// Reads the caller from `x-actor-role` and, for reviewers, `x-actor-id`.
#[async_trait]
impl<S> FromRequestParts<S> for Actor
where
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let role = header(ROLE_HEADER)
            .ok_or_else(|| WorkflowError::validation("missing x-actor-role header"))?;

        match role.to_lowercase().as_str() {
            "admin" => Ok(Actor::Admin),
            "author" => Ok(Actor::Author),
            "reviewer" => {
                let id = header(ID_HEADER)
                    .and_then(|v| Uuid::parse_str(&v).ok())
                    .ok_or_else(|| {
                        WorkflowError::validation("reviewer requests need a valid x-actor-id header")
                    })?;
                Ok(Actor::Reviewer(id))
            }
            other => Err(WorkflowError::validation(format!(
                "unknown actor role: {}",
                other
            ))),
        }
    }
}

/// `Json<T>` that rejects with a [`WorkflowError::Validation`].
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| WorkflowError::validation(rejection.body_text()))?;
        Ok(ApiJson(value))
    }
}

/// `Path<T>` that rejects with a [`WorkflowError::Validation`].
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = WorkflowError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| WorkflowError::validation(rejection.body_text()))?;
        Ok(ApiPath(value))
    }
}

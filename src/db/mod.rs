//! Storage collaborator for submissions and reviewers.
//!
//! The workflow only talks to [`ReviewStore`]; `PgStore` is the production
//! backend. Rows are loaded per request and never cached.

#[cfg(test)]
mod memory;
mod models;
mod postgres;

#[cfg(test)]
pub use memory::InMemoryStore;
pub use models::*;
pub use postgres::PgStore;

use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

pub type DbPool = Arc<PgPool>;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0} disappeared during update")]
    Missing(&'static str),
}

pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;

    Ok(Arc::new(pool))
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

/// Persistence operations the submission workflow relies on.
///
/// Updates are last-writer-wins; no version check is made.
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Insert a pending submission. The store assigns `id` and `submission_code`.
    async fn create_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError>;

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, StoreError>;

    /// All submissions, newest first.
    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError>;

    /// Submissions assigned to one reviewer, newest first.
    async fn list_submissions_for_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError>;

    /// Write a transition. The stored `updated_at` becomes the later of
    /// `update.updated_at` and one microsecond past the current row value.
    async fn update_submission(
        &self,
        id: Uuid,
        update: &SubmissionUpdate,
    ) -> Result<Submission, StoreError>;

    /// Same as [`Self::update_submission`], plus an audit row committed in the
    /// same transaction. Neither is kept if either fails.
    async fn update_submission_audited(
        &self,
        id: Uuid,
        update: &SubmissionUpdate,
        audit: &StatusAudit,
    ) -> Result<Submission, StoreError>;

    async fn create_reviewer(&self, new: &NewReviewer) -> Result<Reviewer, StoreError>;

    async fn get_reviewer(&self, id: Uuid) -> Result<Option<Reviewer>, StoreError>;

    /// All reviewers, newest first, active or not.
    async fn list_reviewers(&self) -> Result<Vec<Reviewer>, StoreError>;

    async fn set_reviewer_active(&self, id: Uuid, active: bool) -> Result<Reviewer, StoreError>;
}

use async_trait::async_trait;
use sqlx::postgres::PgArguments;
use sqlx::query::QueryAs;
use sqlx::Postgres;
use uuid::Uuid;

use super::{
    DbPool, NewReviewer, NewSubmission, ReviewStore, Reviewer, StatusAudit, StoreError,
    Submission, SubmissionUpdate,
};

/// Postgres-backed store. Schema lives in `migrations/`.
#[derive(Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReviewStore for PgStore {
    async fn create_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO paper_submissions (
                submission_type, author_name, co_author_name, email,
                phone_country_code, phone_number, whatsapp_country_code, whatsapp_number,
                paper_title, institution, designation, department, presentation_mode,
                message, document_url, document_name, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, 'pending')
            RETURNING *
            "#,
        )
        .bind(new.submission_type)
        .bind(&new.author_name)
        .bind(&new.co_author_name)
        .bind(&new.email)
        .bind(&new.phone_country_code)
        .bind(&new.phone_number)
        .bind(&new.whatsapp_country_code)
        .bind(&new.whatsapp_number)
        .bind(&new.paper_title)
        .bind(&new.institution)
        .bind(&new.designation)
        .bind(&new.department)
        .bind(&new.presentation_mode)
        .bind(&new.message)
        .bind(&new.document_url)
        .bind(&new.document_name)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(submission)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        let submission =
            sqlx::query_as::<_, Submission>("SELECT * FROM paper_submissions WHERE id = $1")
                .bind(id)
                .fetch_optional(self.pool.as_ref())
                .await?;
        Ok(submission)
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        let rows = sqlx::query_as::<_, Submission>(
            "SELECT * FROM paper_submissions ORDER BY submitted_at DESC",
        )
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(rows)
    }

    async fn list_submissions_for_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError> {
        let rows = sqlx::query_as::<_, Submission>(
            "SELECT * FROM paper_submissions WHERE assigned_reviewer = $1 ORDER BY submitted_at DESC",
        )
        .bind(reviewer_id)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(rows)
    }

    async fn update_submission(
        &self,
        id: Uuid,
        update: &SubmissionUpdate,
    ) -> Result<Submission, StoreError> {
        update_query(id, update)
            .fetch_optional(self.pool.as_ref())
            .await?
            .ok_or(StoreError::Missing("submission"))
    }

    async fn update_submission_audited(
        &self,
        id: Uuid,
        update: &SubmissionUpdate,
        audit: &StatusAudit,
    ) -> Result<Submission, StoreError> {
        let mut tx = self.pool.begin().await?;

        let submission = update_query(id, update)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::Missing("submission"))?;

        sqlx::query(
            r#"
            INSERT INTO status_audit (submission_id, previous_status, new_status, actor, changed_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(audit.submission_id)
        .bind(audit.previous_status)
        .bind(audit.new_status)
        .bind(&audit.actor)
        .bind(audit.changed_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(submission)
    }

    async fn create_reviewer(&self, new: &NewReviewer) -> Result<Reviewer, StoreError> {
        let reviewer = sqlx::query_as::<_, Reviewer>(
            r#"
            INSERT INTO reviewers (name, email, phone, username, password, role)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.username)
        .bind(&new.password)
        .bind(&new.role)
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(reviewer)
    }

    async fn get_reviewer(&self, id: Uuid) -> Result<Option<Reviewer>, StoreError> {
        let reviewer = sqlx::query_as::<_, Reviewer>("SELECT * FROM reviewers WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool.as_ref())
            .await?;
        Ok(reviewer)
    }

    async fn list_reviewers(&self) -> Result<Vec<Reviewer>, StoreError> {
        let rows = sqlx::query_as::<_, Reviewer>("SELECT * FROM reviewers ORDER BY created_at DESC")
            .fetch_all(self.pool.as_ref())
            .await?;
        Ok(rows)
    }

    async fn set_reviewer_active(&self, id: Uuid, active: bool) -> Result<Reviewer, StoreError> {
        sqlx::query_as::<_, Reviewer>(
            "UPDATE reviewers SET is_active = $2 WHERE id = $1 RETURNING *",
        )
        .bind(id)
        .bind(active)
        .fetch_optional(self.pool.as_ref())
        .await?
        .ok_or(StoreError::Missing("reviewer"))
    }
}

/// `updated_at` never moves backwards, even when a concurrent writer read an
/// older row than the one it overwrites.
fn update_query<'q>(
    id: Uuid,
    update: &'q SubmissionUpdate,
) -> QueryAs<'q, Postgres, Submission, PgArguments> {
    sqlx::query_as::<_, Submission>(
        r#"
        UPDATE paper_submissions
        SET status = $2,
            assigned_reviewer = $3,
            remarks = $4,
            updated_at = GREATEST(paper_submissions.updated_at + INTERVAL '1 microsecond', $5)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(update.status)
    .bind(update.assigned_reviewer)
    .bind(&update.remarks)
    .bind(update.updated_at)
}

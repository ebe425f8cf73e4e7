//! In-memory `ReviewStore` used by the workflow tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    NewReviewer, NewSubmission, ReviewStore, Reviewer, StatusAudit, StoreError, Submission,
    SubmissionStatus, SubmissionUpdate,
};

pub struct InMemoryStore {
    submissions: RwLock<HashMap<Uuid, Submission>>,
    reviewers: RwLock<HashMap<Uuid, Reviewer>>,
    audit: RwLock<Vec<StatusAudit>>,
    next_code: AtomicU32,
    fail_writes: AtomicBool,
    fail_updates: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            submissions: RwLock::new(HashMap::new()),
            reviewers: RwLock::new(HashMap::new()),
            audit: RwLock::new(Vec::new()),
            next_code: AtomicU32::new(1),
            fail_writes: AtomicBool::new(false),
            fail_updates: AtomicBool::new(false),
        }
    }

    /// Make every subsequent write fail, simulating a storage outage.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make submission updates fail while every other write still succeeds.
    pub fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub async fn audit_entries(&self) -> Vec<StatusAudit> {
        self.audit.read().await.clone()
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }

    async fn apply_update(
        &self,
        id: Uuid,
        update: &SubmissionUpdate,
    ) -> Result<Submission, StoreError> {
        self.check_writable()?;
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        let mut submissions = self.submissions.write().await;
        let row = submissions
            .get_mut(&id)
            .ok_or(StoreError::Missing("submission"))?;
        row.status = update.status;
        row.assigned_reviewer = update.assigned_reviewer;
        row.remarks = update.remarks.clone();
        row.updated_at = update
            .updated_at
            .max(row.updated_at + Duration::microseconds(1));
        Ok(row.clone())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReviewStore for InMemoryStore {
    async fn create_submission(&self, new: &NewSubmission) -> Result<Submission, StoreError> {
        self.check_writable()?;
        let now = Utc::now();
        let code = self.next_code.fetch_add(1, Ordering::SeqCst);
        let submission = Submission {
            id: Uuid::new_v4(),
            submission_code: format!("SUB-{}-{:04}", now.format("%Y"), code),
            submission_type: new.submission_type,
            author_name: new.author_name.clone(),
            co_author_name: new.co_author_name.clone(),
            email: new.email.clone(),
            phone_country_code: new.phone_country_code.clone(),
            phone_number: new.phone_number.clone(),
            whatsapp_country_code: new.whatsapp_country_code.clone(),
            whatsapp_number: new.whatsapp_number.clone(),
            paper_title: new.paper_title.clone(),
            institution: new.institution.clone(),
            designation: new.designation.clone(),
            department: new.department.clone(),
            presentation_mode: new.presentation_mode.clone(),
            message: new.message.clone(),
            document_url: new.document_url.clone(),
            document_name: new.document_name.clone(),
            status: SubmissionStatus::Pending,
            assigned_reviewer: None,
            remarks: None,
            submitted_at: now,
            updated_at: now,
        };
        self.submissions
            .write()
            .await
            .insert(submission.id, submission.clone());
        Ok(submission)
    }

    async fn get_submission(&self, id: Uuid) -> Result<Option<Submission>, StoreError> {
        Ok(self.submissions.read().await.get(&id).cloned())
    }

    async fn list_submissions(&self) -> Result<Vec<Submission>, StoreError> {
        let mut rows: Vec<_> = self.submissions.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn list_submissions_for_reviewer(
        &self,
        reviewer_id: Uuid,
    ) -> Result<Vec<Submission>, StoreError> {
        let mut rows: Vec<_> = self
            .submissions
            .read()
            .await
            .values()
            .filter(|s| s.assigned_reviewer == Some(reviewer_id))
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(rows)
    }

    async fn update_submission(
        &self,
        id: Uuid,
        update: &SubmissionUpdate,
    ) -> Result<Submission, StoreError> {
        self.apply_update(id, update).await
    }

    async fn update_submission_audited(
        &self,
        id: Uuid,
        update: &SubmissionUpdate,
        audit: &StatusAudit,
    ) -> Result<Submission, StoreError> {
        let mut log = self.audit.write().await;
        let submission = self.apply_update(id, update).await?;
        log.push(audit.clone());
        Ok(submission)
    }

    async fn create_reviewer(&self, new: &NewReviewer) -> Result<Reviewer, StoreError> {
        self.check_writable()?;
        let reviewer = Reviewer {
            id: Uuid::new_v4(),
            name: new.name.clone(),
            email: new.email.clone(),
            phone: new.phone.clone(),
            username: new.username.clone(),
            password: new.password.clone(),
            role: new.role.clone(),
            is_active: true,
            created_at: Utc::now(),
        };
        self.reviewers
            .write()
            .await
            .insert(reviewer.id, reviewer.clone());
        Ok(reviewer)
    }

    async fn get_reviewer(&self, id: Uuid) -> Result<Option<Reviewer>, StoreError> {
        Ok(self.reviewers.read().await.get(&id).cloned())
    }

    async fn list_reviewers(&self) -> Result<Vec<Reviewer>, StoreError> {
        let mut rows: Vec<_> = self.reviewers.read().await.values().cloned().collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn set_reviewer_active(&self, id: Uuid, active: bool) -> Result<Reviewer, StoreError> {
        self.check_writable()?;
        let mut reviewers = self.reviewers.write().await;
        let row = reviewers.get_mut(&id).ok_or(StoreError::Missing("reviewer"))?;
        row.is_active = active;
        Ok(row.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SubmissionType;

    fn new_submission() -> NewSubmission {
        NewSubmission {
            submission_type: SubmissionType::ExtendedAbstract,
            author_name: "Zoë Müller".into(),
            co_author_name: None,
            email: "zoe@example.org".into(),
            phone_country_code: "+49".into(),
            phone_number: "1234567".into(),
            whatsapp_country_code: None,
            whatsapp_number: None,
            paper_title: "Café Logistics".into(),
            institution: "Universität Zürich".into(),
            designation: "PhD Student".into(),
            department: "Industrial Engineering".into(),
            presentation_mode: "online".into(),
            message: None,
            document_url: None,
            document_name: None,
        }
    }

    #[tokio::test]
    async fn stale_writer_cannot_move_updated_at_backwards() {
        let store = InMemoryStore::new();
        let created = store.create_submission(&new_submission()).await.unwrap();

        let fresh = store
            .update_submission(
                created.id,
                &SubmissionUpdate {
                    status: SubmissionStatus::Selected,
                    assigned_reviewer: None,
                    remarks: None,
                    updated_at: created.updated_at + Duration::seconds(10),
                },
            )
            .await
            .unwrap();

        // A second writer that read the row before the first write landed.
        let stale = store
            .update_submission(
                created.id,
                &SubmissionUpdate {
                    status: SubmissionStatus::Rejected,
                    assigned_reviewer: None,
                    remarks: Some("Out of scope".into()),
                    updated_at: created.updated_at + Duration::seconds(1),
                },
            )
            .await
            .unwrap();

        assert_eq!(stale.status, SubmissionStatus::Rejected);
        assert!(stale.updated_at > fresh.updated_at);
    }

    #[tokio::test]
    async fn failed_audited_update_keeps_no_audit_row() {
        let store = InMemoryStore::new();
        let created = store.create_submission(&new_submission()).await.unwrap();
        store.fail_updates(true);

        let audit = StatusAudit {
            submission_id: created.id,
            previous_status: SubmissionStatus::Pending,
            new_status: SubmissionStatus::Selected,
            actor: "admin".into(),
            changed_at: Utc::now(),
        };
        let update = SubmissionUpdate {
            status: SubmissionStatus::Selected,
            assigned_reviewer: None,
            remarks: None,
            updated_at: Utc::now(),
        };
        assert!(store
            .update_submission_audited(created.id, &update, &audit)
            .await
            .is_err());
        assert!(store.audit_entries().await.is_empty());
    }
}

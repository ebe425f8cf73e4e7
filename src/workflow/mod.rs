//! Submission lifecycle: reviewer assignment, decisions and status overrides.
//!
//! Every operation persists first and notifies second. Notification failures
//! are reported in the result and never undo the persisted change.

mod actor;
mod outcome;

pub use actor::Actor;
pub use outcome::{
    AssignmentResult, CreatedReviewer, CreatedSubmission, DecisionResult, NotificationOutcome,
    StatusChangeResult,
};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::ConferenceInfo;
use crate::db::{
    NewReviewer, NewSubmission, ReviewStore, Reviewer, StatusAudit, Submission,
    SubmissionStatus, SubmissionUpdate,
};
use crate::errors::{Result, WorkflowError};
use crate::mail::{MailDispatcher, OutgoingMail};
use crate::templates::{self, TemplateError};

pub struct SubmissionWorkflow {
    store: Arc<dyn ReviewStore>,
    mailer: Arc<MailDispatcher>,
    conference: ConferenceInfo,
}

impl SubmissionWorkflow {
    pub fn new(
        store: Arc<dyn ReviewStore>,
        mailer: Arc<MailDispatcher>,
        conference: ConferenceInfo,
    ) -> Self {
        Self {
            store,
            mailer,
            conference,
        }
    }

    // =========================================================================
    // Submissions
    // =========================================================================

    pub async fn create_submission(
        &self,
        actor: Actor,
        mut new: NewSubmission,
    ) -> Result<CreatedSubmission> {
        new.document_url = blank_to_none(new.document_url);
        new.document_name = blank_to_none(new.document_name);
        validate_new_submission(&new)?;

        let submission = self.store.create_submission(&new).await?;
        info!(
            "{} created submission {} for {} ({})",
            actor, submission.submission_code, submission.author_name, submission.email
        );

        let notification = self
            .notify(templates::submission_confirmation(&self.conference, &submission))
            .await;
        Ok(CreatedSubmission::new(submission, notification))
    }

    pub async fn get_submission(&self, id: Uuid) -> Result<Submission> {
        self.load_submission(id).await
    }

    pub async fn list_submissions(&self) -> Result<Vec<Submission>> {
        Ok(self.store.list_submissions().await?)
    }

    pub async fn submissions_for_reviewer(&self, reviewer_id: Uuid) -> Result<Vec<Submission>> {
        self.load_reviewer(reviewer_id).await?;
        Ok(self.store.list_submissions_for_reviewer(reviewer_id).await?)
    }

    /// Assign (or reassign) a reviewer and move the submission to `assigned`.
    ///
    /// Inactive reviewers can still be assigned by id; they are only hidden
    /// from [`Self::assignable_reviewers`].
    pub async fn assign_reviewer(
        &self,
        actor: Actor,
        submission_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<AssignmentResult> {
        let current = self.load_submission(submission_id).await?;
        let reviewer = self.load_reviewer(reviewer_id).await?;

        let now = Utc::now();
        let update = SubmissionUpdate {
            status: SubmissionStatus::Assigned,
            assigned_reviewer: Some(reviewer.id),
            remarks: current.remarks.clone(),
            updated_at: now,
        };
        let submission = if current.status.is_terminal() {
            let audit = audit_entry(&current, SubmissionStatus::Assigned, actor, now);
            let submission = self
                .store
                .update_submission_audited(submission_id, &update, &audit)
                .await?;
            warn!(
                "{} reopened decided submission {} ({}) by reassigning it",
                actor, current.submission_code, current.status
            );
            submission
        } else {
            self.store.update_submission(submission_id, &update).await?
        };
        info!(
            "{} assigned submission {} to reviewer {}",
            actor, submission.submission_code, reviewer.name
        );

        let notification = self
            .notify(templates::assignment_notice(
                &self.conference,
                &reviewer,
                &submission,
                now,
            ))
            .await;
        Ok(AssignmentResult::new(submission, notification))
    }

    /// Record a review decision. Rejections must carry remarks.
    ///
    /// `pending` is never a decision, and `assigned` is only accepted while a
    /// reviewer is attached; both corrections go through [`Self::set_status`].
    /// Notifies the assigned reviewer and the author independently.
    pub async fn record_decision(
        &self,
        actor: Actor,
        submission_id: Uuid,
        status: SubmissionStatus,
        remarks: Option<String>,
    ) -> Result<DecisionResult> {
        let remarks = normalize_remarks(remarks);
        if status == SubmissionStatus::Pending {
            return Err(WorkflowError::validation(
                "pending is not a review decision; use a status override",
            ));
        }
        if status == SubmissionStatus::Rejected && remarks.is_none() {
            return Err(WorkflowError::validation(
                "remarks are required when rejecting a submission",
            ));
        }

        let current = self.load_submission(submission_id).await?;
        if status == SubmissionStatus::Assigned && current.assigned_reviewer.is_none() {
            return Err(WorkflowError::validation(
                "submission has no reviewer; assign one first",
            ));
        }

        let update = SubmissionUpdate {
            status,
            assigned_reviewer: current.assigned_reviewer,
            remarks,
            updated_at: Utc::now(),
        };
        let submission = self.store.update_submission(submission_id, &update).await?;
        info!(
            "{} recorded decision {} -> {} on submission {}",
            actor, current.status, submission.status, submission.submission_code
        );

        let (reviewer_notification, author_notification) = tokio::join!(
            self.notify_assigned_reviewer(&submission),
            self.notify(templates::author_decision(&self.conference, &submission)),
        );

        Ok(DecisionResult::new(
            submission,
            reviewer_notification,
            author_notification,
        ))
    }

    /// Administrative status override. No remarks check and no reviewer
    /// change; only the assigned reviewer is told. Every override is audited.
    pub async fn set_status(
        &self,
        actor: Actor,
        submission_id: Uuid,
        status: SubmissionStatus,
    ) -> Result<StatusChangeResult> {
        let current = self.load_submission(submission_id).await?;
        let now = Utc::now();

        let update = SubmissionUpdate {
            status,
            assigned_reviewer: current.assigned_reviewer,
            remarks: current.remarks.clone(),
            updated_at: now,
        };
        let audit = audit_entry(&current, status, actor, now);
        let submission = self
            .store
            .update_submission_audited(submission_id, &update, &audit)
            .await?;
        if current.status.is_terminal() && !status.is_terminal() {
            warn!(
                "{} reopened decided submission {} ({} -> {})",
                actor, current.submission_code, current.status, status
            );
        }
        info!(
            "{} set status of submission {} from {} to {}",
            actor, submission.submission_code, current.status, submission.status
        );

        let notification = self.notify_assigned_reviewer(&submission).await;
        Ok(StatusChangeResult::new(submission, current.status, notification))
    }

    // =========================================================================
    // Reviewers
    // =========================================================================

    pub async fn create_reviewer(&self, actor: Actor, new: NewReviewer) -> Result<CreatedReviewer> {
        validate_new_reviewer(&new)?;

        let reviewer = self.store.create_reviewer(&new).await?;
        info!("{} created reviewer {} ({})", actor, reviewer.name, reviewer.username);

        let notification = self
            .notify(templates::reviewer_credentials(
                &self.conference,
                &reviewer,
                &new.password,
            ))
            .await;
        Ok(CreatedReviewer::new(reviewer, notification))
    }

    /// Toggle whether a reviewer can receive new assignments. Existing
    /// assignments are left in place.
    pub async fn set_reviewer_active(
        &self,
        actor: Actor,
        reviewer_id: Uuid,
        active: bool,
    ) -> Result<Reviewer> {
        self.load_reviewer(reviewer_id).await?;
        let reviewer = self.store.set_reviewer_active(reviewer_id, active).await?;
        info!(
            "{} {} reviewer {}",
            actor,
            if active { "activated" } else { "deactivated" },
            reviewer.name
        );
        Ok(reviewer)
    }

    pub async fn assignable_reviewers(&self) -> Result<Vec<Reviewer>> {
        let reviewers = self.store.list_reviewers().await?;
        Ok(reviewers.into_iter().filter(|r| r.is_active).collect())
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn load_submission(&self, id: Uuid) -> Result<Submission> {
        self.store
            .get_submission(id)
            .await?
            .ok_or_else(|| WorkflowError::submission_not_found(id))
    }

    async fn load_reviewer(&self, id: Uuid) -> Result<Reviewer> {
        self.store
            .get_reviewer(id)
            .await?
            .ok_or_else(|| WorkflowError::reviewer_not_found(id))
    }

    async fn notify_assigned_reviewer(&self, submission: &Submission) -> NotificationOutcome {
        let Some(reviewer_id) = submission.assigned_reviewer else {
            return NotificationOutcome::not_attempted("no reviewer assigned");
        };

        let reviewer = match self.store.get_reviewer(reviewer_id).await {
            Ok(Some(r)) => r,
            Ok(None) => {
                warn!(
                    "Assigned reviewer {} of submission {} no longer exists",
                    reviewer_id, submission.submission_code
                );
                return NotificationOutcome::not_attempted("assigned reviewer not found");
            }
            Err(e) => {
                error!("Failed to load reviewer {}: {}", reviewer_id, e);
                return NotificationOutcome::failed(e);
            }
        };

        self.notify(templates::reviewer_status_update(
            &self.conference,
            &reviewer,
            submission,
        ))
        .await
    }

    async fn notify(
        &self,
        rendered: std::result::Result<OutgoingMail, TemplateError>,
    ) -> NotificationOutcome {
        match rendered {
            Ok(mail) => self.mailer.send(&mail).await.into(),
            Err(e) => {
                error!("Failed to render notification: {}", e);
                NotificationOutcome::failed(e)
            }
        }
    }
}

fn audit_entry(
    current: &Submission,
    new_status: SubmissionStatus,
    actor: Actor,
    at: DateTime<Utc>,
) -> StatusAudit {
    StatusAudit {
        submission_id: current.id,
        previous_status: current.status,
        new_status,
        actor: actor.to_string(),
        changed_at: at,
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn normalize_remarks(remarks: Option<String>) -> Option<String> {
    blank_to_none(remarks)
}

fn require(value: &str, field: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(WorkflowError::validation(format!("{} is required", field)));
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(()),
        _ => Err(WorkflowError::validation(format!(
            "invalid email address: {}",
            email
        ))),
    }
}

fn validate_new_submission(new: &NewSubmission) -> Result<()> {
    require(&new.author_name, "author_name")?;
    require(&new.email, "email")?;
    validate_email(&new.email)?;
    require(&new.paper_title, "paper_title")?;
    require(&new.phone_number, "phone_number")?;
    require(&new.institution, "institution")?;

    if new.document_url.is_some() != new.document_name.is_some() {
        return Err(WorkflowError::validation(
            "document_url and document_name must be provided together",
        ));
    }
    Ok(())
}

fn validate_new_reviewer(new: &NewReviewer) -> Result<()> {
    require(&new.name, "name")?;
    require(&new.email, "email")?;
    validate_email(&new.email)?;
    require(&new.username, "username")?;
    require(&new.password, "password")?;
    Ok(())
}

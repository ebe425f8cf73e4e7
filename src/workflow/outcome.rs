use serde::Serialize;

use crate::db::{Reviewer, Submission, SubmissionStatus};
use crate::mail::{DeliveryResult, MailError};

/// What happened to one notification attached to a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationOutcome {
    Sent { id: Option<String> },
    /// Recipient is on the exclusion list; reported as success.
    Skipped,
    /// The mail API answered with an error payload.
    Rejected { message: String },
    /// Token refresh, transport, template or lookup failure.
    Failed { error: String },
    /// No recipient to notify, e.g. no reviewer assigned.
    NotAttempted { reason: String },
}

impl NotificationOutcome {
    pub fn delivered(&self) -> bool {
        matches!(
            self,
            NotificationOutcome::Sent { .. } | NotificationOutcome::Skipped
        )
    }

    pub fn not_attempted(reason: impl Into<String>) -> Self {
        NotificationOutcome::NotAttempted {
            reason: reason.into(),
        }
    }

    pub fn failed(error: impl ToString) -> Self {
        NotificationOutcome::Failed {
            error: error.to_string(),
        }
    }
}

impl From<Result<DeliveryResult, MailError>> for NotificationOutcome {
    fn from(result: Result<DeliveryResult, MailError>) -> Self {
        match result {
            Ok(delivery) if delivery.is_skipped() => NotificationOutcome::Skipped,
            Ok(delivery) if delivery.success => NotificationOutcome::Sent { id: delivery.id },
            Ok(delivery) => NotificationOutcome::Rejected {
                message: delivery.message,
            },
            Err(e) => NotificationOutcome::failed(e),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedSubmission {
    pub submission: Submission,
    pub notified: bool,
    pub notification: NotificationOutcome,
}

impl CreatedSubmission {
    pub fn new(submission: Submission, notification: NotificationOutcome) -> Self {
        Self {
            submission,
            notified: notification.delivered(),
            notification,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CreatedReviewer {
    pub reviewer: Reviewer,
    pub notified: bool,
    pub notification: NotificationOutcome,
}

impl CreatedReviewer {
    pub fn new(reviewer: Reviewer, notification: NotificationOutcome) -> Self {
        Self {
            reviewer,
            notified: notification.delivered(),
            notification,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssignmentResult {
    pub submission: Submission,
    pub notified: bool,
    pub notification: NotificationOutcome,
}

impl AssignmentResult {
    pub fn new(submission: Submission, notification: NotificationOutcome) -> Self {
        Self {
            submission,
            notified: notification.delivered(),
            notification,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecisionResult {
    pub submission: Submission,
    pub reviewer_notified: bool,
    pub author_notified: bool,
    pub reviewer_notification: NotificationOutcome,
    pub author_notification: NotificationOutcome,
}

impl DecisionResult {
    pub fn new(
        submission: Submission,
        reviewer_notification: NotificationOutcome,
        author_notification: NotificationOutcome,
    ) -> Self {
        Self {
            submission,
            reviewer_notified: reviewer_notification.delivered(),
            author_notified: author_notification.delivered(),
            reviewer_notification,
            author_notification,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusChangeResult {
    pub submission: Submission,
    pub previous_status: SubmissionStatus,
    pub notified: bool,
    pub notification: NotificationOutcome,
}

impl StatusChangeResult {
    pub fn new(
        submission: Submission,
        previous_status: SubmissionStatus,
        notification: NotificationOutcome,
    ) -> Self {
        Self {
            submission,
            previous_status,
            notified: notification.delivered(),
            notification,
        }
    }
}

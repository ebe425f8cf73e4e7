use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, Default)]
#[sqlx(type_name = "submission_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    #[default]
    Pending,
    Assigned,
    Selected,
    Rejected,
}

impl SubmissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStatus::Pending => "pending",
            SubmissionStatus::Assigned => "assigned",
            SubmissionStatus::Selected => "selected",
            SubmissionStatus::Rejected => "rejected",
        }
    }

    /// Selected and rejected end the review; they are not locked.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SubmissionStatus::Selected | SubmissionStatus::Rejected)
    }
}

impl fmt::Display for SubmissionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubmissionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(SubmissionStatus::Pending),
            "assigned" => Ok(SubmissionStatus::Assigned),
            "selected" => Ok(SubmissionStatus::Selected),
            "rejected" => Ok(SubmissionStatus::Rejected),
            other => Err(format!("unknown submission status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "submission_type")]
pub enum SubmissionType {
    #[sqlx(rename = "extended-abstract")]
    #[serde(rename = "extended-abstract")]
    ExtendedAbstract,
    #[sqlx(rename = "fullpaper")]
    #[serde(rename = "fullpaper")]
    FullPaper,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Submission {
    pub id: Uuid,
    /// Human-facing code assigned by the database at insert time.
    pub submission_code: String,
    pub submission_type: SubmissionType,
    pub author_name: String,
    pub co_author_name: Option<String>,
    pub email: String,
    pub phone_country_code: String,
    pub phone_number: String,
    pub whatsapp_country_code: Option<String>,
    pub whatsapp_number: Option<String>,
    pub paper_title: String,
    pub institution: String,
    pub designation: String,
    pub department: String,
    pub presentation_mode: String,
    pub message: Option<String>,
    pub document_url: Option<String>,
    pub document_name: Option<String>,
    pub status: SubmissionStatus,
    pub assigned_reviewer: Option<Uuid>,
    pub remarks: Option<String>,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSubmission {
    pub submission_type: SubmissionType,
    pub author_name: String,
    #[serde(default)]
    pub co_author_name: Option<String>,
    pub email: String,
    pub phone_country_code: String,
    pub phone_number: String,
    #[serde(default)]
    pub whatsapp_country_code: Option<String>,
    #[serde(default)]
    pub whatsapp_number: Option<String>,
    pub paper_title: String,
    pub institution: String,
    pub designation: String,
    pub department: String,
    pub presentation_mode: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub document_name: Option<String>,
}

/// Fields written by a status transition. Everything else on the row is left alone.
#[derive(Debug, Clone)]
pub struct SubmissionUpdate {
    pub status: SubmissionStatus,
    pub assigned_reviewer: Option<Uuid>,
    pub remarks: Option<String>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Reviewer {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub role: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewReviewer {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub role: Option<String>,
}

/// One administrative status override, kept as an audit trail.
#[derive(Debug, Clone, Serialize)]
pub struct StatusAudit {
    pub submission_id: Uuid,
    pub previous_status: SubmissionStatus,
    pub new_status: SubmissionStatus,
    pub actor: String,
    pub changed_at: DateTime<Utc>,
}

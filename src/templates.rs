//! Notification email rendering. Pure: no I/O beyond the embedded templates.

use std::sync::OnceLock;

use chrono::{DateTime, Days, NaiveDate, Utc};
use tera::{Context, Tera};
use thiserror::Error;

use crate::config::ConferenceInfo;
use crate::db::{Reviewer, Submission, SubmissionStatus};
use crate::mail::OutgoingMail;

const REVIEW_PERIOD_DAYS: u64 = 14;

const TEMPLATES: &[(&str, &str)] = &[
    ("email/base.html", include_str!("../templates/email/base.html")),
    (
        "email/submission_confirmation.html",
        include_str!("../templates/email/submission_confirmation.html"),
    ),
    (
        "email/reviewer_credentials.html",
        include_str!("../templates/email/reviewer_credentials.html"),
    ),
    (
        "email/assignment_notice.html",
        include_str!("../templates/email/assignment_notice.html"),
    ),
    (
        "email/reviewer_status_update.html",
        include_str!("../templates/email/reviewer_status_update.html"),
    ),
    (
        "email/author_decision.html",
        include_str!("../templates/email/author_decision.html"),
    ),
];

static TERA: OnceLock<Result<Tera, String>> = OnceLock::new();

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("email templates failed to load: {0}")]
    Load(String),
    #[error("failed to render {name}: {source}")]
    Render {
        name: &'static str,
        #[source]
        source: tera::Error,
    },
}

pub fn get_tera() -> Result<&'static Tera, TemplateError> {
    TERA.get_or_init(|| {
        let mut tera = Tera::default();
        tera.add_raw_templates(TEMPLATES.iter().copied())
            .map_err(|e| e.to_string())?;
        Ok(tera)
    })
    .as_ref()
    .map_err(|e| TemplateError::Load(e.clone()))
}

fn render(name: &'static str, ctx: &Context) -> Result<String, TemplateError> {
    get_tera()?
        .render(name, ctx)
        .map_err(|source| TemplateError::Render { name, source })
}

fn base_context(conference: &ConferenceInfo, header_background: &str) -> Context {
    let mut ctx = Context::new();
    ctx.insert("conference", conference);
    ctx.insert("header_background", header_background);
    ctx
}

const BLUE_HEADER: &str = "linear-gradient(135deg, #1e40af 0%, #1e3a8a 100%)";
const VIOLET_HEADER: &str = "linear-gradient(135deg, #6366f1 0%, #8b5cf6 100%)";

/// Decision copy variant for the status-update emails.
struct StatusStyle {
    outcome: &'static str,
    label: String,
    color: &'static str,
    header: &'static str,
}

fn status_style(status: SubmissionStatus) -> StatusStyle {
    let raw = status.as_str();
    let mut label = raw.to_string();
    if let Some(first) = label.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    match status {
        SubmissionStatus::Selected => StatusStyle {
            outcome: "selected",
            label,
            color: "#10b981",
            header: "linear-gradient(135deg, #10b981 0%, #059669 100%)",
        },
        SubmissionStatus::Rejected => StatusStyle {
            outcome: "rejected",
            label,
            color: "#ef4444",
            header: "linear-gradient(135deg, #ef4444 0%, #dc2626 100%)",
        },
        _ => StatusStyle {
            outcome: "other",
            label,
            color: "#3b82f6",
            header: "linear-gradient(135deg, #3b82f6 0%, #2563eb 100%)",
        },
    }
}

/// Review deadline shown to a reviewer assigned on `assigned_on`.
pub fn review_deadline(assigned_on: DateTime<Utc>) -> NaiveDate {
    let today = assigned_on.date_naive();
    today
        .checked_add_days(Days::new(REVIEW_PERIOD_DAYS))
        .unwrap_or(today)
}

pub fn submission_confirmation(
    conference: &ConferenceInfo,
    submission: &Submission,
) -> Result<OutgoingMail, TemplateError> {
    let mut ctx = base_context(conference, BLUE_HEADER);
    ctx.insert("author_name", &submission.author_name);
    ctx.insert("paper_title", &submission.paper_title);
    ctx.insert("submission_code", &submission.submission_code);

    Ok(OutgoingMail {
        to: submission.email.clone(),
        subject: format!("Acknowledgment of Abstract Submission - {}", conference.name),
        html: render("email/submission_confirmation.html", &ctx)?,
    })
}

/// The password is only ever passed through here, straight from the admin's
/// create-reviewer request.
pub fn reviewer_credentials(
    conference: &ConferenceInfo,
    reviewer: &Reviewer,
    password: &str,
) -> Result<OutgoingMail, TemplateError> {
    let mut ctx = base_context(
        conference,
        "linear-gradient(135deg, #4f46e5 0%, #7c3aed 100%)",
    );
    ctx.insert("reviewer_name", &reviewer.name);
    ctx.insert("username", &reviewer.username);
    ctx.insert("password", password);

    Ok(OutgoingMail {
        to: reviewer.email.clone(),
        subject: format!("Your Reviewer Account Credentials - {}", conference.committee),
        html: render("email/reviewer_credentials.html", &ctx)?,
    })
}

pub fn assignment_notice(
    conference: &ConferenceInfo,
    reviewer: &Reviewer,
    submission: &Submission,
    assigned_on: DateTime<Utc>,
) -> Result<OutgoingMail, TemplateError> {
    let mut ctx = base_context(conference, BLUE_HEADER);
    ctx.insert("reviewer_name", &reviewer.name);
    ctx.insert("author_name", &submission.author_name);
    ctx.insert("paper_title", &submission.paper_title);
    ctx.insert("submission_code", &submission.submission_code);
    ctx.insert(
        "review_deadline",
        &review_deadline(assigned_on).format("%-d %B %Y").to_string(),
    );

    Ok(OutgoingMail {
        to: reviewer.email.clone(),
        subject: format!(
            "New Paper Assignment: {} - {}",
            submission.submission_code, submission.paper_title
        ),
        html: render("email/assignment_notice.html", &ctx)?,
    })
}

pub fn reviewer_status_update(
    conference: &ConferenceInfo,
    reviewer: &Reviewer,
    submission: &Submission,
) -> Result<OutgoingMail, TemplateError> {
    let style = status_style(submission.status);
    let mut ctx = base_context(conference, VIOLET_HEADER);
    ctx.insert("reviewer_name", &reviewer.name);
    ctx.insert("paper_title", &submission.paper_title);
    ctx.insert("submission_code", &submission.submission_code);
    ctx.insert("status_label", &style.label);
    ctx.insert("status_color", style.color);

    Ok(OutgoingMail {
        to: reviewer.email.clone(),
        subject: format!(
            "Status Update: {} - {}",
            submission.submission_code, submission.paper_title
        ),
        html: render("email/reviewer_status_update.html", &ctx)?,
    })
}

pub fn author_decision(
    conference: &ConferenceInfo,
    submission: &Submission,
) -> Result<OutgoingMail, TemplateError> {
    let style = status_style(submission.status);
    let remarks = submission
        .remarks
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty());

    let mut ctx = base_context(conference, style.header);
    ctx.insert("author_name", &submission.author_name);
    ctx.insert("paper_title", &submission.paper_title);
    ctx.insert("submission_code", &submission.submission_code);
    ctx.insert("status", submission.status.as_str());
    ctx.insert("status_label", &style.label);
    ctx.insert("status_color", style.color);
    ctx.insert("outcome", style.outcome);
    ctx.insert("remarks", &remarks);

    Ok(OutgoingMail {
        to: submission.email.clone(),
        subject: format!(
            "Paper Review Update: {} - {}",
            submission.submission_code, submission.paper_title
        ),
        html: render("email/author_decision.html", &ctx)?,
    })
}

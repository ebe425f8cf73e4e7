//! Outbound notification mail.
//!
//! [`MailDispatcher`] applies the exclusion policy and hands everything else to
//! a [`MailTransport`]. The production transport is [`GmailTransport`].

mod gmail;
pub mod mime;

pub use gmail::GmailTransport;

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

const SKIPPED: &str = "skipped";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryResult {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl DeliveryResult {
    pub fn sent(id: Option<String>) -> Self {
        Self {
            success: true,
            message: "Email sent successfully".to_string(),
            id,
        }
    }

    pub fn skipped() -> Self {
        Self {
            success: true,
            message: SKIPPED.to_string(),
            id: None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        self.success && self.message == SKIPPED
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            id: None,
        }
    }
}

/// A rendered notification addressed to one recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail credentials not configured: missing {0}")]
    MissingCredentials(&'static str),
    #[error("OAuth2 token refresh failed with status {status}: {body}")]
    TokenRefresh { status: u16, body: String },
    #[error("mail transport timed out")]
    Timeout,
    #[error("mail transport error: {0}")]
    Transport(reqwest::Error),
    #[error("unexpected response from mail API: {0}")]
    Parse(String),
}

impl From<reqwest::Error> for MailError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            MailError::Timeout
        } else {
            MailError::Transport(err)
        }
    }
}

/// Delivers a fully rendered message. Clean upstream rejections come back as
/// `Ok` with `success: false`; transport and credential problems are `Err`.
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn deliver(&self, mail: &OutgoingMail) -> Result<DeliveryResult, MailError>;
}

pub struct MailDispatcher {
    transport: Arc<dyn MailTransport>,
    excluded: HashSet<String>,
}

impl MailDispatcher {
    pub fn new<I, S>(transport: Arc<dyn MailTransport>, excluded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let excluded = excluded
            .into_iter()
            .map(|addr| addr.as_ref().trim().to_lowercase())
            .filter(|addr| !addr.is_empty())
            .collect();
        Self {
            transport,
            excluded,
        }
    }

    pub fn is_excluded(&self, address: &str) -> bool {
        self.excluded.contains(&address.trim().to_lowercase())
    }

    /// Send one notification. Excluded recipients report success without
    /// reaching the transport.
    pub async fn send(&self, mail: &OutgoingMail) -> Result<DeliveryResult, MailError> {
        if self.is_excluded(&mail.to) {
            info!("Skipping email to excluded address {}", mail.to);
            return Ok(DeliveryResult::skipped());
        }

        info!("Sending email to {} (subject: {})", mail.to, mail.subject);
        let result = self.transport.deliver(mail).await;
        match &result {
            Ok(delivery) if delivery.success => {
                info!("Email to {} delivered (id: {:?})", mail.to, delivery.id)
            }
            Ok(delivery) => warn!("Email to {} rejected: {}", mail.to, delivery.message),
            Err(e) => warn!("Email to {} failed: {}", mail.to, e),
        }
        result
    }
}

//! Mail relay collaborator.
//!
//! The guard treats the relay as opaque: any failure becomes a generic
//! retry-later error for the user.

mod emailjs;

pub use emailjs::EmailJsRelay;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use formguard_common::SanitizedPayload;
use serde::Serialize;
use thiserror::Error;

/// Template variables sent with each message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TemplateParams {
    pub from_name: String,
    pub from_email: String,
    pub message: String,
    pub reply_to: String,
    /// RFC 3339 submit time
    pub timestamp: String,
    /// Session duration and interaction counts
    pub diagnostics: String,
}

impl TemplateParams {
    pub fn new(payload: &SanitizedPayload, now: DateTime<Utc>, diagnostics: String) -> Self {
        Self {
            from_name: payload.name.clone(),
            from_email: payload.email.clone(),
            message: payload.message.clone(),
            reply_to: payload.email.clone(),
            timestamp: now.to_rfc3339_opts(SecondsFormat::Secs, true),
            diagnostics,
        }
    }
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Relay rejected message ({status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Outbound mail delivery
#[async_trait]
pub trait MailRelay: Send + Sync {
    async fn send(&self, params: &TemplateParams) -> Result<(), RelayError>;
}

//! Error taxonomy for FormGuard.
//!
//! Field errors name the offending fields so the form can render them
//! inline. Security errors carry the exact heuristic for logging, but only
//! ever surface a generic message to the user.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::types::FormField;

/// Generic text shown for every security rejection
pub const SECURITY_USER_MESSAGE: &str =
    "Your message could not be sent for security reasons. Please try again later.";

/// Generic text shown when the mail relay fails
pub const RELAY_USER_MESSAGE: &str =
    "The message could not be sent right now. Please try again in a few minutes.";

/// Per-field validation messages, ordered by field
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<FormField, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message for a field. The first message for a field wins.
    pub fn add(&mut self, field: FormField, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: FormField) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: FormField) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.0.keys().copied()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, message) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{}: {}", field.as_str(), message)?;
            first = false;
        }
        Ok(())
    }
}

/// Which anti-abuse heuristic tripped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SecurityViolation {
    /// Hidden field was filled in
    Honeypot,
    /// Form submitted faster than a human could fill it
    TooFast,
    /// Session older than the stale limit
    SessionExpired,
    /// Too many attempts inside the rate-limit window
    TooManyAttempts,
    /// Previous attempt was too recent
    TooFrequent,
    /// Not enough keyboard/mouse/focus activity
    Behavior,
    /// A send for this session is still in flight
    InFlight,
}

impl SecurityViolation {
    /// Internal description, used in logs and diagnostics only
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Honeypot => "honeypot field populated",
            Self::TooFast => "submitted too fast",
            Self::SessionExpired => "session expired",
            Self::TooManyAttempts => "too many attempts in window",
            Self::TooFrequent => "attempts too close together",
            Self::Behavior => "insufficient interaction",
            Self::InFlight => "submission already in progress",
        }
    }

    /// Returns true for the rate-limit family of violations
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, Self::TooManyAttempts | Self::TooFrequent)
    }
}

impl fmt::Display for SecurityViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Errors produced while guarding a contact-form submission
#[derive(Debug, Error)]
pub enum GuardError {
    /// One or more fields failed validation
    #[error("Invalid fields: {0}")]
    Field(FieldErrors),

    /// An anti-abuse heuristic rejected the submission
    #[error("Security check failed: {0}")]
    Security(SecurityViolation),

    /// The mail relay failed to deliver
    #[error("Mail relay error: {0}")]
    ExternalService(String),

    /// Unknown or purged form session
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Submission history store failure
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl GuardError {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Field(_) => 422,
            Self::Security(v) if v.is_rate_limit() => 429,
            Self::Security(SecurityViolation::InFlight) => 409,
            Self::Security(_) => 403,
            Self::ExternalService(_) => 502,
            Self::SessionNotFound(_) => 404,
            Self::Store(_) => 503,
            Self::Config(_) => 500,
        }
    }

    /// Returns true if the user can simply retry later
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ExternalService(_) | Self::Store(_))
    }

    /// Text safe to show the user. Security errors never reveal which
    /// heuristic tripped.
    pub fn user_message(&self) -> String {
        match self {
            Self::Field(_) => "Please correct the highlighted fields.".to_string(),
            Self::Security(_) => SECURITY_USER_MESSAGE.to_string(),
            Self::ExternalService(_) | Self::Store(_) => RELAY_USER_MESSAGE.to_string(),
            Self::SessionNotFound(_) => {
                "Your form session has expired. Please reload the page.".to_string()
            }
            Self::Config(_) => "The contact form is temporarily unavailable.".to_string(),
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Field(errors) => Some(errors),
            _ => None,
        }
    }
}

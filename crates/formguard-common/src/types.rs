//! Core types shared across FormGuard components.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Visible fields of the contact form
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormField {
    Name,
    Email,
    Message,
    Captcha,
}

impl FormField {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Message => "message",
            Self::Captcha => "captcha",
        }
    }
}

/// Raw contact-form input as typed by the user
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FormState {
    pub name: String,
    pub email: String,
    pub message: String,
    /// Hidden field, never shown to humans
    pub honeypot: String,
    pub captcha_answer: String,
}

/// Arithmetic challenge shown above the submit button
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CaptchaChallenge {
    /// Question text shown to the user
    pub question: String,

    /// Expected answer (server-side only, not sent to client)
    #[serde(skip_serializing)]
    pub expected_answer: i64,
}

impl CaptchaChallenge {
    pub fn new(question: impl Into<String>, expected_answer: i64) -> Self {
        Self {
            question: question.into(),
            expected_answer,
        }
    }
}

/// A single user interaction with the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InteractionEvent {
    Keystroke,
    MouseMove,
    Focus(FormField),
}

/// Interaction counters reported by the page in batches
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InteractionBatch {
    pub keystrokes: u32,
    pub mouse_moves: u32,
    /// Fields that received focus, in order
    pub focused: Vec<FormField>,
}

/// Behavioral evidence collected during one form session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionLog {
    pub keystrokes: u32,
    pub mouse_moves: u32,
    pub field_focus_count: u32,
    /// Most recent focus time per field
    pub field_focus_timestamps: BTreeMap<FormField, DateTime<Utc>>,
}

impl InteractionLog {
    /// Record one event. Counters only ever grow within a session.
    pub fn record(&mut self, event: InteractionEvent, at: DateTime<Utc>) {
        match event {
            InteractionEvent::Keystroke => self.keystrokes = self.keystrokes.saturating_add(1),
            InteractionEvent::MouseMove => self.mouse_moves = self.mouse_moves.saturating_add(1),
            InteractionEvent::Focus(field) => {
                self.field_focus_count = self.field_focus_count.saturating_add(1);
                self.field_focus_timestamps.insert(field, at);
            }
        }
    }

    /// Fold a batch of counters reported by the page
    pub fn apply(&mut self, batch: &InteractionBatch, at: DateTime<Utc>) {
        self.keystrokes = self.keystrokes.saturating_add(batch.keystrokes);
        self.mouse_moves = self.mouse_moves.saturating_add(batch.mouse_moves);
        for field in &batch.focused {
            self.record(InteractionEvent::Focus(*field), at);
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Per-client submission counters, persisted across page reloads
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionHistory {
    pub attempt_count: u32,
    /// Time of the previous send attempt
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_submit: Option<DateTime<Utc>>,
}

impl SubmissionHistory {
    /// Attempts that still count against the window ending at `now`.
    /// Once the last attempt falls outside the window, nothing counts.
    pub fn attempts_in_window(&self, now: DateTime<Utc>, window: Duration) -> u32 {
        match self.last_submit {
            Some(last) if now - last < window => self.attempt_count,
            _ => 0,
        }
    }

    /// Time since the previous attempt, if any
    pub fn since_last(&self, now: DateTime<Utc>) -> Option<Duration> {
        self.last_submit.map(|last| now - last)
    }

    /// Count a send attempt made at `now`
    pub fn record_attempt(&mut self, now: DateTime<Utc>, window: Duration) {
        self.attempt_count = self.attempts_in_window(now, window).saturating_add(1);
        self.last_submit = Some(now);
    }
}

/// Cleaned form content, ready to forward to the mail relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SanitizedPayload {
    pub name: String,
    pub email: String,
    pub message: String,
}

//! Form sessions: one per rendered contact form.
//!
//! A session holds the session start time, the current CAPTCHA challenge and
//! the interaction log. It is reset after a successful submission and purged
//! once it is older than the stale limit.

mod store;

pub use store::{SessionStore, session_purge_worker};

use chrono::{DateTime, Utc};
use formguard_common::{CaptchaChallenge, InteractionLog};
use serde::Serialize;

/// State of one contact-form session
#[derive(Debug, Clone, Serialize)]
pub struct FormSession {
    pub id: String,
    pub started_at: DateTime<Utc>,
    pub challenge: CaptchaChallenge,
    pub interactions: InteractionLog,
    /// A send is in progress for this session
    pub in_flight: bool,
}

impl FormSession {
    pub fn new(id: String, challenge: CaptchaChallenge, now: DateTime<Utc>) -> Self {
        Self {
            id,
            started_at: now,
            challenge,
            interactions: InteractionLog::default(),
            in_flight: false,
        }
    }

    /// Start a fresh form lifetime under the same id
    pub fn reset(&mut self, challenge: CaptchaChallenge, now: DateTime<Utc>) {
        self.started_at = now;
        self.challenge = challenge;
        self.interactions.reset();
        self.in_flight = false;
    }

    /// One-line summary of session duration and interaction counts
    pub fn diagnostics(&self, now: DateTime<Utc>) -> String {
        let log = &self.interactions;
        format!(
            "session={}s keystrokes={} mouse_moves={} field_focus={}",
            (now - self.started_at).num_seconds(),
            log.keystrokes,
            log.mouse_moves,
            log.field_focus_count
        )
    }
}

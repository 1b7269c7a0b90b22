//! Contact-form submission flow.
//!
//! Ties the guard to sessions, history and the mail relay:
//! 1. mark the session in flight
//! 2. under the client's lock, evaluate against its history and record the
//!    attempt before anything is sent
//! 3. send; the attempt stays counted whether or not the send succeeds
//! 4. reset the session on success; keep it for a retry on relay failure

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use formguard_common::{FormState, GuardError, SanitizedPayload};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::guard::{FormGuard, SubmissionContext};
use crate::history::HistoryStore;
use crate::relay::{MailRelay, TemplateParams};
use crate::session::{FormSession, SessionStore};

/// Result of an accepted and delivered submission
#[derive(Debug, Clone, Serialize)]
pub struct SubmitReceipt {
    pub payload: SanitizedPayload,
    /// Attempts counted in the current rate-limit window
    pub attempt_count: u32,
}

/// Contact-form service
pub struct ContactService {
    guard: FormGuard,
    sessions: Arc<SessionStore>,
    history: Arc<dyn HistoryStore>,
    relay: Arc<dyn MailRelay>,
    /// Serializes check-and-record of history per client
    client_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContactService {
    pub fn new(
        guard: FormGuard,
        sessions: Arc<SessionStore>,
        history: Arc<dyn HistoryStore>,
        relay: Arc<dyn MailRelay>,
    ) -> Self {
        Self {
            guard,
            sessions,
            history,
            relay,
            client_locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Submit a form for the given session on behalf of `client_id`
    pub async fn submit(
        &self,
        session_id: &str,
        client_id: &str,
        form: &FormState,
        now: DateTime<Utc>,
    ) -> Result<SubmitReceipt, GuardError> {
        let session = self.sessions.begin_submit(session_id).await?;

        let result = self.process(&session, client_id, form, now).await;

        match &result {
            Ok(_) => self.sessions.complete(session_id, now).await,
            // Relay or store trouble: let the user retry with the same challenge
            Err(GuardError::ExternalService(_) | GuardError::Store(_)) => {
                self.sessions.release(session_id, false).await
            }
            Err(_) => self.sessions.release(session_id, true).await,
        }

        result
    }

    async fn process(
        &self,
        session: &FormSession,
        client_id: &str,
        form: &FormState,
        now: DateTime<Utc>,
    ) -> Result<SubmitReceipt, GuardError> {
        let lock = self.client_lock(client_id).await;
        let reserved = {
            let _held = lock.lock().await;
            self.reserve_attempt(session, client_id, form, now).await
        };
        drop(lock);
        self.prune_client_locks().await;
        let (payload, attempt_count) = reserved?;

        let params = TemplateParams::new(&payload, now, session.diagnostics(now));
        match self.relay.send(&params).await {
            Ok(()) => {
                tracing::info!(
                    session_id = %session.id,
                    attempts = attempt_count,
                    "Contact message forwarded"
                );
                Ok(SubmitReceipt {
                    payload,
                    attempt_count,
                })
            }
            Err(e) => {
                tracing::error!(
                    session_id = %session.id,
                    error = %e,
                    diagnostics = %params.diagnostics,
                    "Mail relay send failed"
                );
                Err(GuardError::ExternalService(e.to_string()))
            }
        }
    }

    /// Evaluate against the stored history and count the attempt. Must run
    /// under the client's lock so concurrent submits see each other.
    async fn reserve_attempt(
        &self,
        session: &FormSession,
        client_id: &str,
        form: &FormState,
        now: DateTime<Utc>,
    ) -> Result<(SanitizedPayload, u32), GuardError> {
        let mut history = self.history.load(client_id).await?;

        let ctx = SubmissionContext {
            form,
            challenge: &session.challenge,
            interactions: &session.interactions,
            history: &history,
            started_at: session.started_at,
        };
        let payload = self.guard.evaluate(&ctx, now)?;

        history.record_attempt(now, self.guard.rate_window());
        self.history.save(client_id, &history).await?;

        Ok((payload, history.attempt_count))
    }

    async fn client_lock(&self, client_id: &str) -> Arc<Mutex<()>> {
        self.client_locks
            .lock()
            .await
            .entry(client_id.to_string())
            .or_default()
            .clone()
    }

    /// Drop locks nobody is holding or waiting on
    async fn prune_client_locks(&self) {
        self.client_locks
            .lock()
            .await
            .retain(|_, lock| Arc::strong_count(lock) > 1);
    }
}

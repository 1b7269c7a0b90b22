//! In-memory session store.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use formguard_common::{GuardError, InteractionBatch, SecurityViolation};
use tokio::sync::RwLock;

use super::FormSession;
use crate::captcha::CaptchaGenerator;

/// Session store service
pub struct SessionStore {
    sessions: RwLock<HashMap<String, FormSession>>,
    generator: CaptchaGenerator,
    /// Sessions older than this are purged
    max_age: Duration,
}

impl SessionStore {
    pub fn new(generator: CaptchaGenerator, max_age_secs: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            generator,
            max_age: Duration::seconds(max_age_secs),
        }
    }

    /// Open a new session with a fresh challenge
    pub async fn open(&self, now: DateTime<Utc>) -> FormSession {
        let session = FormSession::new(generate_session_id(), self.generator.generate(), now);
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());

        tracing::debug!(session_id = %session.id, "Form session opened");

        session
    }

    pub async fn get(&self, id: &str) -> Result<FormSession, GuardError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| GuardError::SessionNotFound(id.to_string()))
    }

    /// Fold interaction counters into the session's log
    pub async fn record(
        &self,
        id: &str,
        batch: &InteractionBatch,
        now: DateTime<Utc>,
    ) -> Result<FormSession, GuardError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| GuardError::SessionNotFound(id.to_string()))?;
        session.interactions.apply(batch, now);
        Ok(session.clone())
    }

    /// Mark a session as sending. Refuses a second concurrent submit.
    pub async fn begin_submit(&self, id: &str) -> Result<FormSession, GuardError> {
        let mut sessions = self.sessions.write().await;
        let session = sessions
            .get_mut(id)
            .ok_or_else(|| GuardError::SessionNotFound(id.to_string()))?;
        if session.in_flight {
            return Err(GuardError::Security(SecurityViolation::InFlight));
        }
        session.in_flight = true;
        Ok(session.clone())
    }

    /// Successful send: start a new form lifetime
    pub async fn complete(&self, id: &str, now: DateTime<Utc>) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.reset(self.generator.generate(), now);
        }
    }

    /// Failed submit: clear the in-flight flag, optionally drawing a new
    /// challenge. Form contents and interactions are kept.
    pub async fn release(&self, id: &str, new_challenge: bool) {
        if let Some(session) = self.sessions.write().await.get_mut(id) {
            session.in_flight = false;
            if new_challenge {
                session.challenge = self.generator.generate();
            }
        }
    }

    /// Drop sessions older than the stale limit. Returns how many were removed.
    pub async fn purge_stale(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| s.in_flight || now - s.started_at <= self.max_age);
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Generate a cryptographically random session ID
fn generate_session_id() -> String {
    use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
    use rand::Rng;

    let mut bytes = [0u8; 16];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Background worker that purges stale sessions until shutdown
pub async fn session_purge_worker(
    store: Arc<SessionStore>,
    interval_secs: u64,
    mut shutdown: tokio::sync::broadcast::Receiver<()>,
) {
    let mut ticker = tokio::time::interval(StdDuration::from_secs(interval_secs));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = store.purge_stale(Utc::now()).await;
                if removed > 0 {
                    let remaining = store.len().await;
                    tracing::debug!(removed, remaining, "Purged stale form sessions");
                }
            }
            _ = shutdown.recv() => {
                tracing::info!("Session purge worker stopping");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap()
    }

    fn store() -> SessionStore {
        SessionStore::new(CaptchaGenerator::default(), 1800)
    }

    #[tokio::test]
    async fn test_open_and_record() {
        let store = store();
        let session = store.open(at(0)).await;
        assert_eq!(session.id.len(), 22);

        let batch = InteractionBatch {
            keystrokes: 4,
            mouse_moves: 2,
            focused: vec![formguard_common::FormField::Name],
        };
        store.record(&session.id, &batch, at(3)).await.unwrap();
        let updated = store.record(&session.id, &batch, at(4)).await.unwrap();
        assert_eq!(updated.interactions.keystrokes, 8);
        assert_eq!(updated.interactions.mouse_moves, 4);
        assert_eq!(updated.interactions.field_focus_count, 2);

        assert!(matches!(
            store.record("missing", &batch, at(4)).await,
            Err(GuardError::SessionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_in_flight_blocks_reentry() {
        let store = store();
        let session = store.open(at(0)).await;

        store.begin_submit(&session.id).await.unwrap();
        assert!(matches!(
            store.begin_submit(&session.id).await,
            Err(GuardError::Security(SecurityViolation::InFlight))
        ));

        store.release(&session.id, false).await;
        let session = tokio_test::assert_ok!(store.begin_submit(&session.id).await);
        assert!(session.in_flight);
    }

    #[tokio::test]
    async fn test_release_keeps_challenge_when_asked() {
        let store = store();
        let session = store.open(at(0)).await;
        store.begin_submit(&session.id).await.unwrap();
        store.release(&session.id, false).await;
        assert_eq!(store.get(&session.id).await.unwrap().challenge, session.challenge);
    }

    #[tokio::test]
    async fn test_complete_resets_session() {
        let store = store();
        let session = store.open(at(0)).await;
        let batch = InteractionBatch {
            keystrokes: 20,
            ..Default::default()
        };
        store.record(&session.id, &batch, at(2)).await.unwrap();
        store.begin_submit(&session.id).await.unwrap();
        store.complete(&session.id, at(10)).await;

        let session = store.get(&session.id).await.unwrap();
        assert_eq!(session.started_at, at(10));
        assert_eq!(session.interactions.keystrokes, 0);
        assert!(!session.in_flight);
    }

    #[tokio::test]
    async fn test_purge_stale() {
        let store = store();
        store.open(at(0)).await;
        store.open(at(1000)).await;
        assert_eq!(store.purge_stale(at(2000)).await, 1);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_purge_worker_runs_until_shutdown() {
        let store = Arc::new(store());
        store.open(at(0)).await;

        let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);
        let handle = tokio::spawn(session_purge_worker(store.clone(), 1, shutdown_rx));

        // The first tick fires immediately and drops the long-expired session
        let purged = tokio::time::timeout(StdDuration::from_secs(5), async {
            while store.len().await > 0 {
                tokio::time::sleep(StdDuration::from_millis(10)).await;
            }
        })
        .await;
        assert!(purged.is_ok());

        shutdown_tx.send(()).unwrap();
        let stopped = tokio::time::timeout(StdDuration::from_secs(5), handle).await;
        assert!(matches!(stopped, Ok(Ok(()))));
    }

    #[test]
    fn test_diagnostics() {
        let mut session = FormSession::new(
            "abc".into(),
            formguard_common::CaptchaChallenge::new("What is 3 + 4?", 7),
            at(0),
        );
        session.interactions.keystrokes = 15;
        session.interactions.mouse_moves = 8;
        session.interactions.field_focus_count = 4;
        assert_eq!(
            session.diagnostics(at(10)),
            "session=10s keystrokes=15 mouse_moves=8 field_focus=4"
        );
    }
}

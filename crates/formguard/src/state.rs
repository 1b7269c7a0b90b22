//! Application state and shared resources.

use anyhow::{Context, Result};
use redis::aio::ConnectionManager;
use std::sync::Arc;

use crate::captcha::CaptchaGenerator;
use crate::config::{AppConfig, HistoryBackend};
use crate::contact::ContactService;
use crate::guard::FormGuard;
use crate::history::{HistoryStore, MemoryHistoryStore, RedisHistoryStore};
use crate::relay::{EmailJsRelay, MailRelay};
use crate::session::SessionStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,

    /// Open form sessions
    pub sessions: Arc<SessionStore>,

    /// Submission flow
    pub contact: Arc<ContactService>,
}

impl AppState {
    /// Create application state, connecting to the configured backends
    pub async fn new(config: AppConfig) -> Result<Self> {
        let history: Arc<dyn HistoryStore> = match config.history.backend {
            HistoryBackend::Memory => Arc::new(MemoryHistoryStore::new()),
            HistoryBackend::Redis => {
                let client = redis::Client::open(config.history.redis_url.as_str())
                    .context("Failed to create Redis client")?;

                let redis = ConnectionManager::new(client)
                    .await
                    .context("Failed to connect to Redis")?;

                // Keys outlive the rate-limit window, nothing more
                let ttl = config.rate_limit.window_secs.max(1) as u64;
                Arc::new(RedisHistoryStore::new(redis, ttl))
            }
        };

        let relay: Arc<dyn MailRelay> = Arc::new(EmailJsRelay::new(config.relay.clone())?);

        Ok(Self::with_parts(config, history, relay))
    }

    /// Assemble state from already-built collaborators
    pub fn with_parts(
        config: AppConfig,
        history: Arc<dyn HistoryStore>,
        relay: Arc<dyn MailRelay>,
    ) -> Self {
        let sessions = Arc::new(SessionStore::new(
            CaptchaGenerator::default(),
            config.timing.max_session_secs,
        ));
        let guard = FormGuard::new(
            config.timing.clone(),
            config.rate_limit.clone(),
            config.behavior.clone(),
        );
        let contact = Arc::new(ContactService::new(guard, sessions.clone(), history, relay));

        Self {
            config: Arc::new(config),
            sessions,
            contact,
        }
    }
}

//! Submission history persistence.
//!
//! History is keyed by a client identifier and survives across form
//! sessions. Identifiers are hashed before they are used as keys.

mod redis_store;

pub use redis_store::RedisHistoryStore;

use std::collections::HashMap;

use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use formguard_common::{GuardError, SubmissionHistory};
use sha2::{Digest, Sha256};
use tokio::sync::RwLock;

/// Key-value persistence for submission history
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load history for a client. Unknown clients start empty.
    async fn load(&self, client_id: &str) -> Result<SubmissionHistory, GuardError>;

    async fn save(&self, client_id: &str, history: &SubmissionHistory) -> Result<(), GuardError>;
}

/// Stable, non-reversible key for a client identifier
pub fn client_key(client_id: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(client_id.as_bytes()))
}

/// Process-local history store
#[derive(Default)]
pub struct MemoryHistoryStore {
    entries: RwLock<HashMap<String, SubmissionHistory>>,
}

impl MemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl HistoryStore for MemoryHistoryStore {
    async fn load(&self, client_id: &str) -> Result<SubmissionHistory, GuardError> {
        Ok(self
            .entries
            .read()
            .await
            .get(&client_key(client_id))
            .copied()
            .unwrap_or_default())
    }

    async fn save(&self, client_id: &str, history: &SubmissionHistory) -> Result<(), GuardError> {
        self.entries
            .write()
            .await
            .insert(client_key(client_id), *history);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn test_client_key_is_stable_and_opaque() {
        let key = client_key("203.0.113.7");
        assert_eq!(key, client_key("203.0.113.7"));
        assert_ne!(key, client_key("203.0.113.8"));
        assert!(!key.contains("203"));
        assert_eq!(key.len(), 43);
    }

    #[tokio::test]
    async fn test_memory_store_roundtrip() {
        let store = MemoryHistoryStore::new();
        assert_eq!(store.load("ana").await.unwrap(), SubmissionHistory::default());

        let history = SubmissionHistory {
            attempt_count: 2,
            last_submit: DateTime::from_timestamp(1_700_000_000, 0),
        };
        tokio_test::assert_ok!(store.save("ana", &history).await);
        assert_eq!(store.load("ana").await.unwrap(), history);
        assert_eq!(store.load("bob").await.unwrap(), SubmissionHistory::default());
    }
}

//! Redis-backed submission history.
//!
//! Each client has two string keys, mirroring what the page keeps in local
//! storage:
//! - `formguard:{client}:attempt_count`
//! - `formguard:{client}:last_submit` (unix seconds)

use async_trait::async_trait;
use chrono::DateTime;
use formguard_common::constants::store_keys;
use formguard_common::{GuardError, SubmissionHistory};
use redis::AsyncCommands;
use redis::aio::ConnectionManager;

use super::{HistoryStore, client_key};

/// Redis history store
#[derive(Clone)]
pub struct RedisHistoryStore {
    /// Redis connection manager (auto-reconnecting)
    redis: ConnectionManager,
    /// Key expiry in seconds
    ttl_secs: u64,
}

impl RedisHistoryStore {
    pub fn new(redis: ConnectionManager, ttl_secs: u64) -> Self {
        Self { redis, ttl_secs }
    }

    fn keys(client_id: &str) -> (String, String) {
        let base = format!("{}{}:", store_keys::PREFIX, client_key(client_id));
        (
            format!("{}{}", base, store_keys::ATTEMPT_COUNT),
            format!("{}{}", base, store_keys::LAST_SUBMIT),
        )
    }
}

fn store_error(err: redis::RedisError) -> GuardError {
    GuardError::Store(err.to_string())
}

/// Decode the two stored strings. Garbage values read as empty history.
fn decode(count: Option<String>, last: Option<String>) -> SubmissionHistory {
    SubmissionHistory {
        attempt_count: count.and_then(|c| c.parse().ok()).unwrap_or(0),
        last_submit: last
            .and_then(|t| t.parse::<i64>().ok())
            .and_then(|secs| DateTime::from_timestamp(secs, 0)),
    }
}

#[async_trait]
impl HistoryStore for RedisHistoryStore {
    async fn load(&self, client_id: &str) -> Result<SubmissionHistory, GuardError> {
        let (count_key, last_key) = Self::keys(client_id);
        let mut conn = self.redis.clone();

        let count: Option<String> = conn.get(&count_key).await.map_err(store_error)?;
        let last: Option<String> = conn.get(&last_key).await.map_err(store_error)?;

        Ok(decode(count, last))
    }

    async fn save(&self, client_id: &str, history: &SubmissionHistory) -> Result<(), GuardError> {
        let (count_key, last_key) = Self::keys(client_id);
        let mut conn = self.redis.clone();

        conn.set_ex::<_, _, ()>(&count_key, history.attempt_count.to_string(), self.ttl_secs)
            .await
            .map_err(store_error)?;

        if let Some(last) = history.last_submit {
            conn.set_ex::<_, _, ()>(&last_key, last.timestamp().to_string(), self.ttl_secs)
                .await
                .map_err(store_error)?;
        }

        tracing::debug!(attempts = history.attempt_count, "Submission history saved");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_layout() {
        let (count_key, last_key) = RedisHistoryStore::keys("client-1");
        let hashed = client_key("client-1");
        assert_eq!(count_key, format!("formguard:{hashed}:attempt_count"));
        assert_eq!(last_key, format!("formguard:{hashed}:last_submit"));
    }

    #[test]
    fn test_decode() {
        let history = decode(Some("3".into()), Some("1700000000".into()));
        assert_eq!(history.attempt_count, 3);
        assert_eq!(history.last_submit.unwrap().timestamp(), 1_700_000_000);

        assert_eq!(decode(None, None), SubmissionHistory::default());
        assert_eq!(
            decode(Some("lots".into()), Some("yesterday".into())),
            SubmissionHistory::default()
        );
    }
}

//! Conversation sessions in Redis.
//!
//! One JSON-encoded `SessionRecord` per user under `session:{user_id}`.
//! Keys carry a TTL of the maximum session age, so Redis drops abandoned
//! flows on its own; `purge_stale` also removes anything older than a cutoff.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use funnel_core::{RepoResult, SessionRecord, SessionStore, UserId};

use crate::pool::RedisPool;

/// Key prefix for conversation sessions
pub const SESSION_PREFIX: &str = "session:";

const SCAN_BATCH: usize = 200;

/// Redis implementation of `SessionStore`
#[derive(Clone)]
pub struct RedisSessionStore {
    pool: RedisPool,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    #[must_use]
    pub fn new(pool: RedisPool, max_age: chrono::Duration) -> Self {
        Self {
            pool,
            ttl_seconds: max_age.num_seconds().max(1) as u64,
        }
    }

    fn key(user_id: UserId) -> String {
        format!("{SESSION_PREFIX}{user_id}")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    #[instrument(skip(self))]
    async fn get(&self, user_id: UserId) -> RepoResult<Option<SessionRecord>> {
        Ok(self.pool.get_json(&Self::key(user_id)).await?)
    }

    #[instrument(skip(self, payload))]
    async fn put(&self, user_id: UserId, step: &str, payload: &serde_json::Value) -> RepoResult<()> {
        let record = SessionRecord {
            user_id,
            step: step.to_string(),
            payload: payload.clone(),
            updated_at: Utc::now(),
        };
        self.pool
            .put_json(&Self::key(user_id), &record, self.ttl_seconds)
            .await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn clear(&self, user_id: UserId) -> RepoResult<()> {
        self.pool.remove(&Self::key(user_id)).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> RepoResult<u64> {
        let keys = self
            .pool
            .keys_matching(&format!("{SESSION_PREFIX}*"), SCAN_BATCH)
            .await?;

        let mut purged = 0;
        for key in keys {
            let record: Option<SessionRecord> = self.pool.get_json(&key).await?;
            if record.is_some_and(|r| r.updated_at < cutoff) && self.pool.remove(&key).await? {
                purged += 1;
            }
        }

        debug!(purged, "Purged stale sessions");
        Ok(purged)
    }
}

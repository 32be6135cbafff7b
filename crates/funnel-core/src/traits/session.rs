//! Session store port
//!
//! One conversation state per user: a step tag plus an opaque JSON payload.
//! `put` is an upsert, so starting a new flow replaces whatever was there.
//! The store never interprets the payload.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::RepoResult;
use crate::value_objects::UserId;

/// Persisted conversation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub step: String,
    pub payload: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Current session, or `None` when no flow is in progress
    async fn get(&self, user_id: UserId) -> RepoResult<Option<SessionRecord>>;

    /// Upsert the session for `user_id`
    async fn put(&self, user_id: UserId, step: &str, payload: &serde_json::Value)
        -> RepoResult<()>;

    /// Remove the session; clearing an absent session is not an error
    async fn clear(&self, user_id: UserId) -> RepoResult<()>;

    /// Delete sessions last updated before `cutoff`, returning how many
    async fn purge_stale(&self, cutoff: DateTime<Utc>) -> RepoResult<u64>;
}

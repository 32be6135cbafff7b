//! Session storage module.
//!
//! Redis-backed implementation of the conversation session store.

mod conversation;

pub use conversation::{RedisSessionStore, SESSION_PREFIX};

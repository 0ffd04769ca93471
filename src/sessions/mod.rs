//! Anonymous browser sessions
//!
//! A session is identified by an opaque cookie value and holds small integer
//! counters. The store is pluggable: Redis in production, process memory for
//! tests and single-node demos.

pub mod memory;
pub mod redis;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    config::{SessionBackend, SessionConfig},
    error::AppResult,
};

/// Session key counting index page views
pub const VISITS_KEY: &str = "num_visits";

/// Identifier carried by the session cookie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Parse a cookie value; anything that is not a UUID is treated as absent
    pub fn parse(value: &str) -> Option<Self> {
        Uuid::parse_str(value).ok().map(Self)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Read a counter; `None` when the session or key is unknown
    async fn get_counter(&self, session: &SessionId, key: &str) -> AppResult<Option<i64>>;

    /// Write a counter, refreshing the session lifetime
    async fn set_counter(&self, session: &SessionId, key: &str, value: i64) -> AppResult<()>;

    /// Round-trip to the backing store
    async fn ping(&self) -> AppResult<()>;
}

/// Open the session store selected by configuration
pub async fn connect(config: &SessionConfig) -> AppResult<Arc<dyn SessionStore>> {
    match config.backend {
        SessionBackend::Redis => {
            let store = redis::RedisSessionStore::new(&config.redis_url, config.ttl_seconds).await?;
            tracing::info!("Connected to Redis session store");
            Ok(Arc::new(store))
        }
        SessionBackend::Memory => {
            tracing::info!("Using in-memory session store");
            Ok(Arc::new(memory::MemorySessionStore::new(config.ttl_seconds)))
        }
    }
}

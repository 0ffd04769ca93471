//! Redis-backed session store

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client};

use super::{SessionId, SessionStore};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisSessionStore {
    conn: ConnectionManager,
    ttl_seconds: u64,
}

impl RedisSessionStore {
    /// Connect to Redis and check the connection with a PING
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        let mut conn = ConnectionManager::new(client)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { conn, ttl_seconds })
    }

    fn key(session: &SessionId, key: &str) -> String {
        format!("session:{}:{}", session, key)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get_counter(&self, session: &SessionId, key: &str) -> AppResult<Option<i64>> {
        let mut conn = self.conn.clone();
        let value: Option<i64> = conn.get(Self::key(session, key)).await?;
        Ok(value)
    }

    async fn set_counter(&self, session: &SessionId, key: &str, value: i64) -> AppResult<()> {
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(Self::key(session, key), value, self.ttl_seconds)
            .await?;
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.conn.clone();
        redis::cmd("PING").query_async::<_, String>(&mut conn).await?;
        Ok(())
    }
}

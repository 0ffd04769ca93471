//! In-process session store

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{SessionId, SessionStore};
use crate::error::AppResult;

struct Entry {
    value: i64,
    expires_at: Instant,
}

pub struct MemorySessionStore {
    ttl: Duration,
    entries: Mutex<HashMap<(SessionId, String), Entry>>,
}

impl MemorySessionStore {
    pub fn new(ttl_seconds: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_seconds),
            entries: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_counter(&self, session: &SessionId, key: &str) -> AppResult<Option<i64>> {
        let mut entries = self.entries.lock().await;
        let slot = (*session, key.to_string());
        match entries.get(&slot) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value)),
            Some(_) => {
                entries.remove(&slot);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn set_counter(&self, session: &SessionId, key: &str, value: i64) -> AppResult<()> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            (*session, key.to_string()),
            Entry {
                value,
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn counters_are_per_session() {
        let store = MemorySessionStore::new(60);
        let a = SessionId::generate();
        let b = SessionId::generate();

        store.set_counter(&a, "num_visits", 3).await.unwrap();
        assert_eq!(store.get_counter(&a, "num_visits").await.unwrap(), Some(3));
        assert_eq!(store.get_counter(&b, "num_visits").await.unwrap(), None);
        assert_eq!(store.get_counter(&a, "other").await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_counters_read_as_absent() {
        let store = MemorySessionStore::new(0);
        let session = SessionId::generate();
        store.set_counter(&session, "num_visits", 5).await.unwrap();
        assert_eq!(store.get_counter(&session, "num_visits").await.unwrap(), None);
    }

    #[tokio::test]
    async fn writes_purge_expired_sessions() {
        let store = MemorySessionStore::new(0);
        for _ in 0..100 {
            store
                .set_counter(&SessionId::generate(), "num_visits", 2)
                .await
                .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
        store
            .set_counter(&SessionId::generate(), "num_visits", 2)
            .await
            .unwrap();
        assert_eq!(store.entries.lock().await.len(), 1);
    }
}

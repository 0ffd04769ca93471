//! Catalog summary service

use std::sync::Arc;

use crate::{
    error::AppResult,
    models::{
        stats::{CatalogCounts, CatalogSummary},
        LoanStatus,
    },
    repository::Repository,
    sessions::{SessionId, SessionStore, VISITS_KEY},
};

#[derive(Clone)]
pub struct StatsService {
    repository: Repository,
    sessions: Arc<dyn SessionStore>,
}

impl StatsService {
    pub fn new(repository: Repository, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            repository,
            sessions,
        }
    }

    /// Counts of books, copies, available copies and authors
    pub async fn counts(&self) -> AppResult<CatalogCounts> {
        Ok(CatalogCounts {
            num_books: self.repository.books.count().await?,
            num_instances: self.repository.instances.count(None).await?,
            num_instances_available: self
                .repository
                .instances
                .count(Some(LoanStatus::Available))
                .await?,
            num_authors: self.repository.authors.count().await?,
        })
    }

    /// Count this visit and return the number of the visit being served.
    ///
    /// An unknown session reads as 1; the stored value is then bumped.
    /// The read and the write are not atomic.
    pub async fn record_visit(&self, session: &SessionId) -> AppResult<i64> {
        let visits = self
            .sessions
            .get_counter(session, VISITS_KEY)
            .await?
            .unwrap_or(1);
        self.sessions
            .set_counter(session, VISITS_KEY, visits + 1)
            .await?;
        Ok(visits)
    }

    /// Home page context
    pub async fn summary(&self, session: &SessionId) -> AppResult<CatalogSummary> {
        let counts = self.counts().await?;
        let num_visits = self.record_visit(session).await?;
        Ok(CatalogSummary { counts, num_visits })
    }

    /// Check both backing stores answer
    pub async fn ping(&self) -> AppResult<()> {
        self.repository.books.count().await?;
        self.sessions.ping().await
    }
}

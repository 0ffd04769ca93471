//! Business logic services

pub mod auth;
pub mod catalog;
pub mod loans;
pub mod stats;

use std::sync::Arc;

use crate::{config::AuthConfig, repository::Repository, sessions::SessionStore};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub catalog: catalog::CatalogService,
    pub loans: loans::LoansService,
    pub stats: stats::StatsService,
}

impl Services {
    /// Create all services over the given repository and session store
    pub fn new(
        repository: Repository,
        sessions: Arc<dyn SessionStore>,
        auth_config: AuthConfig,
    ) -> Self {
        Self {
            auth: auth::AuthService::new(repository.clone(), auth_config),
            catalog: catalog::CatalogService::new(repository.clone()),
            loans: loans::LoansService::new(repository.clone()),
            stats: stats::StatsService::new(repository, sessions),
        }
    }
}

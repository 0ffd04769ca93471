//! LocalLibrary catalog server
//!
//! A REST JSON API over a small library catalog: books, authors, genres,
//! languages and the circulating copies of each book, with loan renewal
//! for librarians and a per-session visit counter on the home page.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;
pub mod sessions;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

use config::DatabaseBackend;
use repository::Repository;
use services::Services;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<Services>,
}

impl AppState {
    /// Open the configured database and session store and build the services
    pub async fn connect(config: AppConfig) -> AppResult<Self> {
        let repository = match config.database.backend {
            DatabaseBackend::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(config.database.max_connections)
                    .min_connections(config.database.min_connections)
                    .connect(&config.database.url)
                    .await?;
                tracing::info!("Connected to database");

                sqlx::migrate!("./migrations")
                    .run(&pool)
                    .await
                    .map_err(|e| AppError::Internal(format!("Failed to run migrations: {}", e)))?;
                tracing::info!("Database migrations completed");

                Repository::new(pool)
            }
            DatabaseBackend::Memory => {
                tracing::warn!("Using in-memory catalog; data is lost on shutdown");
                Repository::in_memory()
            }
        };

        let sessions = sessions::connect(&config.sessions).await?;

        Ok(Self::new(config, repository, sessions))
    }

    /// Assemble state from already opened collaborators
    pub fn new(
        config: AppConfig,
        repository: Repository,
        sessions: Arc<dyn sessions::SessionStore>,
    ) -> Self {
        let services = Services::new(repository, sessions, config.auth.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}

//! Application state shared across all handlers.

use std::sync::Arc;

use sqlx::PgPool;

use kinnect_auth::jwt::JwtDecoder;
use kinnect_core::config::AppConfig;
use kinnect_database::repositories::{MessageRepository, UserRepository};
use kinnect_entity::store::{MessageStore, UserStore};
use kinnect_realtime::ChatEngine;

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`. All fields are
/// cheaply cloneable.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// PostgreSQL connection pool (health checks).
    pub db_pool: PgPool,
    /// JWT token decoder and validator.
    pub jwt_decoder: Arc<JwtDecoder>,
    /// The realtime chat engine.
    pub engine: ChatEngine,
    /// Durable message store.
    pub messages: Arc<dyn MessageStore>,
    /// User account store.
    pub users: Arc<dyn UserStore>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.config)
            .finish()
    }
}

impl AppState {
    /// Build the state over Postgres-backed stores.
    pub fn new(config: AppConfig, db_pool: PgPool) -> Self {
        let messages: Arc<dyn MessageStore> = Arc::new(MessageRepository::new(db_pool.clone()));
        let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(db_pool.clone()));
        Self::with_stores(config, db_pool, messages, users)
    }

    /// Build the state over externally provided stores.
    pub fn with_stores(
        config: AppConfig,
        db_pool: PgPool,
        messages: Arc<dyn MessageStore>,
        users: Arc<dyn UserStore>,
    ) -> Self {
        let jwt_decoder = Arc::new(JwtDecoder::new(&config.auth));
        let engine = ChatEngine::new(config.realtime.clone(), messages.clone(), users.clone());

        Self {
            config: Arc::new(config),
            db_pool,
            jwt_decoder,
            engine,
            messages,
            users,
        }
    }
}

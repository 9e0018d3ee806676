//! Chat schema migrations.
//!
//! Applies the embedded SQL migrations (users, messages, the status and
//! kind enums, conversation indexes) at startup, before the server accepts
//! connections.

use sqlx::PgPool;
use tracing::info;

use kinnect_core::error::{AppError, ErrorKind};

/// Bring the chat schema up to date.
pub async fn run_migrations(pool: &PgPool) -> Result<(), AppError> {
    info!("Applying chat schema migrations");

    sqlx::migrate!("../../migrations")
        .run(pool)
        .await
        .map_err(|e| {
            AppError::with_source(
                ErrorKind::Database,
                format!("Chat schema migration failed: {e}"),
                e,
            )
        })?;

    info!("Chat schema is up to date");
    Ok(())
}

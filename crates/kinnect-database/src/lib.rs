//! PostgreSQL persistence layer for Kinnect.
//!
//! Provides the connection pool wrapper, the migration runner, and the
//! repository implementations of the storage traits from `kinnect-entity`.

pub mod connection;
pub mod migration;
pub mod repositories;

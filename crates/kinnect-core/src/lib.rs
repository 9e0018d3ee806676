//! Core building blocks shared by every Kinnect crate.
//!
//! Contains the unified error type, configuration schemas, and
//! strongly-typed identifiers. Domain models live in `kinnect-entity`.

pub mod config;
pub mod error;
pub mod result;
pub mod types;

pub use error::{AppError, ErrorKind};
pub use result::AppResult;

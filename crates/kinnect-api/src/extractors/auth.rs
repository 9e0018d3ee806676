//! `AuthUser` extractor: validates the bearer token and injects the
//! caller's identity into handlers.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

use kinnect_core::error::AppError;
use kinnect_core::types::UserId;

use crate::error::ApiError;
use crate::state::AppState;

/// The authenticated caller, extracted from the `Authorization` header.
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// Verified user id (token subject).
    pub user_id: UserId,
    /// Username carried in the token.
    pub username: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::authentication("Missing Authorization header"))?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::authentication("Expected a bearer token"))?;

        let claims = state.jwt_decoder.decode(token)?;
        Ok(Self {
            user_id: claims.user_id(),
            username: claims.username,
        })
    }
}

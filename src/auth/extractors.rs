use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use super::services::JwtKeys;
use crate::error::AppError;

/// Extracts and validates the bearer token, returning the user ID.
pub struct AuthUser(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Authorization header is missing".into()))?;

        let token = bearer_token(auth_header)?;

        let claims = JwtKeys::from_ref(state).verify(token).map_err(|e| {
            warn!(reason = %e, "bearer token rejected");
            AppError::from(e)
        })?;

        Ok(AuthUser(claims.sub))
    }
}

fn bearer_token(header: &str) -> Result<&str, AppError> {
    if !header.starts_with("Bearer") {
        return Err(AppError::Unauthorized(
            "Invalid authorization format. Expected: Bearer <token>".into(),
        ));
    }
    // the token is the word after the first space
    header
        .split(' ')
        .nth(1)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Token is missing".into()))
}

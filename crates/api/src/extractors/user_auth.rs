//! Bearer token authentication extractor.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use shared::jwt::JwtError;
use tracing::debug;
use uuid::Uuid;

use crate::app::AppState;
use crate::error::ApiError;

/// The caller identified by the `sub` claim of a verified access token.
#[derive(Debug, Clone)]
pub struct UserAuth {
    pub user_id: Uuid,
    /// Token identifier, logged for correlation.
    pub jti: String,
}

#[async_trait]
impl FromRequestParts<AppState> for UserAuth {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".to_string()))?;

        let token = bearer_token(header).ok_or_else(|| {
            ApiError::Unauthorized("Invalid Authorization header format".to_string())
        })?;

        let claims = state.jwt.verify(token).map_err(|e| match e {
            JwtError::TokenExpired => ApiError::Unauthorized("Token has expired".to_string()),
            _ => ApiError::Unauthorized("Invalid or expired token".to_string()),
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| ApiError::Unauthorized("Invalid token subject".to_string()))?;
        debug!(user_id = %user_id, jti = %claims.jti, "Authenticated request");

        Ok(UserAuth {
            user_id,
            jti: claims.jti,
        })
    }
}

fn bearer_token(header: &str) -> Option<&str> {
    header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

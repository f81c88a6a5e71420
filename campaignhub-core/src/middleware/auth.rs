//! Bearer token authentication extractor
//!
//! `AuthUser` resolves the `Authorization: Bearer <token>` header against the
//! personal access token store and yields the current principal.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::domain::StringUuid;
use crate::error::AppError;
use crate::state::HasServices;

/// Authenticated principal for the current request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub user_id: StringUuid,
    pub email: String,
    /// The user's advertiser, if one exists
    pub advertiser_id: Option<StringUuid>,
    /// Token used for this request; logout revokes it
    pub token_id: StringUuid,
}

/// Authentication errors
#[derive(Debug, Clone)]
pub enum AuthError {
    /// No Authorization header present
    MissingToken,
    /// Invalid Authorization header format
    InvalidHeader(String),
    /// Unknown, revoked or expired token
    InvalidToken(String),
    /// Token lookup failed for a reason other than the token itself
    Unavailable,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let message = match self {
            AuthError::MissingToken => "Unauthenticated.".to_string(),
            AuthError::InvalidHeader(_) => "Invalid authorization header".to_string(),
            AuthError::InvalidToken(msg) => msg,
            AuthError::Unavailable => {
                return AppError::Internal(anyhow::anyhow!("token lookup failed")).into_response()
            }
        };

        let body = serde_json::json!({
            "error": message,
            "code": "UNAUTHORIZED"
        });

        (StatusCode::UNAUTHORIZED, axum::Json(body)).into_response()
    }
}

/// Extract the raw token from a `Bearer` Authorization header
fn extract_bearer_token(headers: &axum::http::HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingToken)?
        .to_str()
        .map_err(|_| AuthError::InvalidHeader("Invalid header encoding".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .ok_or_else(|| {
            AuthError::InvalidHeader("Authorization header must use Bearer scheme".to_string())
        })?;

    if token.is_empty() {
        return Err(AuthError::MissingToken);
    }
    Ok(token)
}

impl<S> FromRequestParts<S> for AuthUser
where
    S: HasServices + Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers)?;

        state
            .auth_service()
            .authenticate(token)
            .await
            .map_err(|e| match e {
                AppError::Unauthorized(msg) => AuthError::InvalidToken(msg),
                other => {
                    tracing::error!("Token authentication failed: {}", other);
                    AuthError::Unavailable
                }
            })
    }
}

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};
use tracing::debug;

use crate::AppState;
use crate::error::ApiError;

pub const X_AUTHORIZATION: &str = "x-authorization";

/// The caller, resolved from their session token. Rejects with 401 when the
/// token is missing or matches no logged-in user.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
}

/// Like [`AuthUser`] but never rejects; for endpoints that show more to the
/// signed-in owner.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Token from `X-Authorization: <token>` or `Authorization: Bearer <token>`.
pub fn token_from_headers(headers: &HeaderMap) -> Option<&str> {
    if let Some(token) = headers.get(X_AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        return Some(token.trim()).filter(|t| !t.is_empty());
    }
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn resolve(parts: &Parts, state: &AppState) -> Result<Option<AuthUser>, ApiError> {
    let Some(token) = token_from_headers(&parts.headers) else {
        return Ok(None);
    };
    let user = state.db.get_user_by_token(token)?;
    if user.is_none() {
        debug!("Rejected unknown session token");
    }
    Ok(user.map(|u| AuthUser { id: u.id }))
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state)?.ok_or_else(ApiError::unauthorized)
    }
}

impl FromRequestParts<AppState> for MaybeAuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(Self(resolve(parts, state)?))
    }
}

/// 403 unless the caller owns the resource.
pub fn require_owner(user: &AuthUser, owner_id: i64, message: &str) -> Result<(), ApiError> {
    if user.id != owner_id {
        debug!("User {} denied: not the owner ({})", user.id, owner_id);
        return Err(ApiError::forbidden(message));
    }
    Ok(())
}

// ============================
// crates/backend-lib/src/middleware/auth.rs
// ============================
//! Access guard for protected routes.
//!
//! A request starts unauthenticated. A valid, unexpired bearer token whose
//! subject still exists moves it to authenticated and binds the user record
//! to the request; anything else ends the request with 401.
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::debug;

use crate::error::AppError;
use crate::metrics::AUTH_REJECTED;
use crate::models::User;
use crate::storage::Storage;
use crate::AppState;

/// The authenticated caller, bound by [`require_auth`]
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Extract the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let value = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;

    let (scheme, token) = value
        .split_once(' ')
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?;
    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(AppError::Unauthorized("Invalid authorization format".to_string()));
    }
    Ok(token)
}

async fn authenticate<S: Storage>(state: &AppState<S>, headers: &HeaderMap) -> Result<User, AppError> {
    let claims = state.tokens.verify(bearer_token(headers)?)?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| AppError::Unauthorized("Invalid token subject".to_string()))?;

    state
        .storage
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown token subject".to_string()))
}

/// Guard middleware: rejects unauthenticated requests, binds [`CurrentUser`] otherwise
pub async fn require_auth<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = match authenticate(&state, request.headers()).await {
        Ok(user) => user,
        Err(e) => {
            counter!(AUTH_REJECTED).increment(1);
            debug!(error = %e, path = %request.uri().path(), "request rejected by access guard");
            return Err(e);
        },
    };

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("Not authenticated".to_string()))
    }
}

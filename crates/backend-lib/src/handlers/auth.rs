// ============================
// crates/backend-lib/src/handlers/auth.rs
// ============================
//! `/auth` routes. These bypass the access guard.
use std::sync::Arc;

use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use notes_common::{AuthRequest, TokenResponse};

use crate::error::AppError;
use crate::storage::Storage;
use crate::validation::{parse_body, validate_auth_request};
use crate::AppState;

/// `POST /auth/signup`
pub async fn sign_up<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<(StatusCode, Json<TokenResponse>), AppError> {
    let credentials = validate_auth_request(parse_body::<AuthRequest>(&body)?)?;
    let token = state.auth.sign_up(&credentials).await?;
    Ok((StatusCode::CREATED, Json(token)))
}

/// `POST /auth/signin`
pub async fn sign_in<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    body: Bytes,
) -> Result<Json<TokenResponse>, AppError> {
    let credentials = validate_auth_request(parse_body::<AuthRequest>(&body)?)?;
    let token = state.auth.sign_in(&credentials).await?;
    Ok(Json(token))
}

// ============================
// crates/backend-lib/src/handlers/users.rs
// ============================
//! `/users` routes (guarded).
use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};
use notes_common::{EditUserRequest, UserView};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::storage::Storage;
use crate::validation::{parse_body, validate_edit_user};
use crate::AppState;

/// `GET /users/me`
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserView> {
    Json(UserView::from(&user))
}

/// `PATCH /users`
pub async fn edit<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<Json<UserView>, AppError> {
    let patch = validate_edit_user(parse_body::<EditUserRequest>(&body)?)?;
    let updated = state.users.edit(user.id, patch).await?;
    Ok(Json(UserView::from(&updated)))
}

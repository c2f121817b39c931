// ============================
// crates/backend-lib/src/handlers/notes.rs
// ============================
//! `/notes` routes (guarded). Notes the caller does not own come back as
//! `null` rather than 404.
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use notes_common::{CreateNoteRequest, DeleteResponse, EditNoteRequest, NoteView};

use crate::error::AppError;
use crate::middleware::CurrentUser;
use crate::storage::Storage;
use crate::validation::{parse_body, validate_create_note, validate_edit_note, validate_note_id};
use crate::AppState;

/// `GET /notes`
pub async fn list<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<NoteView>>, AppError> {
    let notes = state.notes.list(user.id).await?;
    Ok(Json(notes.iter().map(NoteView::from).collect()))
}

/// `GET /notes/{id}`
pub async fn get<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<Option<NoteView>>, AppError> {
    let id = validate_note_id(&id)?;
    let note = state.notes.get(user.id, id).await?;
    Ok(Json(note.as_ref().map(NoteView::from)))
}

/// `POST /notes`
pub async fn create<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    body: Bytes,
) -> Result<(StatusCode, Json<NoteView>), AppError> {
    let new = validate_create_note(parse_body::<CreateNoteRequest>(&body)?)?;
    let note = state.notes.create(user.id, new).await?;
    Ok((StatusCode::CREATED, Json(NoteView::from(&note))))
}

/// `PATCH /notes/{id}`
pub async fn edit<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<Option<NoteView>>, AppError> {
    let id = validate_note_id(&id)?;
    let patch = validate_edit_note(parse_body::<EditNoteRequest>(&body)?)?;
    let note = state.notes.edit(user.id, id, patch).await?;
    Ok(Json(note.as_ref().map(NoteView::from)))
}

/// `DELETE /notes/{id}`
pub async fn delete<S: Storage>(
    State(state): State<Arc<AppState<S>>>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = validate_note_id(&id)?;
    let deleted = state.notes.delete(user.id, id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

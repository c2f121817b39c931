// ================
// common/src/lib.rs
// ================
//! Common types and structures
//! exchanged between notes API clients and the server.
//! Request bodies keep every field optional so that the server can report
//! missing fields as validation errors instead of deserialization failures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a user record
pub type UserId = u64;

/// Identifier of a note record
pub type NoteId = u64;

/// Body of `POST /auth/signup` and `POST /auth/signin`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct AuthRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Response carrying a freshly issued access token
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TokenResponse {
    pub token: String,
}

/// Body of `PATCH /users`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EditUserRequest {
    pub email: Option<String>,
    #[serde(alias = "firstName")]
    pub firstname: Option<String>,
    #[serde(alias = "lastName")]
    pub lastname: Option<String>,
}

/// Body of `POST /notes`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct CreateNoteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Body of `PATCH /notes/{id}`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct EditNoteRequest {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Public view of a user. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public view of a note
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
    pub id: NoteId,
    pub user_id: UserId,
    pub title: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Outcome of `DELETE /notes/{id}`
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteResponse {
    /// Whether a note owned by the caller was removed
    pub deleted: bool,
}

/// Error envelope returned by every failing endpoint
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

/// Error details
/// # Fields
/// * `code` - Stable machine readable code, e.g. `VAL_001`
/// * `message` - Human readable message
/// * `fields` - Per-field messages for validation failures
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldMessage>,
}

/// A validation message bound to one request field
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FieldMessage {
    pub field: String,
    pub message: String,
}

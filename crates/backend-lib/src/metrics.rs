// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const AUTH_SIGNUP: &str = "auth.signup";
pub const AUTH_SIGNUP_CONFLICT: &str = "auth.signup_conflict";
pub const AUTH_SIGNIN: &str = "auth.signin";
pub const AUTH_SIGNIN_FAILED: &str = "auth.signin_failed";
pub const AUTH_REJECTED: &str = "auth.rejected";
pub const NOTE_CREATED: &str = "note.created";
pub const NOTE_UPDATED: &str = "note.updated";
pub const NOTE_DELETED: &str = "note.deleted";
pub const USER_UPDATED: &str = "user.updated";

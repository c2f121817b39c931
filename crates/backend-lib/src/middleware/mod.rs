// crates/backend-lib/src/middleware/mod.rs

//! Middleware for the notes API.

pub mod auth;

pub use auth::{require_auth, CurrentUser};

#[cfg(test)]
mod tests;

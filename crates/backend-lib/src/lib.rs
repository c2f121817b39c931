// ============================
// notes-backend-lib/src/lib.rs
// ============================
//! Core library of the notes backend: authentication, owner-scoped notes
//! and the HTTP surface over them.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod notes;
pub mod router;
pub mod storage;
pub mod users;
pub mod validation;

use std::sync::Arc;

use crate::auth::{AuthService, DefaultAuth, JwtIssuer, TokenIssuer};
use crate::config::Settings;
use crate::notes::NoteService;
use crate::storage::Storage;
use crate::users::UserService;

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState<S> {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Token signer/verifier used by the access guard
    pub tokens: Arc<dyn TokenIssuer>,
    /// Profile operations
    pub users: UserService<S>,
    /// Owner-scoped note operations
    pub notes: NoteService<S>,
    /// Storage backend
    pub storage: S,
}

impl<S: Storage> AppState<S> {
    /// Create a new application state, signing tokens with the configured secret
    pub fn new(storage: S, config: &Settings) -> anyhow::Result<Self> {
        config.validate()?;
        let tokens = Arc::new(JwtIssuer::from_settings(&config.token));
        Ok(Self::with_token_issuer(storage, tokens))
    }

    /// Create a new application state around an existing token issuer
    pub fn with_token_issuer(storage: S, tokens: Arc<dyn TokenIssuer>) -> Self {
        let auth = Arc::new(DefaultAuth::new(storage.clone(), tokens.clone()));
        Self {
            auth,
            tokens,
            users: UserService::new(storage.clone()),
            notes: NoteService::new(storage.clone()),
            storage,
        }
    }
}

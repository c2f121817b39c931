use async_trait::async_trait;
use notes_common::{TokenResponse, UserId};

use crate::error::AppError;
use crate::validation::Credentials;

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new account and sign it in
    async fn sign_up(&self, credentials: &Credentials) -> Result<TokenResponse, AppError>;
    /// Check credentials and issue a token
    async fn sign_in(&self, credentials: &Credentials) -> Result<TokenResponse, AppError>;
    fn issue_token(&self, user_id: UserId, email: &str) -> Result<TokenResponse, AppError>;
}

// ============================
// notes-backend-lib/src/users.rs
// ============================
//! Profile operations on the authenticated user.
use metrics::counter;
use notes_common::UserId;
use tracing::{info, instrument};

use crate::error::AppError;
use crate::metrics::USER_UPDATED;
use crate::models::{User, UserPatch};
use crate::storage::UserStore;

#[derive(Clone)]
pub struct UserService<S> {
    store: S,
}

impl<S: UserStore> UserService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Apply a partial profile update. A taken email yields `EmailExists`.
    #[instrument(skip(self, patch))]
    pub async fn edit(&self, id: UserId, patch: UserPatch) -> Result<User, AppError> {
        let user = self
            .store
            .update_user(id, patch)
            .await?
            .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;
        counter!(USER_UPDATED).increment(1);
        info!("profile updated");
        Ok(user)
    }
}

use std::sync::Arc;

use async_trait::async_trait;
use metrics::counter;
use notes_common::{TokenResponse, UserId};
use tracing::{info, instrument, warn};

use super::{hash_password_secure, verify_dummy, verify_password, AuthService, TokenIssuer};
use crate::error::AppError;
use crate::metrics::{AUTH_SIGNIN, AUTH_SIGNIN_FAILED, AUTH_SIGNUP, AUTH_SIGNUP_CONFLICT};
use crate::models::NewUser;
use crate::storage::UserStore;
use crate::validation::Credentials;

pub struct DefaultAuth<U> {
    users: U,
    tokens: Arc<dyn TokenIssuer>,
}

impl<U: UserStore> DefaultAuth<U> {
    pub fn new(users: U, tokens: Arc<dyn TokenIssuer>) -> Self {
        Self { users, tokens }
    }
}

#[async_trait]
impl<U: UserStore> AuthService for DefaultAuth<U> {
    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn sign_up(&self, credentials: &Credentials) -> Result<TokenResponse, AppError> {
        let mut plain = credentials.password.clone();
        let hash = tokio::task::spawn_blocking(move || hash_password_secure(&mut plain))
            .await?
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let new = NewUser {
            email: credentials.email.clone(),
            hash,
        };
        // only the duplicate-email violation becomes a conflict, anything else propagates
        let user = match self.users.create_user(new).await.map_err(AppError::from) {
            Ok(user) => user,
            Err(AppError::EmailExists) => {
                counter!(AUTH_SIGNUP_CONFLICT).increment(1);
                warn!("sign-up rejected, email already registered");
                return Err(AppError::EmailExists);
            },
            Err(e) => return Err(e),
        };

        counter!(AUTH_SIGNUP).increment(1);
        info!(user_id = user.id, "user signed up");
        self.issue_token(user.id, &user.email)
    }

    #[instrument(skip_all, fields(email = %credentials.email))]
    async fn sign_in(&self, credentials: &Credentials) -> Result<TokenResponse, AppError> {
        let user = self.users.find_user_by_email(&credentials.email).await?;

        let hash = user.as_ref().map(|u| u.hash.clone());
        let mut plain = credentials.password.clone();
        let matches = tokio::task::spawn_blocking(move || {
            let ok = match &hash {
                Some(hash) => verify_password(hash, &plain),
                None => verify_dummy(&plain),
            };
            zeroize::Zeroize::zeroize(&mut plain);
            ok
        })
        .await?;

        let Some(user) = user else {
            counter!(AUTH_SIGNIN_FAILED).increment(1);
            info!("sign-in failed, unknown email");
            return Err(AppError::InvalidCredentials);
        };
        if !matches {
            counter!(AUTH_SIGNIN_FAILED).increment(1);
            info!(user_id = user.id, "sign-in failed, password mismatch");
            return Err(AppError::InvalidCredentials);
        }

        counter!(AUTH_SIGNIN).increment(1);
        info!(user_id = user.id, "user signed in");
        self.issue_token(user.id, &user.email)
    }

    fn issue_token(&self, user_id: UserId, email: &str) -> Result<TokenResponse, AppError> {
        let token = self.tokens.issue(user_id, email)?;
        Ok(TokenResponse { token })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::JwtIssuer;
    use crate::models::{NewUser, User, UserPatch};
    use crate::storage::{MemoryStorage, StorageError, StorageResult};
    use crate::validation::{validate_auth_request, Credentials};
    use notes_common::AuthRequest;
    use std::time::Duration;

    fn issuer() -> Arc<JwtIssuer> {
        Arc::new(JwtIssuer::new(b"test-secret", Duration::from_secs(900)))
    }

    fn creds(email: &str, password: &str) -> Credentials {
        validate_auth_request(AuthRequest {
            email: Some(email.to_string()),
            password: Some(password.to_string()),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let tokens = issuer();
        let store = MemoryStorage::new();
        let auth = DefaultAuth::new(store.clone(), tokens.clone());

        let signed_up = auth.sign_up(&creds("foo@baz.com", "foobaz")).await.unwrap();
        let claims = tokens.verify(&signed_up.token).unwrap();
        assert_eq!(claims.email, "foo@baz.com");

        let user = store.find_user_by_email("foo@baz.com").await.unwrap().unwrap();
        assert_eq!(claims.user_id(), Some(user.id));
        assert_ne!(user.hash, "foobaz");

        let signed_in = auth.sign_in(&creds("foo@baz.com", "foobaz")).await.unwrap();
        let claims = tokens.verify(&signed_in.token).unwrap();
        assert_eq!(claims.user_id(), Some(user.id));
        assert_eq!(claims.email, "foo@baz.com");
    }

    #[tokio::test]
    async fn test_duplicate_sign_up_conflicts() {
        let store = MemoryStorage::new();
        let auth = DefaultAuth::new(store.clone(), issuer());

        auth.sign_up(&creds("foo@baz.com", "foobaz")).await.unwrap();
        let err = auth.sign_up(&creds("foo@baz.com", "other")).await.unwrap_err();
        assert!(matches!(err, AppError::EmailExists));

        // the original password still works, so nothing was overwritten
        assert!(auth.sign_in(&creds("foo@baz.com", "foobaz")).await.is_ok());
        assert!(auth.sign_in(&creds("foo@baz.com", "other")).await.is_err());
    }

    #[tokio::test]
    async fn test_sign_in_failures_are_indistinguishable() {
        let auth = DefaultAuth::new(MemoryStorage::new(), issuer());
        auth.sign_up(&creds("foo@baz.com", "foobaz")).await.unwrap();

        let wrong_password = auth.sign_in(&creds("foo@baz.com", "nope")).await.unwrap_err();
        let unknown_email = auth.sign_in(&creds("who@baz.com", "foobaz")).await.unwrap_err();

        assert!(matches!(wrong_password, AppError::InvalidCredentials));
        assert!(matches!(unknown_email, AppError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
        assert_eq!(wrong_password.status_code(), unknown_email.status_code());
    }

    #[tokio::test]
    async fn test_unknown_email_pays_for_a_hash_check() {
        let auth = DefaultAuth::new(MemoryStorage::new(), issuer());
        auth.sign_up(&creds("foo@baz.com", "foobaz")).await.unwrap();
        // warm the throwaway hash
        auth.sign_in(&creds("who@baz.com", "foobaz")).await.unwrap_err();

        let started = std::time::Instant::now();
        auth.sign_in(&creds("foo@baz.com", "nope")).await.unwrap_err();
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        auth.sign_in(&creds("who@baz.com", "foobaz")).await.unwrap_err();
        let unknown_email = started.elapsed();

        assert!(
            unknown_email * 4 >= wrong_password,
            "unknown email took {unknown_email:?}, wrong password took {wrong_password:?}"
        );
    }

    /// Store whose inserts always fail with an IO error
    struct BrokenStore;

    #[async_trait]
    impl UserStore for BrokenStore {
        async fn find_user(&self, _id: UserId) -> StorageResult<Option<User>> {
            Ok(None)
        }

        async fn find_user_by_email(&self, _email: &str) -> StorageResult<Option<User>> {
            Ok(None)
        }

        async fn create_user(&self, _new: NewUser) -> StorageResult<User> {
            Err(StorageError::Io(std::io::Error::other("disk full")))
        }

        async fn update_user(&self, _id: UserId, _patch: UserPatch) -> StorageResult<Option<User>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_sign_up_propagates_store_failures() {
        let auth = DefaultAuth::new(BrokenStore, issuer());
        let err = auth.sign_up(&creds("foo@baz.com", "foobaz")).await.unwrap_err();
        assert!(matches!(err, AppError::Storage(StorageError::Io(_))));
    }
}

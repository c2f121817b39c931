// ============================
// notes-backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use std::sync::LazyLock;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::Rng;
use zeroize::Zeroize;

/// Salt size in bytes
const SALT_BYTES: usize = 16;

fn salt() -> anyhow::Result<SaltString> {
    let mut bytes = [0u8; SALT_BYTES];
    rand::rng().fill(&mut bytes);
    SaltString::encode_b64(&bytes).map_err(|e| anyhow::anyhow!("failed to encode salt: {e}"))
}

/// Hash a password using Argon2id, returning a PHC string
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = salt()?;
    let hash = Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("failed to hash password: {e}"))?
        .to_string();
    Ok(hash)
}

/// Verify a password against a hash. Malformed hashes never verify.
pub fn verify_password(hash: &str, plain: &str) -> bool {
    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Argon2::default()
        .verify_password(plain.as_bytes(), &parsed_hash)
        .is_ok()
}

/// Hash checked when sign-in finds no account, so both failure paths cost
/// one Argon2 verification
static DUMMY_HASH: LazyLock<String> =
    LazyLock::new(|| hash_password("no account for this email").unwrap_or_default());

/// Run a full verification against a throwaway hash. Always false.
pub fn verify_dummy(plain: &str) -> bool {
    let _ = verify_password(&DUMMY_HASH, plain);
    false
}

/// Securely hash a password and zeroize the original
pub fn hash_password_secure(plain: &mut String) -> anyhow::Result<String> {
    let hash = hash_password(plain);
    plain.zeroize();
    hash
}

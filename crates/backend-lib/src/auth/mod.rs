// ============================
// notes-backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod password;
pub mod token;
mod service;
mod service_impl;

pub use password::{hash_password, hash_password_secure, verify_dummy, verify_password};
pub use service::AuthService;
pub use service_impl::DefaultAuth;
pub use token::{Claims, JwtIssuer, TokenIssuer};

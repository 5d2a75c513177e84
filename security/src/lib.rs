// security/src/lib.rs
//! Password hashing and bearer-token support for the clinic backend.
//!
//! Passwords are hashed with Argon2 (PHC string format). Tokens are HS256
//! JWTs carrying the staff id and role; the signing secret and expiry come
//! from the caller's configuration rather than being baked in here.

use argon2::{
    Argon2, PasswordHash, PasswordVerifier,
    password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use models::Role;

pub mod roles;

pub use roles::authorize;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Invalid or expired token")]
    InvalidToken,
    #[error("Password hashing error: {0}")]
    PasswordHash(String),
    #[error("JWT error: {0}")]
    Jwt(String),
}

/// Claims carried by every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Staff id, stringified.
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn staff_id(&self) -> Result<i64, AuthError> {
        self.sub.parse().map_err(|_| AuthError::InvalidToken)
    }
}

/// Hashes a plaintext password with Argon2 and a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::PasswordHash(e.to_string()))
}

/// Verifies a plaintext password against a stored Argon2 hash.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(stored_hash)
        .map_err(|e| AuthError::PasswordHash(format!("unparseable stored hash: {e}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::PasswordHash(e.to_string())),
    }
}

/// Issues a signed token for a staff user.
pub fn issue_token(
    staff_id: i64,
    role: Role,
    secret: &[u8],
    expire_minutes: i64,
) -> Result<String, AuthError> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: staff_id.to_string(),
        role,
        iat: now,
        exp: now + expire_minutes * 60,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .map_err(|e| AuthError::Jwt(e.to_string()))
}

/// Decodes and validates a token, returning its claims.
pub fn validate_token(token: &str, secret: &[u8]) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::InvalidToken)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test-signing-secret-at-least-32-bytes!!";

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("Str0ng!Pass").unwrap();
        assert!(verify_password("Str0ng!Pass", &hash).unwrap());
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("same-input1!").unwrap();
        let b = hash_password("same-input1!").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn token_round_trip() {
        let token = issue_token(42, Role::Doctor, SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.staff_id().unwrap(), 42);
        assert_eq!(claims.role, Role::Doctor);
    }

    #[test]
    fn token_rejected_with_wrong_secret() {
        let token = issue_token(1, Role::Admin, SECRET, 60).unwrap();
        assert!(validate_token(&token, b"another-secret-entirely-32-bytes!").is_err());
    }

    #[test]
    fn expired_token_rejected() {
        let token = issue_token(1, Role::Admin, SECRET, -10).unwrap();
        assert!(validate_token(&token, SECRET).is_err());
    }
}

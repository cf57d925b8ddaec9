//! Authentication module
//!
//! JWT-based bearer authentication for the proposal endpoints. There are no
//! roles: any registered account may declare and submit proposals.

mod jwt;
mod middleware;

pub use jwt::{create_tokens, decode_token, refresh_tokens, Claims, TokenPair, TokenType};
pub use middleware::auth_middleware;

use crate::error::AppError;
use bcrypt::DEFAULT_COST;

/// Hash a password with bcrypt at the default cost.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    bcrypt::hash(password, DEFAULT_COST)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Failed to verify password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies() {
        let hash = hash_password("wheel-house").unwrap();
        assert!(verify_password("wheel-house", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
    }
}

use argon2::{
    Argon2, PasswordHasher, PasswordVerifier,
    password_hash::{PasswordHash, SaltString, rand_core::OsRng},
};
use thiserror::Error;
use utils::jwt::{self, JwtError};
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,
    #[error("Failed to hash password: {0}")]
    Hash(String),
    #[error(transparent)]
    Token(#[from] JwtError),
}

/// Credential handling: argon2id password hashes and HS256 bearer tokens.
/// Constructed once at bootstrap with the configured signing secret.
#[derive(Clone)]
pub struct AuthService {
    jwt_secret: String,
}

impl AuthService {
    pub fn new(jwt_secret: String) -> Self {
        Self { jwt_secret }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|err| AuthError::Hash(err.to_string()))?;
        Ok(hash.to_string())
    }

    /// Verification failures and malformed stored hashes both come back as
    /// `InvalidCredentials` so login responses don't leak which it was.
    pub fn verify_password(&self, password: &str, stored_hash: &str) -> Result<(), AuthError> {
        let parsed = PasswordHash::new(stored_hash).map_err(|_| AuthError::InvalidCredentials)?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .map_err(|_| AuthError::InvalidCredentials)
    }

    pub fn issue_token(&self, user_id: Uuid) -> Result<String, AuthError> {
        Ok(jwt::issue_token(&self.jwt_secret, user_id)?)
    }

    /// Resolves a presented bearer token to the user uuid it was issued
    /// for.
    pub fn verify_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = jwt::verify_token(&self.jwt_secret, token)?;
        Ok(claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_verifies_and_rejects() {
        let auth = AuthService::new("sekrit".to_string());
        let hash = auth.hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2"));

        assert!(auth.verify_password("hunter2", &hash).is_ok());
        assert!(matches!(
            auth.verify_password("wrong", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn malformed_stored_hash_reads_as_invalid_credentials() {
        let auth = AuthService::new("sekrit".to_string());
        assert!(matches!(
            auth.verify_password("hunter2", "not-a-phc-string"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn token_roundtrip() {
        let auth = AuthService::new("sekrit".to_string());
        let user_id = Uuid::new_v4();
        let token = auth.issue_token(user_id).unwrap();
        assert_eq!(auth.verify_token(&token).unwrap(), user_id);

        let other = AuthService::new("different".to_string());
        assert!(other.verify_token(&token).is_err());
    }
}

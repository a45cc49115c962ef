//! Authentication service.
//!
//! Username and password accounts stored through the [`ProductRepository`].

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use subtle::ConstantTimeEq;
use tracing::instrument;

use tity_core::Username;

use crate::db::{ProductRepository, RepositoryError};
use crate::models::user::{StoredUser, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Prefix of every argon2 PHC string.
const ARGON2_PREFIX: &str = "$argon2";

/// Authentication service.
pub struct AuthService<'a> {
    repo: &'a dyn ProductRepository,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(repo: &'a dyn ProductRepository) -> Self {
        Self { repo }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidUsername` if the username format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs.
    /// Returns `AuthError::UserAlreadyExists` if the username is taken.
    #[instrument(skip(self, password, confirmation))]
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirmation: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(username)?;
        validate_password(password)?;
        if password != confirmation {
            return Err(AuthError::PasswordMismatch);
        }

        let password_hash = hash_password(password)?;

        let user = self
            .repo
            .create_user(&username, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let StoredUser {
            user,
            password_hash,
        } = self
            .repo
            .find_user(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_stored_password(password, &password_hash, &user)?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok(user)
    }
}

/// Validate password requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "La contraseña debe tener al menos {MIN_PASSWORD_LENGTH} caracteres"
        )));
    }
    Ok(())
}

/// Hash a password using Argon2.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Verify against either an argon2 hash or a legacy raw password.
fn verify_stored_password(password: &str, stored: &str, user: &User) -> Result<(), AuthError> {
    if stored.starts_with(ARGON2_PREFIX) {
        return verify_password(password, stored);
    }

    // Length is not secret; content comparison must not short-circuit.
    if stored.is_empty() || stored.as_bytes().ct_eq(password.as_bytes()).unwrap_u8() == 0 {
        return Err(AuthError::InvalidCredentials);
    }

    tracing::warn!(
        user_id = %user.id,
        "Account still stores a plaintext password; re-register to upgrade"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::memory::MemoryProductRepository;
    use tity_core::UserId;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correcto-123").unwrap();
        assert!(hash.starts_with(ARGON2_PREFIX));
        assert!(verify_password("correcto-123", &hash).is_ok());
        assert!(verify_password("incorrecto", &hash).is_err());
    }

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(
            validate_password("corta"),
            Err(AuthError::WeakPassword(_))
        ));
        assert!(validate_password("suficiente").is_ok());
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let repo = MemoryProductRepository::default();
        let auth = AuthService::new(&repo);

        let user = auth.register("ana", "contraseña1", "contraseña1").await.unwrap();
        assert_eq!(user.username.as_str(), "ana");

        let logged_in = auth.login("ana", "contraseña1").await.unwrap();
        assert_eq!(logged_in.id, user.id);

        assert!(matches!(
            auth.login("ana", "otra-clave").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_duplicates_and_mismatch() {
        let repo = MemoryProductRepository::default();
        let auth = AuthService::new(&repo);

        assert!(matches!(
            auth.register("ana", "contraseña1", "contraseña2").await,
            Err(AuthError::PasswordMismatch)
        ));

        auth.register("ana", "contraseña1", "contraseña1").await.unwrap();
        assert!(matches!(
            auth.register("ana", "contraseña1", "contraseña1").await,
            Err(AuthError::UserAlreadyExists)
        ));
    }

    #[tokio::test]
    async fn test_unknown_user_is_invalid_credentials() {
        let repo = MemoryProductRepository::default();
        let auth = AuthService::new(&repo);

        assert!(matches!(
            auth.login("nadie", "contraseña1").await,
            Err(AuthError::InvalidCredentials)
        ));
        assert!(matches!(
            auth.login("x", "contraseña1").await,
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_legacy_plaintext_password() {
        let repo = MemoryProductRepository::default();
        let name = Username::parse("legado").unwrap();
        repo.create_user(&name, "viejaclave").await.unwrap();

        let auth = AuthService::new(&repo);
        assert!(auth.login("legado", "viejaclave").await.is_ok());
        assert!(auth.login("legado", "otraclave").await.is_err());
    }

    #[test]
    fn test_legacy_comparison_rejects_near_matches() {
        let user = User {
            id: UserId::new("1"),
            username: Username::parse("legado").unwrap(),
            created_at: chrono::Utc::now(),
        };

        assert!(verify_stored_password("viejaclave", "viejaclave", &user).is_ok());
        for attempt in ["viejaclavf", "viejaclav", "viejaclave2", ""] {
            assert!(matches!(
                verify_stored_password(attempt, "viejaclave", &user),
                Err(AuthError::InvalidCredentials)
            ));
        }
        assert!(verify_stored_password("", "", &user).is_err());
    }

    #[tokio::test]
    async fn test_unavailable_backend_is_repository_error() {
        let repo = MemoryProductRepository::default();
        repo.set_unavailable(true);
        let auth = AuthService::new(&repo);

        assert!(matches!(
            auth.login("ana", "contraseña1").await,
            Err(AuthError::Repository(_))
        ));
    }
}

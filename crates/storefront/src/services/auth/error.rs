//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid username format.
    #[error("invalid username: {0}")]
    InvalidUsername(#[from] tity_core::UsernameError),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// User already exists.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Message shown on the login and registration forms.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::InvalidUsername(e) => format!("Usuario inválido: {e}"),
            Self::InvalidCredentials => "Usuario o contraseña incorrectos".to_owned(),
            Self::UserAlreadyExists => "Ese usuario ya existe".to_owned(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::PasswordMismatch => "Las contraseñas no coinciden".to_owned(),
            Self::Repository(_) | Self::PasswordHash => {
                "No se pudo completar la operación, intenta más tarde".to_owned()
            }
        }
    }
}

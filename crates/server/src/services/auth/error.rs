//! Authentication error types.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// One or more registration or profile fields failed validation.
    ///
    /// Holds every failure message, joined for display.
    #[error("{0}")]
    Validation(String),

    /// Invalid credentials (wrong password or user not found).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// Bearer token is unknown or expired.
    #[error("invalid or expired token")]
    InvalidToken,

    /// User not found.
    #[error("user not found")]
    UserNotFound,

    /// Email or phone already registered.
    #[error("{0}")]
    UserAlreadyExists(String),

    /// Profile update named no fields.
    #[error("No fields to update")]
    NothingToUpdate,

    /// Caller asked for a role their own role cannot grant.
    #[error("Only an admin can grant the admin role")]
    RoleNotAllowed,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

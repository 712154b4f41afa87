//! Authentication service.
//!
//! Password registration and login, opaque bearer tokens, and profile
//! updates. Tokens are 32 random bytes, base64url encoded; only their SHA-256
//! hash is stored.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::instrument;

use stockroom_core::{Email, Phone, UserRole};

use crate::db::{RepositoryError, TokenRepository, UserRepository};
use crate::models::user::{NewUser, ProfileChanges, User};

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Characters that satisfy the special-character password rule.
const PASSWORD_SPECIAL_CHARS: &str = "@$!%*?&#";

/// Random bytes per bearer token.
const TOKEN_BYTES: usize = 32;

/// Registration form as submitted.
///
/// Every field defaults to empty so missing fields are reported alongside
/// other validation failures instead of as a JSON error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub confirm_password: String,
}

/// Profile update form. Empty strings count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProfileUpdate {
    pub password: Option<String>,
    pub image: Option<String>,
    pub role: Option<String>,
}

/// A freshly issued bearer token. The plaintext is never stored.
#[derive(Debug)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: TokenRepository<'a>,
    token_ttl: Duration,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service issuing tokens valid for
    /// `token_ttl_hours`.
    #[must_use]
    pub fn new(pool: &'a PgPool, token_ttl_hours: u32) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: TokenRepository::new(pool),
            token_ttl: Duration::hours(i64::from(token_ttl_hours)),
        }
    }

    /// Register a new user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` listing every invalid field.
    /// Returns `AuthError::UserAlreadyExists` if the email or phone is taken.
    #[instrument(skip_all)]
    pub async fn register(&self, form: &Registration) -> Result<User, AuthError> {
        let (email, phone) = validate_registration(form)?;
        let password_hash = hash_password(&form.password)?;

        let user = self
            .users
            .create(&NewUser {
                name: form.name.trim().to_string(),
                email,
                phone,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(what) => AuthError::UserAlreadyExists(what),
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    /// Login with email and password and issue a bearer token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, IssuedToken), AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = generate_token();
        let expires_at = Utc::now() + self.token_ttl;
        self.tokens
            .create(user.id, &hash_token(&token), expires_at)
            .await?;

        tracing::info!(user_id = %user.id, "User logged in");
        Ok((user, IssuedToken { token, expires_at }))
    }

    /// Resolve a bearer token to its user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token is unknown or expired.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        self.tokens
            .find_user(&hash_token(token))
            .await?
            .ok_or(AuthError::InvalidToken)
    }

    /// Update password, image or role.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NothingToUpdate` if no field is set.
    /// Returns `AuthError::Validation` for a weak password or unknown role.
    /// Returns `AuthError::RoleNotAllowed` if a non-admin asks for the admin role.
    /// Returns `AuthError::UserNotFound` if the user vanished.
    #[instrument(skip(self, caller, update), fields(user_id = %caller.id))]
    pub async fn update_profile(
        &self,
        caller: &User,
        update: &ProfileUpdate,
    ) -> Result<User, AuthError> {
        let changes = profile_changes(update, caller.role)?;

        let user = self
            .users
            .update_profile(caller.id, &changes)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    /// Create a user outside the registration form, optionally with a role.
    ///
    /// Used by the CLI. The password must still satisfy the password rules.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Validation` or `AuthError::UserAlreadyExists`.
    pub async fn create_user(
        &self,
        form: &Registration,
        role: Option<UserRole>,
    ) -> Result<User, AuthError> {
        let user = self.register(form).await?;
        if role.is_none() {
            return Ok(user);
        }
        let changes = ProfileChanges {
            role,
            ..ProfileChanges::default()
        };
        Ok(self.users.update_profile(user.id, &changes).await?)
    }

    /// Delete expired tokens. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the database operation fails.
    pub async fn purge_expired_tokens(&self) -> Result<u64, AuthError> {
        Ok(self.tokens.purge_expired().await?)
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Validate a registration form, collecting every failure.
///
/// # Errors
///
/// Returns `AuthError::Validation` with all messages joined by `"; "`.
pub fn validate_registration(form: &Registration) -> Result<(Email, Phone), AuthError> {
    let mut errors = Vec::new();

    if form.name.trim().is_empty() {
        errors.push("Name is required".to_string());
    }

    let email = if form.email.trim().is_empty() {
        errors.push("Email is required".to_string());
        None
    } else {
        Email::parse(&form.email)
            .map_err(|e| errors.push(format!("Invalid email: {e}")))
            .ok()
    };

    let phone = if form.phone.trim().is_empty() {
        errors.push("Phone is required".to_string());
        None
    } else {
        Phone::parse(&form.phone)
            .map_err(|e| errors.push(format!("Invalid phone: {e}")))
            .ok()
    };

    errors.extend(password_problems(&form.password));

    if form.confirm_password.is_empty() {
        errors.push("Confirm password is required".to_string());
    } else if form.confirm_password != form.password {
        errors.push("Passwords must match".to_string());
    }

    match (email, phone) {
        (Some(email), Some(phone)) if errors.is_empty() => Ok((email, phone)),
        _ => Err(AuthError::Validation(errors.join("; "))),
    }
}

/// Every rule `password` breaks, in a fixed order.
fn password_problems(password: &str) -> Vec<String> {
    if password.is_empty() {
        return vec!["Password is required".to_string()];
    }

    let mut problems = Vec::new();
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        problems.push(format!(
            "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        problems.push("Password must contain at least one uppercase letter".to_string());
    }
    if !password.chars().any(|c| c.is_ascii_digit()) {
        problems.push("Password must contain at least one number".to_string());
    }
    if !password.chars().any(|c| PASSWORD_SPECIAL_CHARS.contains(c)) {
        problems.push("Password must contain at least one special character".to_string());
    }
    problems
}

/// Turn a profile update form into validated changes.
fn profile_changes(
    update: &ProfileUpdate,
    caller_role: Option<UserRole>,
) -> Result<ProfileChanges, AuthError> {
    let non_empty = |v: &Option<String>| {
        v.as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
    };

    let password = update.password.as_deref().filter(|p| !p.is_empty());
    let image = non_empty(&update.image);
    let role = non_empty(&update.role);

    if password.is_none() && image.is_none() && role.is_none() {
        return Err(AuthError::NothingToUpdate);
    }

    let password_hash = match password {
        Some(password) => {
            let problems = password_problems(password);
            if !problems.is_empty() {
                return Err(AuthError::Validation(problems.join("; ")));
            }
            Some(hash_password(password)?)
        }
        None => None,
    };

    let role = role
        .map(|r| r.parse::<UserRole>())
        .transpose()
        .map_err(|e| AuthError::Validation(e.to_string()))?;

    if role == Some(UserRole::Admin) && caller_role != Some(UserRole::Admin) {
        return Err(AuthError::RoleNotAllowed);
    }

    Ok(ProfileChanges {
        password_hash,
        image,
        role,
    })
}

// =============================================================================
// Password and token helpers
// =============================================================================

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` if the password doesn't match.
/// Returns `AuthError::PasswordHash` if the hash is malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::PasswordHash)?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a new random bearer token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Hex SHA-256 of a bearer token, as stored in `api_tokens`.
#[must_use]
pub fn hash_token(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

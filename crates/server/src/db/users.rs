//! User repository for database operations.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use stockroom_core::{Email, Phone, UserId, UserRole};

use super::RepositoryError;
use crate::models::DEFAULT_IMAGE_URL;
use crate::models::user::{NewUser, ProfileChanges, User};

/// Unique constraints on `users` and what each one protects.
const USER_CONFLICTS: &[(&str, &str)] = &[
    ("users_email_key", "email"),
    ("users_phone_key", "phone"),
];

const USER_COLUMNS: &str = "id, name, email, phone, image, role, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct UserRow {
    id: i32,
    name: String,
    email: Email,
    phone: Phone,
    image: String,
    role: Option<UserRole>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: UserId::new(row.id),
            name: row.name,
            email: row.email,
            phone: row.phone,
            image: row.image,
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserWithPasswordRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user and their password hash by email, for login.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn get_password_hash(
        &self,
        email: &Email,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, UserWithPasswordRow>(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(|r| (User::from(r.user), r.password_hash)))
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email or phone already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, user), fields(email = %user.email))]
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            INSERT INTO users (name, email, phone, password_hash, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password_hash)
        .bind(DEFAULT_IMAGE_URL)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, USER_CONFLICTS))?;

        Ok(row.into())
    }

    /// Apply profile changes; `None` fields keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        id: UserId,
        changes: &ProfileChanges,
    ) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            r"
            UPDATE users
            SET password_hash = COALESCE($2, password_hash),
                image = COALESCE($3, image),
                role = COALESCE($4, role),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.password_hash.as_deref())
        .bind(changes.image.as_deref())
        .bind(changes.role)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, USER_CONFLICTS))?;

        row.map(User::from).ok_or(RepositoryError::NotFound)
    }
}

/// Check that a user exists, holding a share lock on the row until the
/// surrounding transaction ends.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_existing(conn: &mut PgConnection, id: UserId) -> Result<bool, RepositoryError> {
    let found: Option<(i32,)> = sqlx::query_as("SELECT id FROM users WHERE id = $1 FOR SHARE")
        .bind(id)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

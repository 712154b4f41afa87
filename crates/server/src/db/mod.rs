//! Database operations for the back-office `PostgreSQL` database.
//!
//! ## Tables
//!
//! - `users` - Registered back-office users
//! - `api_tokens` - Hashed bearer tokens issued at login
//! - `inventory_items` - Per-user cart lines, unique per (user, catalog product)
//! - `invoices` / `invoice_line_items` - Immutable invoice snapshots
//!
//! # Migrations
//!
//! Migrations live in `crates/server/migrations/`, are embedded in [`MIGRATOR`]
//! and run via:
//! ```bash
//! cargo run -p stockroom-cli -- migrate
//! ```

pub mod inventory;
pub mod invoices;
pub mod tokens;
pub mod users;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use inventory::InventoryRepository;
pub use invoices::InvoiceRepository;
pub use tokens::TokenRepository;
pub use users::UserRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLSTATE for numeric values out of range (e.g. `integer` overflow).
const NUMERIC_VALUE_OUT_OF_RANGE: &str = "22003";

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A value was rejected by the database (e.g., quantity overflow).
    #[error("value out of range: {0}")]
    OutOfRange(String),
}

impl RepositoryError {
    /// Map a write error, turning constraint violations into typed variants.
    ///
    /// `conflict` names the thing that already exists for each unique
    /// constraint the statement can hit.
    pub(crate) fn from_write(err: sqlx::Error, conflict: &[(&str, &str)]) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                let constraint = db_err.constraint().unwrap_or_default();
                let what = conflict
                    .iter()
                    .find(|(name, _)| *name == constraint)
                    .map_or("record", |(_, what)| *what);
                return Self::Conflict(format!("{what} already exists"));
            }
            if db_err.is_foreign_key_violation() {
                return Self::NotFound;
            }
            if db_err.code().as_deref() == Some(NUMERIC_VALUE_OUT_OF_RANGE) {
                return Self::OutOfRange(db_err.message().to_owned());
            }
        }
        Self::Database(err)
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

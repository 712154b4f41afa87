//! CLI subcommands.

pub mod migrate;
pub mod tokens;
pub mod user;

use sqlx::PgPool;
use thiserror::Error;

use stockroom_server::config::{ConfigError, database_url_from_env};

/// Errors shared by commands that talk to the database.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Database URL missing from the environment.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Connect using `STOCKROOM_DATABASE_URL` (or `DATABASE_URL`).
pub async fn connect() -> Result<PgPool, CommandError> {
    let database_url = database_url_from_env()?;

    tracing::info!("Connecting to database...");
    Ok(stockroom_server::db::create_pool(&database_url).await?)
}

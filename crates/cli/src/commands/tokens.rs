//! Login token maintenance.

use stockroom_server::config::DEFAULT_TOKEN_TTL_HOURS;
use stockroom_server::services::auth::{AuthError, AuthService};
use thiserror::Error;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum TokenError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Delete every expired login token.
pub async fn purge() -> Result<u64, TokenError> {
    let pool = connect().await?;

    // The TTL only matters when issuing tokens.
    let removed = AuthService::new(&pool, DEFAULT_TOKEN_TTL_HOURS)
        .purge_expired_tokens()
        .await?;

    tracing::info!("Removed {} expired token(s)", removed);
    Ok(removed)
}

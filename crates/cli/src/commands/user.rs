//! User management commands.
//!
//! # Usage
//!
//! ```bash
//! stockroom-cli user create -n "Jane Doe" -e jane@example.com -p 5551234567 \
//!     --password 'S3cure!pass' -r admin
//! ```
//!
//! Applies the same validation as `POST /user-registration`. The API has no
//! way to create the first admin, so this is where one comes from.

use stockroom_core::{UserId, UserRole, UserRoleError};
use stockroom_server::config::DEFAULT_TOKEN_TTL_HOURS;
use stockroom_server::services::auth::{AuthError, AuthService, Registration};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    InvalidRole(#[from] UserRoleError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Arguments for `user create`.
#[derive(Debug)]
pub struct NewUserArgs {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub role: Option<String>,
}

impl NewUserArgs {
    fn role(&self) -> Result<Option<UserRole>, UserRoleError> {
        self.role.as_deref().map(str::parse).transpose()
    }

    fn registration(self) -> Registration {
        Registration {
            name: self.name,
            email: self.email,
            confirm_password: self.password.clone(),
            password: self.password,
            phone: self.phone,
        }
    }
}

/// Create a new user.
///
/// # Returns
///
/// The ID of the created user.
pub async fn create(args: NewUserArgs) -> Result<UserId, UserError> {
    // Parse the role before touching the database
    let role = args.role()?;
    let form = args.registration();

    let pool = connect().await?;

    tracing::info!("Creating user: {}", form.email);
    let user = AuthService::new(&pool, DEFAULT_TOKEN_TTL_HOURS)
        .create_user(&form, role)
        .await?;

    tracing::info!(
        "User created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role.map_or_else(|| "none".to_string(), |r| r.to_string())
    );

    Ok(user.id)
}

//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`,
//! and every error reaches the client as `{"error": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::inventory::InventoryError;
use crate::services::invoices::InvoiceError;
use crate::services::render::RenderError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Inventory operation failed.
    #[error("Inventory error: {0}")]
    Inventory(#[from] InventoryError),

    /// Invoice operation failed.
    #[error("Invoice error: {0}")]
    Invoice(#[from] InvoiceError),

    /// Product catalog request failed.
    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Invoice rendering failed.
    #[error("Render error: {0}")]
    Render(#[from] RenderError),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Render(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Catalog(_) => StatusCode::BAD_GATEWAY,
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
                AuthError::UserNotFound => StatusCode::NOT_FOUND,
                AuthError::UserAlreadyExists(_) => StatusCode::CONFLICT,
                AuthError::RoleNotAllowed => StatusCode::FORBIDDEN,
                AuthError::Validation(_) | AuthError::NothingToUpdate => StatusCode::BAD_REQUEST,
                AuthError::Repository(_) | AuthError::PasswordHash => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Inventory(err) => match err {
                InventoryError::Validation(_) => StatusCode::BAD_REQUEST,
                InventoryError::UserNotFound => StatusCode::NOT_FOUND,
                InventoryError::Forbidden => StatusCode::FORBIDDEN,
                InventoryError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Invoice(err) => match err {
                InvoiceError::EmptyRequest
                | InvoiceError::DuplicateInventoryId(_)
                | InvoiceError::TotalOverflow => StatusCode::BAD_REQUEST,
                InvoiceError::UserNotFound
                | InvoiceError::InventoryNotFound(_)
                | InvoiceError::InvoiceNotFound
                | InvoiceError::NoInvoices => StatusCode::NOT_FOUND,
                InvoiceError::NotOwned(_) | InvoiceError::Forbidden => StatusCode::FORBIDDEN,
                InvoiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    /// Message shown to the client. Server-side details stay in the logs.
    fn client_message(&self) -> String {
        match self {
            Self::Catalog(_) => "Failed to fetch products".to_string(),
            Self::Render(_) => "Failed to generate PDF".to_string(),
            Self::Auth(AuthError::InvalidCredentials) => "Invalid credentials".to_string(),
            Self::Auth(AuthError::InvalidToken) | Self::Unauthorized(_) => {
                "Authentication required".to_string()
            }
            Self::Auth(AuthError::UserNotFound) => "User profile not found".to_string(),
            Self::Auth(
                err @ (AuthError::Validation(_)
                | AuthError::UserAlreadyExists(_)
                | AuthError::NothingToUpdate
                | AuthError::RoleNotAllowed),
            ) => err.to_string(),
            Self::Inventory(
                err @ (InventoryError::Validation(_)
                | InventoryError::UserNotFound
                | InventoryError::Forbidden),
            ) => err.to_string(),
            Self::Invoice(err) if !matches!(err, InvoiceError::Repository(_)) => err.to_string(),
            Self::BadRequest(msg) => msg.clone(),
            _ => "Internal server error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = %status, "Request rejected");
        }

        (status, Json(json!({ "error": self.client_message() }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use stockroom_core::InventoryItemId;

    use super::*;

    async fn body_json(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::Unauthorized("Authentication required".to_string());
        assert_eq!(err.to_string(), "Unauthorized: Authentication required");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            AppError::Unauthorized("test".to_string()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::BadRequest("test".to_string()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(CatalogError::Status(503)).status(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::from(RenderError::EmptyDocument).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::from(AuthError::UserAlreadyExists("email already exists".to_string()))
                .status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(AuthError::RoleNotAllowed).status(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_invoice_error_status_codes() {
        let id = InventoryItemId::new(5);
        assert_eq!(
            AppError::from(InvoiceError::NotOwned(id)).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::from(InvoiceError::InventoryNotFound(id)).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(InvoiceError::NoInvoices).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::from(InvoiceError::DuplicateInventoryId(id)).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::from(InvoiceError::TotalOverflow).status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn test_error_body_is_json() {
        let (status, body) =
            body_json(InvoiceError::NotOwned(InventoryItemId::new(9)).into()).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], "Product ID 9 does not belong to the user");
    }

    #[tokio::test]
    async fn test_server_errors_hide_details() {
        let (status, body) = body_json(CatalogError::Status(503).into()).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"], "Failed to fetch products");

        let (_, body) = body_json(RenderError::Status(502).into()).await;
        assert_eq!(body["error"], "Failed to generate PDF");
    }
}

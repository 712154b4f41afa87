//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                     - Liveness
//! GET    /health/ready               - Readiness (database reachable)
//!
//! # Users
//! POST   /user-registration          - Register
//! POST   /login                      - Issue a bearer token (rate limited)
//! GET    /profile                    - Current user (auth)
//! PUT    /profile                    - Update password, image or role (auth)
//!
//! # Inventory
//! GET    /products                   - Catalog listing (cached)
//! POST   /add-product                - Add a catalog product to an inventory (auth)
//! GET    /inventory-list/{userId}    - A user's inventory (auth)
//!
//! # Invoices (auth)
//! POST   /create-invoice             - Consume inventory rows into an invoice
//! GET    /view-invoice/{invoiceId}   - Invoice with owner
//! GET    /print-invoice/{invoiceId}  - Invoice as PDF attachment
//! GET    /invoice-list/{userId}      - A user's invoices, newest first
//! DELETE /invoice-delete/{invoiceId} - Delete an invoice
//! ```
//!
//! Success bodies are `{"status": "success", "data" | "message": ...}`;
//! errors are `{"error": "..."}` (see [`crate::error::AppError`]).

pub mod inventory;
pub mod invoices;
pub mod users;

use std::str::FromStr;

use axum::{
    Router,
    extract::{FromRequest, State, rejection::JsonRejection},
    http::StatusCode,
    routing::{delete, get, post},
};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::login_rate_limiter;
use crate::state::AppState;

const SUCCESS: &str = "success";

/// JSON request body whose rejections render as `{"error": ...}`.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// `{"status": "success", "data": ...}`
#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    pub status: &'static str,
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub const fn new(data: T) -> Self {
        Self {
            status: SUCCESS,
            data,
        }
    }
}

/// `{"status": "success", "message": ...}`
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub status: &'static str,
    pub message: &'static str,
}

impl MessageResponse {
    pub const fn new(message: &'static str) -> Self {
        Self {
            status: SUCCESS,
            message,
        }
    }
}

/// Parse an id from a path segment.
///
/// # Errors
///
/// Returns `AppError::BadRequest` ("Invalid {what} ID") if it is not an id.
pub fn parse_id<T: FromStr>(raw: &str, what: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("Invalid {what} ID")))
}

/// Build the application routes.
///
/// `trust_proxy_headers` decides how the login limiter identifies clients.
pub fn routes(trust_proxy_headers: bool) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .route("/user-registration", post(users::register))
        .route("/login", post(users::login).layer(login_rate_limiter(trust_proxy_headers)))
        .route("/profile", get(users::profile).put(users::update_profile))
        .route("/products", get(inventory::products))
        .route("/add-product", post(inventory::add_product))
        .route("/inventory-list/{user_id}", get(inventory::list))
        .route("/create-invoice", post(invoices::create))
        .route("/view-invoice/{invoice_id}", get(invoices::view))
        .route("/print-invoice/{invoice_id}", get(invoices::print))
        .route("/invoice-list/{user_id}", get(invoices::list))
        .route("/invoice-delete/{invoice_id}", delete(invoices::delete))
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use stockroom_core::InvoiceId;

    use super::*;

    #[test]
    fn test_parse_id() {
        let id: InvoiceId = parse_id(" 42 ", "invoice").unwrap();
        assert_eq!(id.as_i32(), 42);

        let err = parse_id::<InvoiceId>("abc", "invoice").unwrap_err();
        assert!(matches!(err, AppError::BadRequest(ref msg) if msg == "Invalid invoice ID"));
    }

    #[test]
    fn test_envelopes() {
        let body = serde_json::to_value(DataResponse::new(vec![1, 2])).unwrap();
        assert_eq!(body, serde_json::json!({"status": "success", "data": [1, 2]}));

        let body = serde_json::to_value(MessageResponse::new("Profile updated")).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"status": "success", "message": "Profile updated"})
        );
    }
}

//! Registration, login and profile handlers.

use axum::{extract::State, response::Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{DataResponse, JsonBody, MessageResponse};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::user::User;
use crate::services::auth::{AuthService, ProfileUpdate, Registration};
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Successful login.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn auth_service(state: &AppState) -> AuthService<'_> {
    AuthService::new(state.pool(), state.config().token_ttl_hours)
}

/// `POST /user-registration`
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<Registration>,
) -> Result<Json<MessageResponse>> {
    auth_service(&state).register(&form).await?;
    Ok(Json(MessageResponse::new("User created successfully")))
}

/// `POST /login`
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    JsonBody(form): JsonBody<LoginForm>,
) -> Result<Json<LoginResponse>> {
    let (_, issued) = auth_service(&state)
        .login(&form.email, &form.password)
        .await?;

    Ok(Json(LoginResponse {
        status: "success",
        message: "User logged in",
        token: issued.token,
        expires_at: issued.expires_at,
    }))
}

/// `GET /profile`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn profile(RequireAuth(user): RequireAuth) -> Json<DataResponse<User>> {
    Json(DataResponse::new(user))
}

/// `PUT /profile`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(update): JsonBody<ProfileUpdate>,
) -> Result<Json<MessageResponse>> {
    auth_service(&state).update_profile(&user, &update).await?;
    Ok(Json(MessageResponse::new("Profile updated")))
}

//! Catalog and inventory handlers.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Json,
};
use tracing::instrument;

use stockroom_core::UserId;

use super::{DataResponse, JsonBody, MessageResponse, parse_id};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::inventory::InventoryListing;
use crate::services::catalog::CatalogProduct;
use crate::services::inventory::{AddProduct, InventoryService};
use crate::state::AppState;

/// `GET /products`
#[instrument(skip_all)]
pub async fn products(
    State(state): State<AppState>,
) -> Result<Json<DataResponse<Arc<Vec<CatalogProduct>>>>> {
    let products = state.catalog().products().await?;
    Ok(Json(DataResponse::new(products)))
}

/// `POST /add-product`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn add_product(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(form): JsonBody<AddProduct>,
) -> Result<Json<MessageResponse>> {
    InventoryService::new(state.pool()).add(&user, &form).await?;
    Ok(Json(MessageResponse::new("Product added to inventory")))
}

/// `GET /inventory-list/{userId}`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(raw_user_id): Path<String>,
) -> Result<Json<DataResponse<Vec<InventoryListing>>>> {
    let owner: UserId = parse_id(&raw_user_id, "user")?;
    let items = InventoryService::new(state.pool())
        .list(&user, owner)
        .await?;
    Ok(Json(DataResponse::new(items)))
}

//! Invoice handlers.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use stockroom_core::{InventoryItemId, InvoiceId, UserId};

use super::{DataResponse, JsonBody, MessageResponse, parse_id};
use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::invoice::{Invoice, InvoiceDetails};
use crate::services::invoices::InvoiceService;
use crate::services::render::render_invoice_html;
use crate::state::AppState;

/// `POST /create-invoice` body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvoiceRequest {
    pub user_id: UserId,
    pub inventory_ids: Vec<InventoryItemId>,
}

/// Successful invoice creation.
#[derive(Debug, Serialize)]
pub struct CreateInvoiceResponse {
    pub status: &'static str,
    pub message: &'static str,
    pub invoice: Invoice,
}

/// `POST /create-invoice`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    JsonBody(request): JsonBody<CreateInvoiceRequest>,
) -> Result<Json<CreateInvoiceResponse>> {
    let invoice = InvoiceService::new(state.pool())
        .create(&user, request.user_id, &request.inventory_ids)
        .await?;

    Ok(Json(CreateInvoiceResponse {
        status: "success",
        message: "Invoice created successfully",
        invoice,
    }))
}

/// `GET /view-invoice/{invoiceId}`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn view(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(raw_id): Path<String>,
) -> Result<Json<DataResponse<InvoiceDetails>>> {
    let id: InvoiceId = parse_id(&raw_id, "invoice")?;
    let invoice = InvoiceService::new(state.pool()).view(&user, id).await?;
    Ok(Json(DataResponse::new(invoice)))
}

/// `GET /print-invoice/{invoiceId}`
///
/// Responds with the PDF as an attachment. If rendering fails the client gets
/// a JSON error and no PDF bytes.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn print(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(raw_id): Path<String>,
) -> Result<Response> {
    let id: InvoiceId = parse_id(&raw_id, "invoice")?;
    let invoice = InvoiceService::new(state.pool()).view(&user, id).await?;

    let html = render_invoice_html(&invoice)?;
    let pdf = state.pdf_renderer().render(html).await?;

    Ok(pdf_attachment(id, pdf))
}

/// Wrap PDF bytes as a download named `invoice_<id>.pdf`.
pub fn pdf_attachment(id: InvoiceId, pdf: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=invoice_{id}.pdf"),
            ),
        ],
        pdf,
    )
        .into_response()
}

/// `GET /invoice-list/{userId}`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(raw_user_id): Path<String>,
) -> Result<Json<DataResponse<Vec<InvoiceDetails>>>> {
    let owner: UserId = parse_id(&raw_user_id, "user")?;
    let invoices = InvoiceService::new(state.pool()).list(&user, owner).await?;
    Ok(Json(DataResponse::new(invoices)))
}

/// `DELETE /invoice-delete/{invoiceId}`
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(raw_id): Path<String>,
) -> Result<Json<MessageResponse>> {
    let id: InvoiceId = parse_id(&raw_id, "invoice")?;
    InvoiceService::new(state.pool()).delete(&user, id).await?;
    Ok(Json(MessageResponse::new("Invoice deleted successfully")))
}

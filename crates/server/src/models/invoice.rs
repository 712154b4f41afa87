//! Invoice domain types.
//!
//! Invoices are immutable snapshots of a checkout. Each line copies the
//! inventory row it was built from, because that row is deleted when the
//! invoice is created.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockroom_core::{Email, InventoryItemId, InvoiceId, Price, UserId};

/// Largest line or invoice total the `NUMERIC(14, 2)` columns hold.
pub const MAX_STORED_TOTAL: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// One invoice line, captured at invoice time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    /// Inventory row this line was taken from (no longer exists).
    pub inventory_id: InventoryItemId,
    pub product_id: i64,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    pub image: String,
    /// `price × quantity`.
    pub total: Decimal,
}

/// An invoice ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvoiceDraft {
    pub user_id: UserId,
    /// Lines in request order.
    pub products: Vec<InvoiceLineItem>,
    /// Sum of line totals.
    pub total_amount: Decimal,
}

/// A stored invoice.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    pub id: InvoiceId,
    pub user_id: UserId,
    pub products: Vec<InvoiceLineItem>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

/// Display fields of an invoice's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InvoiceOwner {
    pub id: UserId,
    pub name: String,
    pub email: Email,
}

/// An invoice hydrated with its owner, as viewed, listed and printed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDetails {
    pub id: InvoiceId,
    pub user: InvoiceOwner,
    pub products: Vec<InvoiceLineItem>,
    pub total_amount: Decimal,
    pub created_at: DateTime<Utc>,
}

impl InvoiceDetails {
    /// Recompute the total from the stored lines.
    #[must_use]
    pub fn line_total_sum(&self) -> Decimal {
        self.products.iter().map(|line| line.total).sum()
    }
}

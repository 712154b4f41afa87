//! Invoice repository.
//!
//! Invoices are stored as a header row plus ordered line items. Writes happen
//! through [`insert`] inside the invoice-creation transaction; reads hydrate
//! the owner's name and email alongside the lines.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use stockroom_core::{Email, InventoryItemId, InvoiceId, Price, UserId};

use super::RepositoryError;
use crate::models::invoice::{Invoice, InvoiceDetails, InvoiceDraft, InvoiceLineItem, InvoiceOwner};

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct InvoiceHeaderRow {
    id: i32,
    user_id: i32,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    user_name: String,
    user_email: Email,
}

#[derive(Debug, sqlx::FromRow)]
struct LineItemRow {
    invoice_id: i32,
    inventory_id: i32,
    product_id: i64,
    name: String,
    description: String,
    price: Price,
    quantity: i32,
    image: String,
    total: Decimal,
}

impl From<LineItemRow> for InvoiceLineItem {
    fn from(row: LineItemRow) -> Self {
        Self {
            inventory_id: InventoryItemId::new(row.inventory_id),
            product_id: row.product_id,
            name: row.name,
            description: row.description,
            price: row.price,
            quantity: row.quantity,
            image: row.image,
            total: row.total,
        }
    }
}

impl InvoiceHeaderRow {
    fn into_details(self, products: Vec<InvoiceLineItem>) -> InvoiceDetails {
        InvoiceDetails {
            id: InvoiceId::new(self.id),
            user: InvoiceOwner {
                id: UserId::new(self.user_id),
                name: self.user_name,
                email: self.user_email,
            },
            products,
            total_amount: self.total_amount,
            created_at: self.created_at,
        }
    }
}

const HEADER_SELECT: &str = r"
    SELECT v.id, v.user_id, v.total_amount, v.created_at,
           u.name AS user_name, u.email AS user_email
    FROM invoices v
    JOIN users u ON u.id = v.user_id
";

const LINE_ITEM_SELECT: &str = r"
    SELECT invoice_id, inventory_id, product_id, name, description,
           price, quantity, image, total
    FROM invoice_line_items
";

// =============================================================================
// Repository
// =============================================================================

/// Repository for invoice reads and deletes.
pub struct InvoiceRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InvoiceRepository<'a> {
    /// Create a new invoice repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get an invoice with its owner and lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn get_details(
        &self,
        id: InvoiceId,
    ) -> Result<Option<InvoiceDetails>, RepositoryError> {
        let Some(header) =
            sqlx::query_as::<_, InvoiceHeaderRow>(&format!("{HEADER_SELECT} WHERE v.id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?
        else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, LineItemRow>(&format!(
            "{LINE_ITEM_SELECT} WHERE invoice_id = $1 ORDER BY position"
        ))
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(
            header.into_details(lines.into_iter().map(InvoiceLineItem::from).collect()),
        ))
    }

    /// List a user's invoices, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<InvoiceDetails>, RepositoryError> {
        let headers = sqlx::query_as::<_, InvoiceHeaderRow>(&format!(
            "{HEADER_SELECT} WHERE v.user_id = $1 ORDER BY v.created_at DESC, v.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        if headers.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i32> = headers.iter().map(|h| h.id).collect();
        let lines = sqlx::query_as::<_, LineItemRow>(&format!(
            "{LINE_ITEM_SELECT} WHERE invoice_id = ANY($1) ORDER BY invoice_id, position"
        ))
        .bind(&ids)
        .fetch_all(self.pool)
        .await?;

        let mut by_invoice: HashMap<i32, Vec<InvoiceLineItem>> = HashMap::new();
        for line in lines {
            by_invoice
                .entry(line.invoice_id)
                .or_default()
                .push(line.into());
        }

        Ok(headers
            .into_iter()
            .map(|header| {
                let products = by_invoice.remove(&header.id).unwrap_or_default();
                header.into_details(products)
            })
            .collect())
    }

    /// Get the owner of an invoice without loading its lines.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_owner(&self, id: InvoiceId) -> Result<Option<UserId>, RepositoryError> {
        let row: Option<(i32,)> = sqlx::query_as("SELECT user_id FROM invoices WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(|(user_id,)| UserId::new(user_id)))
    }

    /// Delete an invoice and its lines. Returns `false` if it did not exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: InvoiceId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// Persist an invoice draft: header first, then lines in order.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the owning user vanished.
/// Returns `RepositoryError::OutOfRange` if a total does not fit its column.
/// Returns `RepositoryError::Database` for other database errors.
pub async fn insert(
    conn: &mut PgConnection,
    draft: &InvoiceDraft,
) -> Result<Invoice, RepositoryError> {
    let (id, created_at): (i32, DateTime<Utc>) = sqlx::query_as(
        r"
        INSERT INTO invoices (user_id, total_amount)
        VALUES ($1, $2)
        RETURNING id, created_at
        ",
    )
    .bind(draft.user_id)
    .bind(draft.total_amount)
    .fetch_one(&mut *conn)
    .await
    .map_err(|e| RepositoryError::from_write(e, &[]))?;

    for (position, line) in (1_i32..).zip(&draft.products) {
        sqlx::query(
            r"
            INSERT INTO invoice_line_items
                (invoice_id, position, inventory_id, product_id, name, description,
                 price, quantity, image, total)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ",
        )
        .bind(id)
        .bind(position)
        .bind(line.inventory_id)
        .bind(line.product_id)
        .bind(&line.name)
        .bind(&line.description)
        .bind(line.price)
        .bind(line.quantity)
        .bind(&line.image)
        .bind(line.total)
        .execute(&mut *conn)
        .await
        .map_err(|e| RepositoryError::from_write(e, &[]))?;
    }

    Ok(Invoice {
        id: InvoiceId::new(id),
        user_id: draft.user_id,
        products: draft.products.clone(),
        total_amount: draft.total_amount,
        created_at,
    })
}

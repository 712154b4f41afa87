//! Inventory repository.
//!
//! Reads go through [`InventoryRepository`]. The invoice workflow uses the
//! free functions [`lock_for_invoice`] and [`delete_many`], which run on a
//! caller-owned transaction.

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use tracing::instrument;

use stockroom_core::{Email, InventoryItemId, Price, UserId};

use super::RepositoryError;
use crate::models::inventory::{InventoryItem, InventoryListing, NewInventoryItem};

const INVENTORY_COLUMNS: &str = "id, user_id, product_id, name, quantity, price, description, \
                                 image, created_at, updated_at";

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct InventoryItemRow {
    id: i32,
    user_id: i32,
    product_id: i64,
    name: String,
    quantity: i32,
    price: Price,
    description: String,
    image: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InventoryItemRow> for InventoryItem {
    fn from(row: InventoryItemRow) -> Self {
        Self {
            id: InventoryItemId::new(row.id),
            user_id: UserId::new(row.user_id),
            product_id: row.product_id,
            name: row.name,
            quantity: row.quantity,
            price: row.price,
            description: row.description,
            image: row.image,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InventoryListingRow {
    #[sqlx(flatten)]
    item: InventoryItemRow,
    user_name: String,
    user_email: Email,
}

impl From<InventoryListingRow> for InventoryListing {
    fn from(row: InventoryListingRow) -> Self {
        Self {
            item: row.item.into(),
            user_name: row.user_name,
            user_email: row.user_email,
        }
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for inventory database operations.
pub struct InventoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> InventoryRepository<'a> {
    /// Create a new inventory repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a product to a user's inventory.
    ///
    /// Creates the row on the first add for (user, product). Later adds only
    /// increase `quantity`; name, price, description and image keep the
    /// values from the first add. A single upsert keeps concurrent adds from
    /// creating duplicate rows.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::OutOfRange` if the quantity overflows.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, item), fields(product_id = item.product_id, quantity = item.quantity))]
    pub async fn add_or_accumulate(
        &self,
        user_id: UserId,
        item: &NewInventoryItem,
    ) -> Result<InventoryItem, RepositoryError> {
        let row = sqlx::query_as::<_, InventoryItemRow>(&format!(
            r"
            INSERT INTO inventory_items
                (user_id, product_id, name, quantity, price, description, image)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT ON CONSTRAINT inventory_items_user_product_key
            DO UPDATE SET quantity = inventory_items.quantity + EXCLUDED.quantity,
                          updated_at = now()
            RETURNING {INVENTORY_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(item.product_id)
        .bind(&item.name)
        .bind(item.quantity)
        .bind(item.price)
        .bind(&item.description)
        .bind(&item.image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_write(e, &[]))?;

        Ok(row.into())
    }

    /// List a user's inventory joined with the owner's name and email,
    /// oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<InventoryListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, InventoryListingRow>(
            r"
            SELECT i.id, i.user_id, i.product_id, i.name, i.quantity, i.price,
                   i.description, i.image, i.created_at, i.updated_at,
                   u.name AS user_name, u.email AS user_email
            FROM inventory_items i
            JOIN users u ON u.id = i.user_id
            WHERE i.user_id = $1
            ORDER BY i.created_at, i.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(InventoryListing::from).collect())
    }
}

/// Load and row-lock the given inventory rows for invoicing.
///
/// Rows are locked in id order so two transactions over overlapping ids
/// cannot deadlock. Missing ids are simply absent from the result.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn lock_for_invoice(
    conn: &mut PgConnection,
    ids: &[InventoryItemId],
) -> Result<Vec<InventoryItem>, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(InventoryItemId::as_i32).collect();
    let rows = sqlx::query_as::<_, InventoryItemRow>(&format!(
        r"
        SELECT {INVENTORY_COLUMNS}
        FROM inventory_items
        WHERE id = ANY($1)
        ORDER BY id
        FOR UPDATE
        "
    ))
    .bind(&ids)
    .fetch_all(conn)
    .await?;

    Ok(rows.into_iter().map(InventoryItem::from).collect())
}

/// Delete the given inventory rows. Returns the number removed.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn delete_many(
    conn: &mut PgConnection,
    ids: &[InventoryItemId],
) -> Result<u64, RepositoryError> {
    let ids: Vec<i32> = ids.iter().map(InventoryItemId::as_i32).collect();
    let result = sqlx::query("DELETE FROM inventory_items WHERE id = ANY($1)")
        .bind(&ids)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

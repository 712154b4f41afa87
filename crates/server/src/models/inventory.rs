//! Inventory domain types.
//!
//! An inventory item is one unpurchased cart line: a catalog product a user
//! has picked, with an accumulated quantity. Rows are unique per
//! (user, catalog product).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use stockroom_core::{Email, InventoryItemId, Price, UserId};

/// Largest unit price the `NUMERIC(12, 2)` price columns hold.
pub const MAX_UNIT_PRICE: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// A stored inventory row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub id: InventoryItemId,
    /// Owner of this row.
    pub user_id: UserId,
    /// Product id in the external catalog.
    pub product_id: i64,
    pub name: String,
    /// Always positive; grows on repeated adds.
    pub quantity: i32,
    pub price: Price,
    pub description: String,
    pub image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated input for adding a product to a user's inventory.
#[derive(Debug, Clone)]
pub struct NewInventoryItem {
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    pub price: Price,
    pub description: String,
    pub image: String,
}

/// Inventory row joined with its owner's display fields.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryListing {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub user_name: String,
    pub user_email: Email,
}

//! Invoice workflow.
//!
//! Creating an invoice consumes inventory rows: the rows are locked, checked
//! against the requesting user, snapshotted into invoice lines and deleted,
//! all inside one transaction. Planning is a pure step ([`plan_invoice`]) so
//! the validation and arithmetic can be tested without a database.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use stockroom_core::{InventoryItemId, InvoiceId, UserId};

use crate::db::{self, InvoiceRepository, RepositoryError};
use crate::models::inventory::InventoryItem;
use crate::models::invoice::{
    Invoice, InvoiceDetails, InvoiceDraft, InvoiceLineItem, MAX_STORED_TOTAL,
};
use crate::models::user::User;

/// Errors from the invoice workflow.
#[derive(Debug, Error)]
pub enum InvoiceError {
    /// The request named no inventory rows.
    #[error("inventoryIds must contain at least one ID")]
    EmptyRequest,

    /// The same inventory row was named twice.
    #[error("Inventory ID {0} is listed more than once")]
    DuplicateInventoryId(InventoryItemId),

    /// The invoice owner does not exist.
    #[error("User not found")]
    UserNotFound,

    /// A requested inventory row does not exist (or was already invoiced).
    #[error("Product with ID {0} not found")]
    InventoryNotFound(InventoryItemId),

    /// A requested inventory row belongs to someone else.
    #[error("Product ID {0} does not belong to the user")]
    NotOwned(InventoryItemId),

    /// The caller may not act on this user's invoices.
    #[error("You do not have access to this user's invoices")]
    Forbidden,

    /// No invoice with the given id.
    #[error("Invoice not found")]
    InvoiceNotFound,

    /// The user has no invoices.
    #[error("No invoices found for this user")]
    NoInvoices,

    /// A line total or the invoice total exceeds what an invoice can store.
    #[error("Invoice total is too large")]
    TotalOverflow,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Reject empty requests and repeated ids.
///
/// # Errors
///
/// Returns [`InvoiceError::EmptyRequest`] or
/// [`InvoiceError::DuplicateInventoryId`] naming the first repeat.
pub fn validate_request(inventory_ids: &[InventoryItemId]) -> Result<(), InvoiceError> {
    if inventory_ids.is_empty() {
        return Err(InvoiceError::EmptyRequest);
    }
    let mut seen = HashSet::with_capacity(inventory_ids.len());
    for id in inventory_ids {
        if !seen.insert(*id) {
            return Err(InvoiceError::DuplicateInventoryId(*id));
        }
    }
    Ok(())
}

/// Build an invoice draft from the requested ids and the rows found for them.
///
/// Lines follow request order. Planning stops at the first id that is missing
/// or owned by another user.
///
/// # Errors
///
/// Returns [`InvoiceError::InventoryNotFound`], [`InvoiceError::NotOwned`]
/// or [`InvoiceError::TotalOverflow`].
pub fn plan_invoice(
    user_id: UserId,
    requested: &[InventoryItemId],
    rows: Vec<InventoryItem>,
) -> Result<InvoiceDraft, InvoiceError> {
    let mut by_id: HashMap<InventoryItemId, InventoryItem> =
        rows.into_iter().map(|row| (row.id, row)).collect();

    let mut products = Vec::with_capacity(requested.len());
    let mut total_amount = Decimal::ZERO;

    for id in requested {
        let row = by_id
            .remove(id)
            .ok_or(InvoiceError::InventoryNotFound(*id))?;
        if row.user_id != user_id {
            return Err(InvoiceError::NotOwned(*id));
        }

        let total = row
            .price
            .line_total(row.quantity)
            .ok()
            .filter(|total| *total <= MAX_STORED_TOTAL)
            .ok_or(InvoiceError::TotalOverflow)?;
        total_amount = total_amount
            .checked_add(total)
            .filter(|sum| *sum <= MAX_STORED_TOTAL)
            .ok_or(InvoiceError::TotalOverflow)?;

        products.push(InvoiceLineItem {
            inventory_id: row.id,
            product_id: row.product_id,
            name: row.name,
            description: row.description,
            price: row.price,
            quantity: row.quantity,
            image: row.image,
            total,
        });
    }

    Ok(InvoiceDraft {
        user_id,
        products,
        total_amount,
    })
}

/// Invoice service.
pub struct InvoiceService<'a> {
    pool: &'a PgPool,
    invoices: InvoiceRepository<'a>,
}

impl<'a> InvoiceService<'a> {
    /// Create a new invoice service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            invoices: InvoiceRepository::new(pool),
        }
    }

    /// Create an invoice for `user_id` from the given inventory rows.
    ///
    /// Either the invoice is stored and every consumed row is deleted, or
    /// nothing changes.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Forbidden` if `caller` may not act for `user_id`.
    /// Returns `InvoiceError::UserNotFound` if the user does not exist.
    /// Returns the planning errors of [`validate_request`] and [`plan_invoice`].
    /// Returns `InvoiceError::Repository` if the database fails.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id, items = inventory_ids.len()))]
    pub async fn create(
        &self,
        caller: &User,
        user_id: UserId,
        inventory_ids: &[InventoryItemId],
    ) -> Result<Invoice, InvoiceError> {
        if !caller.can_access(user_id) {
            return Err(InvoiceError::Forbidden);
        }
        validate_request(inventory_ids)?;

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;

        if !db::users::lock_existing(&mut *tx, user_id).await? {
            return Err(InvoiceError::UserNotFound);
        }

        let rows = db::inventory::lock_for_invoice(&mut *tx, inventory_ids).await?;
        let draft = plan_invoice(user_id, inventory_ids, rows)?;

        let invoice = db::invoices::insert(&mut *tx, &draft)
            .await
            .map_err(|e| match e {
                RepositoryError::OutOfRange(_) => InvoiceError::TotalOverflow,
                other => InvoiceError::Repository(other),
            })?;
        let deleted = db::inventory::delete_many(&mut *tx, inventory_ids).await?;

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(
            invoice_id = %invoice.id,
            total_amount = %invoice.total_amount,
            consumed = deleted,
            "Invoice created"
        );

        Ok(invoice)
    }

    /// Get an invoice the caller may see.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvoiceNotFound` if it does not exist.
    /// Returns `InvoiceError::Forbidden` if it belongs to someone else.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn view(&self, caller: &User, id: InvoiceId) -> Result<InvoiceDetails, InvoiceError> {
        let details = self
            .invoices
            .get_details(id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        if !caller.can_access(details.user.id) {
            return Err(InvoiceError::Forbidden);
        }

        if details.line_total_sum() != details.total_amount {
            tracing::warn!(invoice_id = %id, "Invoice total differs from its line totals");
        }

        Ok(details)
    }

    /// List a user's invoices, newest first.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Forbidden` if `caller` may not see them.
    /// Returns `InvoiceError::NoInvoices` if the user has none.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn list(
        &self,
        caller: &User,
        user_id: UserId,
    ) -> Result<Vec<InvoiceDetails>, InvoiceError> {
        if !caller.can_access(user_id) {
            return Err(InvoiceError::Forbidden);
        }

        let invoices = self.invoices.list_for_user(user_id).await?;
        if invoices.is_empty() {
            return Err(InvoiceError::NoInvoices);
        }
        Ok(invoices)
    }

    /// Delete an invoice the caller owns.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::InvoiceNotFound` if it does not exist.
    /// Returns `InvoiceError::Forbidden` if it belongs to someone else.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn delete(&self, caller: &User, id: InvoiceId) -> Result<(), InvoiceError> {
        let owner = self
            .invoices
            .get_owner(id)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound)?;

        if !caller.can_access(owner) {
            return Err(InvoiceError::Forbidden);
        }

        if !self.invoices.delete(id).await? {
            return Err(InvoiceError::InvoiceNotFound);
        }

        tracing::info!(invoice_id = %id, "Invoice deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use stockroom_core::Price;

    use super::*;
    use crate::models::DEFAULT_IMAGE_URL;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn row(id: i32, user: i32, price: &str, quantity: i32) -> InventoryItem {
        InventoryItem {
            id: InventoryItemId::new(id),
            user_id: UserId::new(user),
            product_id: i64::from(id) * 100,
            name: format!("Product {id}"),
            quantity,
            price: Price::new(dec(price)).unwrap(),
            description: format!("Description {id}"),
            image: DEFAULT_IMAGE_URL.to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn ids(raw: &[i32]) -> Vec<InventoryItemId> {
        raw.iter().copied().map(InventoryItemId::new).collect()
    }

    #[test]
    fn test_plan_sums_line_totals() {
        let user = UserId::new(1);
        let rows = vec![row(10, 1, "10", 2), row(11, 1, "5", 3)];

        let draft = plan_invoice(user, &ids(&[10, 11]), rows).unwrap();

        assert_eq!(draft.total_amount, dec("35"));
        assert_eq!(draft.products.len(), 2);
        assert_eq!(draft.products[0].total, dec("20"));
        assert_eq!(draft.products[1].total, dec("15"));
        assert_eq!(draft.user_id, user);
    }

    #[test]
    fn test_plan_snapshots_every_field() {
        let source = row(7, 1, "109.95", 4);
        let draft = plan_invoice(UserId::new(1), &ids(&[7]), vec![source.clone()]).unwrap();

        let line = &draft.products[0];
        assert_eq!(line.inventory_id, source.id);
        assert_eq!(line.product_id, source.product_id);
        assert_eq!(line.name, source.name);
        assert_eq!(line.description, source.description);
        assert_eq!(line.price, source.price);
        assert_eq!(line.quantity, source.quantity);
        assert_eq!(line.image, source.image);
        assert_eq!(line.total, dec("439.80"));
    }

    #[test]
    fn test_plan_follows_request_order() {
        // Rows arrive in id order from the locking query.
        let rows = vec![row(1, 1, "1", 1), row(2, 1, "2", 1), row(3, 1, "3", 1)];

        let draft = plan_invoice(UserId::new(1), &ids(&[3, 1, 2]), rows).unwrap();

        let order: Vec<i32> = draft
            .products
            .iter()
            .map(|line| line.inventory_id.as_i32())
            .collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_plan_rejects_other_users_rows() {
        let rows = vec![row(10, 1, "10", 2), row(11, 2, "5", 3)];

        let err = plan_invoice(UserId::new(1), &ids(&[10, 11]), rows).unwrap_err();

        assert!(matches!(err, InvoiceError::NotOwned(id) if id.as_i32() == 11));
        assert_eq!(err.to_string(), "Product ID 11 does not belong to the user");
    }

    #[test]
    fn test_plan_rejects_missing_rows() {
        let rows = vec![row(10, 1, "10", 2)];

        let err = plan_invoice(UserId::new(1), &ids(&[10, 99]), rows).unwrap_err();

        assert!(matches!(err, InvoiceError::InventoryNotFound(id) if id.as_i32() == 99));
        assert_eq!(err.to_string(), "Product with ID 99 not found");
    }

    #[test]
    fn test_plan_stops_at_first_invalid_id() {
        // 98 is missing and 11 is foreign; 98 comes first in the request.
        let rows = vec![row(11, 2, "5", 3)];

        let err = plan_invoice(UserId::new(1), &ids(&[98, 11]), rows).unwrap_err();

        assert!(matches!(err, InvoiceError::InventoryNotFound(_)));
    }

    #[test]
    fn test_plan_keeps_cents_exact() {
        let rows = vec![row(1, 1, "0.10", 3), row(2, 1, "0.20", 1)];

        let draft = plan_invoice(UserId::new(1), &ids(&[1, 2]), rows).unwrap();

        assert_eq!(draft.total_amount, dec("0.50"));
    }

    #[test]
    fn test_plan_reports_overflow() {
        let rows = vec![row(1, 1, "79228162514264337593543950335", 2)];

        let err = plan_invoice(UserId::new(1), &ids(&[1]), rows).unwrap_err();

        assert!(matches!(err, InvoiceError::TotalOverflow));
    }

    #[test]
    fn test_plan_rejects_line_total_beyond_storage() {
        // 2e12 fits a Decimal but not the stored total column.
        let rows = vec![row(1, 1, "1000", 2_000_000_000)];

        let err = plan_invoice(UserId::new(1), &ids(&[1]), rows).unwrap_err();

        assert!(matches!(err, InvoiceError::TotalOverflow));
    }

    #[test]
    fn test_plan_rejects_invoice_total_beyond_storage() {
        // Each line fits on its own; together they do not.
        let rows = vec![
            row(1, 1, "9999999999.99", 60),
            row(2, 1, "9999999999.99", 60),
        ];

        let err = plan_invoice(UserId::new(1), &ids(&[1, 2]), rows).unwrap_err();

        assert!(matches!(err, InvoiceError::TotalOverflow));
    }

    #[test]
    fn test_plan_accepts_largest_storable_total() {
        let rows = vec![row(1, 1, "9999999999.99", 100), row(2, 1, "0.99", 1)];

        let draft = plan_invoice(UserId::new(1), &ids(&[1, 2]), rows).unwrap();

        assert_eq!(draft.total_amount, MAX_STORED_TOTAL);
        assert_eq!(MAX_STORED_TOTAL, dec("999999999999.99"));
    }

    #[test]
    fn test_validate_request_rejects_empty() {
        assert!(matches!(
            validate_request(&[]),
            Err(InvoiceError::EmptyRequest)
        ));
    }

    #[test]
    fn test_validate_request_rejects_duplicates() {
        let err = validate_request(&ids(&[4, 5, 4])).unwrap_err();
        assert!(matches!(err, InvoiceError::DuplicateInventoryId(id) if id.as_i32() == 4));
    }

    #[test]
    fn test_validate_request_accepts_distinct_ids() {
        assert!(validate_request(&ids(&[4, 5, 6])).is_ok());
    }
}

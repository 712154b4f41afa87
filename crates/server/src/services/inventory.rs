//! Inventory service: validating and accumulating cart lines.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;
use tracing::instrument;

use stockroom_core::{Price, UserId};

use crate::db::{InventoryRepository, RepositoryError};
use crate::models::DEFAULT_IMAGE_URL;
use crate::models::inventory::{
    InventoryItem, InventoryListing, MAX_UNIT_PRICE, NewInventoryItem,
};
use crate::models::user::User;

/// Errors from inventory operations.
#[derive(Debug, Error)]
pub enum InventoryError {
    /// The submitted product failed validation.
    #[error("{0}")]
    Validation(String),

    /// The target user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// The caller may not touch this user's inventory.
    #[error("You do not have access to this user's inventory")]
    Forbidden,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Add-to-inventory form as submitted.
///
/// `user_id` defaults to the caller when absent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddProduct {
    #[serde(default)]
    pub user_id: Option<UserId>,
    pub product_id: i64,
    pub name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub description: String,
    #[serde(default)]
    pub image: Option<String>,
}

impl AddProduct {
    /// Validate the form into a storable item.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Validation` listing every invalid field.
    pub fn validate(&self) -> Result<NewInventoryItem, InventoryError> {
        let mut errors = Vec::new();

        if self.name.trim().is_empty() {
            errors.push("Name is required");
        }
        if self.description.trim().is_empty() {
            errors.push("Description is required");
        }
        if self.quantity < 1 {
            errors.push("Quantity must be at least 1");
        }
        let price = Price::new(self.price).ok();
        if price.is_none() {
            errors.push("Price cannot be negative");
        }
        if self.price > MAX_UNIT_PRICE {
            errors.push("Price is too large");
        }
        if self.price.normalize().scale() > 2 {
            errors.push("Price cannot have more than 2 decimal places");
        }

        match price {
            Some(price) if errors.is_empty() => Ok(NewInventoryItem {
                product_id: self.product_id,
                name: self.name.trim().to_string(),
                quantity: self.quantity,
                price,
                description: self.description.trim().to_string(),
                image: self
                    .image
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .unwrap_or(DEFAULT_IMAGE_URL)
                    .to_string(),
            }),
            _ => Err(InventoryError::Validation(errors.join("; "))),
        }
    }
}

/// Inventory service.
pub struct InventoryService<'a> {
    inventory: InventoryRepository<'a>,
}

impl<'a> InventoryService<'a> {
    /// Create a new inventory service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            inventory: InventoryRepository::new(pool),
        }
    }

    /// Add a product to a user's inventory, accumulating quantity on repeats.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Forbidden` if `caller` may not act for the user.
    /// Returns `InventoryError::Validation` for invalid input or quantity overflow.
    /// Returns `InventoryError::UserNotFound` if the user does not exist.
    #[instrument(skip(self, caller, form), fields(caller_id = %caller.id, product_id = form.product_id))]
    pub async fn add(&self, caller: &User, form: &AddProduct) -> Result<InventoryItem, InventoryError> {
        let user_id = form.user_id.unwrap_or(caller.id);
        if !caller.can_access(user_id) {
            return Err(InventoryError::Forbidden);
        }

        let item = form.validate()?;

        let stored = self
            .inventory
            .add_or_accumulate(user_id, &item)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => InventoryError::UserNotFound,
                RepositoryError::OutOfRange(_) => {
                    InventoryError::Validation("Quantity is too large".to_string())
                }
                other => InventoryError::Repository(other),
            })?;

        tracing::info!(
            inventory_id = %stored.id,
            quantity = stored.quantity,
            "Product added to inventory"
        );
        Ok(stored)
    }

    /// List a user's inventory. An empty inventory is not an error.
    ///
    /// # Errors
    ///
    /// Returns `InventoryError::Forbidden` if `caller` may not see it.
    #[instrument(skip(self, caller), fields(caller_id = %caller.id))]
    pub async fn list(
        &self,
        caller: &User,
        user_id: UserId,
    ) -> Result<Vec<InventoryListing>, InventoryError> {
        if !caller.can_access(user_id) {
            return Err(InventoryError::Forbidden);
        }
        Ok(self.inventory.list_for_user(user_id).await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> AddProduct {
        serde_json::from_value(serde_json::json!({
            "productId": 1,
            "name": "Fjallraven Backpack",
            "quantity": 2,
            "price": 109.95,
            "description": "Your perfect pack for everyday use",
            "image": "https://fakestoreapi.com/img/81fPKd-2AYL._AC_SL1500_.jpg"
        }))
        .unwrap()
    }

    fn validation_message(form: &AddProduct) -> String {
        match form.validate() {
            Err(InventoryError::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_deserializes_catalog_shaped_body() {
        let form = form();
        assert!(form.user_id.is_none());
        assert_eq!(form.price, "109.95".parse::<Decimal>().unwrap());
    }

    #[test]
    fn test_validate_accepts_valid_form() {
        let item = form().validate().unwrap();
        assert_eq!(item.product_id, 1);
        assert_eq!(item.quantity, 2);
        assert_eq!(item.price.to_string(), "109.95");
    }

    #[test]
    fn test_validate_defaults_image() {
        let form = AddProduct {
            image: None,
            ..form()
        };
        assert_eq!(form.validate().unwrap().image, DEFAULT_IMAGE_URL);

        let blank = AddProduct {
            image: Some(String::new()),
            ..form
        };
        assert_eq!(blank.validate().unwrap().image, DEFAULT_IMAGE_URL);
    }

    #[test]
    fn test_validate_rejects_non_positive_quantity() {
        let form = AddProduct {
            quantity: 0,
            ..form()
        };
        assert_eq!(validation_message(&form), "Quantity must be at least 1");
    }

    #[test]
    fn test_validate_rejects_negative_price() {
        let form = AddProduct {
            price: "-1".parse().unwrap(),
            ..form()
        };
        assert_eq!(validation_message(&form), "Price cannot be negative");
    }

    #[test]
    fn test_validate_rejects_sub_cent_price() {
        let form = AddProduct {
            price: "1.005".parse().unwrap(),
            ..form()
        };
        assert!(validation_message(&form).contains("2 decimal places"));
    }

    #[test]
    fn test_validate_rejects_price_beyond_storage() {
        let form = AddProduct {
            price: "10000000000".parse().unwrap(),
            ..form()
        };
        assert_eq!(validation_message(&form), "Price is too large");

        let largest = AddProduct {
            price: MAX_UNIT_PRICE,
            ..self::form()
        };
        assert_eq!(largest.validate().unwrap().price.to_string(), "9999999999.99");
    }

    #[test]
    fn test_validate_collects_missing_text() {
        let form = AddProduct {
            name: " ".to_string(),
            description: String::new(),
            ..form()
        };
        let msg = validation_message(&form);
        assert!(msg.contains("Name is required"));
        assert!(msg.contains("Description is required"));
    }
}

//! Domain models for the back office.
//!
//! These types represent validated domain objects separate from database row
//! types. They serialize with camelCase field names, which is the shape the
//! JSON API exposes.

pub mod inventory;
pub mod invoice;
pub mod user;

pub use inventory::{InventoryItem, InventoryListing, NewInventoryItem};
pub use invoice::{Invoice, InvoiceDetails, InvoiceDraft, InvoiceLineItem, InvoiceOwner};
pub use user::{NewUser, ProfileChanges, User};

/// Image used when a user or inventory item has none.
pub const DEFAULT_IMAGE_URL: &str = "https://cdn-icons-png.flaticon.com/512/149/149071.png";

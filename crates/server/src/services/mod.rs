//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, bearer tokens and profile updates
//! - `catalog` - Cached pass-through to the external product catalog
//! - `inventory` - Per-user cart lines with quantity accumulation
//! - `invoices` - Atomic invoice creation, viewing, listing and deletion
//! - `render` - Invoice HTML and PDF conversion

pub mod auth;
pub mod catalog;
pub mod inventory;
pub mod invoices;
pub mod render;

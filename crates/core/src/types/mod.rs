//! Core types for cartsync.
//!
//! This module provides type-safe wrappers for cart domain concepts.

pub mod id;
pub mod identity;
pub mod line_item;
pub mod price;
pub mod text;

pub use id::*;
pub use identity::CartIdentity;
pub use line_item::{CartLineItem, CartSummary, NewCartItem, Quantity};
pub use price::Price;
pub use text::{ItemCode, TextError, UniqueId, UserId};

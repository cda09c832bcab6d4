//! Cart line items.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::CartId;
use super::price::Price;
use super::text::ItemCode;

/// Number of units on a cart line. Always at least one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// A single unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity, rejecting zero.
    #[must_use]
    pub const fn new(units: u32) -> Option<Self> {
        if units == 0 { None } else { Some(Self(units)) }
    }

    /// Get the number of units.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An item the shopper wants to put in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCartItem {
    pub item_code: ItemCode,
    pub quantity: Quantity,
    /// Current selling price.
    pub new_price: Price,
    /// Price before discount. Shown struck through in the app.
    pub old_price: Price,
    pub discount: Price,
}

impl NewCartItem {
    /// Create an item at `price` with no discount.
    #[must_use]
    pub const fn new(item_code: ItemCode, quantity: Quantity, price: Price) -> Self {
        Self {
            item_code,
            quantity,
            new_price: price,
            old_price: price,
            discount: Price::ZERO,
        }
    }

    /// Set the pre-discount price.
    #[must_use]
    pub fn with_old_price(mut self, old_price: Price) -> Self {
        self.old_price = old_price;
        self
    }

    /// Set the discount amount.
    #[must_use]
    pub fn with_discount(mut self, discount: Price) -> Self {
        self.discount = discount;
        self
    }
}

/// A line in a backend cart.
///
/// The client holds no durable copy; every read re-fetches the full cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    /// Backend row ID. `None` until the backend has echoed one back.
    pub cart_id: Option<CartId>,
    pub item_code: ItemCode,
    pub quantity: Quantity,
    pub new_price: Price,
    pub old_price: Price,
    pub discount: Price,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl CartLineItem {
    /// Selling price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.new_price.times(self.quantity.get())
    }

    /// Build the line the backend will hold for a freshly added item.
    #[must_use]
    pub fn from_new_item(item: &NewCartItem, cart_id: Option<CartId>) -> Self {
        Self {
            cart_id,
            item_code: item.item_code.clone(),
            quantity: item.quantity,
            new_price: item.new_price,
            old_price: item.old_price,
            discount: item.discount,
            item_name: None,
            image_url: None,
        }
    }
}

/// Totals over a set of cart lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CartSummary {
    /// Number of distinct lines.
    pub lines: usize,
    /// Sum of quantities across lines.
    pub units: u64,
    pub subtotal: Price,
}

impl CartSummary {
    /// Summarize cart lines.
    #[must_use]
    pub fn of(items: &[CartLineItem]) -> Self {
        Self {
            lines: items.len(),
            units: items.iter().map(|i| u64::from(i.quantity.get())).sum(),
            subtotal: items.iter().map(CartLineItem::line_total).sum(),
        }
    }
}

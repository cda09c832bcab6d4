//! Wire types for the cart backend and their decoding into typed outcomes.
//!
//! Bodies are decoded here and nowhere else. Callers only ever see
//! [`AddedItem`], line items, or a [`CartError`].

use cartsync_core::{CartId, CartLineItem, ItemCode, Price, Quantity};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use super::error::CartError;
use crate::config::ResponseCodes;

// =============================================================================
// Requests
// =============================================================================

/// Body for `/AddToCart`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct AddToCartRequest<'a> {
    pub item_code: &'a str,
    pub new_price: Price,
    pub old_price: Price,
    pub discount: Price,
    pub user_id: &'a str,
    pub unique_id: &'a str,
    pub ip_address: &'a str,
    pub company: &'a str,
    pub location: &'a str,
    pub qty: u32,
}

/// Body for `/UpdateCartQty`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct UpdateCartQtyRequest<'a> {
    pub cart_id: CartId,
    pub qty: u32,
    pub company: &'a str,
    pub location: &'a str,
}

/// Body for `/DeleteCartItem`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub(crate) struct DeleteCartItemRequest<'a> {
    pub cart_id: CartId,
    pub company: &'a str,
}

/// Body for `/getData_JSON`.
#[derive(Debug, Serialize)]
pub(crate) struct QueryRequest<'a> {
    #[serde(rename = "strQuery")]
    pub str_query: &'a str,
}

// =============================================================================
// Responses
// =============================================================================

/// A scalar the backend sends as either a number, a numeric string or a bool.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Loose {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
}

impl Loose {
    #[allow(clippy::cast_possible_truncation)] // codes are small integers
    fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            Self::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            Self::Float(_) => None,
            Self::Bool(b) => Some(i64::from(*b)),
            Self::Text(s) => s.trim().parse().ok(),
        }
    }
}

/// Reply from `/AddToCart`, `/UpdateCartQty` and `/DeleteCartItem`.
#[derive(Debug, Default, Deserialize)]
struct WriteResponse {
    #[serde(rename = "ResponseCode", alias = "responseCode", default)]
    response_code: Option<Loose>,
    #[serde(rename = "Message", alias = "ResponseMessage", alias = "message", default)]
    message: Option<String>,
    #[serde(rename = "CartId", alias = "cartId", default)]
    cart_id: Option<Loose>,
    #[serde(rename = "error", alias = "Error", alias = "IsError", default)]
    error: Option<Value>,
}

impl WriteResponse {
    fn message(&self) -> String {
        self.message.clone().unwrap_or_default()
    }

    fn error_flagged(&self) -> bool {
        match &self.error {
            None | Some(Value::Null) => false,
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
            Some(Value::String(s)) => {
                let s = s.trim();
                !(s.is_empty() || s.eq_ignore_ascii_case("false") || s == "0")
            }
            Some(Value::Array(a)) => !a.is_empty(),
            Some(Value::Object(o)) => !o.is_empty(),
        }
    }

    fn error_text(&self) -> Option<String> {
        match &self.error {
            Some(Value::String(s)) if !s.trim().is_empty() => Some(s.clone()),
            _ => self.message.clone(),
        }
    }
}

/// Reply from `/getData_JSON`.
#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    success: Option<Loose>,
    #[serde(default)]
    row: Option<Value>,
    #[serde(alias = "msg", alias = "Message", default)]
    message: Option<String>,
}

/// One row of the cart listing procedure.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct CartRow {
    cart_id: Loose,
    item_code: String,
    #[serde(alias = "Quantity")]
    qty: Loose,
    new_price: Price,
    #[serde(default)]
    old_price: Option<Price>,
    #[serde(default)]
    discount: Option<Price>,
    #[serde(alias = "ItemDescription", default)]
    item_name: Option<String>,
    #[serde(alias = "ImagePath", alias = "ImageUrl", default)]
    image_url: Option<String>,
}

/// Why a listed row could not become a cart line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RowRejected {
    /// `CartId` as sent, if it was numeric.
    cart_id: Option<i64>,
    reason: &'static str,
}

impl CartRow {
    fn into_line_item(self) -> Result<CartLineItem, RowRejected> {
        let raw_cart_id = self.cart_id.as_i64();
        let reject = |reason| RowRejected {
            cart_id: raw_cart_id,
            reason,
        };

        let cart_id = raw_cart_id
            .and_then(|n| i32::try_from(n).ok())
            .map(CartId::new)
            .filter(CartId::is_assigned)
            .ok_or_else(|| reject("missing or unassigned CartId"))?;
        let item_code =
            ItemCode::parse(&self.item_code).map_err(|_| reject("blank or oversized ItemCode"))?;
        let quantity = self
            .qty
            .as_i64()
            .and_then(|n| u32::try_from(n).ok())
            .and_then(Quantity::new)
            .ok_or_else(|| reject("Qty below 1"))?;

        Ok(CartLineItem {
            cart_id: Some(cart_id),
            item_code,
            quantity,
            new_price: self.new_price,
            old_price: self.old_price.unwrap_or(self.new_price),
            discount: self.discount.unwrap_or(Price::ZERO),
            item_name: self.item_name.filter(|s| !s.trim().is_empty()),
            image_url: self.image_url.filter(|s| !s.trim().is_empty()),
        })
    }
}

// =============================================================================
// Outcomes
// =============================================================================

/// How the backend applied an add-to-cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddStatus {
    /// A new line was created.
    Added,
    /// The item was already in the cart and its quantity was updated.
    Updated,
}

/// Successful add-to-cart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedItem {
    pub status: AddStatus,
    /// Raw `ResponseCode`.
    pub code: i64,
    /// Backend message, verbatim.
    pub message: String,
    /// The line as requested. Its `cart_id` is set only if the backend
    /// echoed one.
    pub item: CartLineItem,
}

/// Decoded add-to-cart reply, before it is joined with the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AddReply {
    pub status: AddStatus,
    pub code: i64,
    pub message: String,
    pub cart_id: Option<CartId>,
}

// =============================================================================
// Decoding
// =============================================================================

/// Decode an `/AddToCart` body.
pub(crate) fn decode_add(body: &[u8], codes: &ResponseCodes) -> Result<AddReply, CartError> {
    let response: WriteResponse = serde_json::from_slice(body)?;

    let code = response
        .response_code
        .as_ref()
        .and_then(Loose::as_i64)
        .ok_or_else(|| CartError::network("add-to-cart reply has no ResponseCode"))?;
    let message = response.message();

    let status = if code == codes.added {
        AddStatus::Added
    } else if code == codes.updated {
        AddStatus::Updated
    } else if code == codes.out_of_stock {
        return Err(CartError::OutOfStock { code, message });
    } else {
        return Err(CartError::BackendRejected { code, message });
    };

    let cart_id = response
        .cart_id
        .as_ref()
        .and_then(Loose::as_i64)
        .and_then(|n| i32::try_from(n).ok())
        .map(CartId::new)
        .filter(CartId::is_assigned);

    Ok(AddReply {
        status,
        code,
        message,
        cart_id,
    })
}

/// Decode an `/UpdateCartQty` or `/DeleteCartItem` body.
///
/// An empty body is an acknowledgement.
pub(crate) fn decode_ack(body: &[u8]) -> Result<(), CartError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(());
    }

    let value: Value = serde_json::from_slice(body)?;
    // Some deployments answer with a bare `true` / `1`.
    let response = match value {
        Value::Object(_) => WriteResponse::deserialize(value)?,
        Value::Bool(false) => {
            return Err(CartError::BackendRejected {
                code: 0,
                message: "backend returned false".to_string(),
            });
        }
        _ => WriteResponse::default(),
    };

    let code = response.response_code.as_ref().and_then(Loose::as_i64);
    if response.error_flagged() || code.is_some_and(|c| c < 0) {
        return Err(CartError::BackendRejected {
            code: code.unwrap_or(0),
            message: response.error_text().unwrap_or_default(),
        });
    }
    Ok(())
}

/// Decode a `/getData_JSON` body into its raw rows.
///
/// A successful reply with a missing, null or non-array `row` is an empty
/// result. Anything other than `success == 1` is a rejection; the backend
/// cannot tell "no data" apart from a malformed query, so neither can we.
pub(crate) fn decode_rows(body: &[u8]) -> Result<Vec<Value>, CartError> {
    let response: QueryResponse = serde_json::from_slice(body)?;

    let success = response.success.as_ref().and_then(Loose::as_i64);
    if success != Some(1) {
        return Err(CartError::BackendRejected {
            code: success.unwrap_or(0),
            message: response
                .message
                .unwrap_or_else(|| "query did not succeed".to_string()),
        });
    }

    Ok(match response.row {
        Some(Value::Array(rows)) => rows,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!(kind = json_kind(&other), "Query row field is not an array");
            Vec::new()
        }
    })
}

/// Decode cart listing rows, dropping any that do not form a valid line.
pub(crate) fn decode_cart_rows(rows: Vec<Value>) -> Vec<CartLineItem> {
    rows.into_iter()
        .filter_map(|row| match CartRow::deserialize(row) {
            Ok(row) => match row.into_line_item() {
                Ok(item) => Some(item),
                Err(rejected) => {
                    warn!(
                        cart_id = ?rejected.cart_id,
                        reason = rejected.reason,
                        "Dropping cart row"
                    );
                    None
                }
            },
            Err(e) => {
                warn!(error = %e, "Dropping undecodable cart row");
                None
            }
        })
        .collect()
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

//! Cart backend HTTP client.
//!
//! Translates the four cart operations into single POST requests and
//! normalizes their outcomes into [`AddedItem`], [`CartLineItem`]s or
//! [`CartError`].

use std::sync::Arc;

use cartsync_core::{CartId, CartIdentity, CartLineItem, NewCartItem, Quantity};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error, instrument, warn};
use url::Url;

use super::error::CartError;
use super::queries::{CartQuery, StoredProcedure, render_query};
use super::types::{
    AddToCartRequest, AddedItem, DeleteCartItemRequest, QueryRequest, UpdateCartQtyRequest,
    decode_ack, decode_add, decode_cart_rows, decode_rows,
};
use crate::config::{CartConfig, ConfigError};

const ADD_TO_CART: &str = "AddToCart";
const UPDATE_CART_QTY: &str = "UpdateCartQty";
const DELETE_CART_ITEM: &str = "DeleteCartItem";
const QUERY: &str = "getData_JSON";

/// Cart backend client.
///
/// Holds no cart state: every read re-fetches from the backend, and each
/// operation is exactly one request with no retries.
#[derive(Clone)]
pub struct CartClient {
    inner: Arc<CartClientInner>,
}

struct CartClientInner {
    http: reqwest::Client,
    config: CartConfig,
    endpoints: Endpoints,
}

struct Endpoints {
    add: Url,
    update: Url,
    delete: Url,
    query: Url,
}

impl std::fmt::Debug for CartClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartClient")
            .field("base_url", &self.inner.config.base_url.as_str())
            .field("company", &self.inner.config.company)
            .field("location", &self.inner.config.location)
            .finish_non_exhaustive()
    }
}

impl CartClient {
    /// Create a new cart client.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEndpoint` if an endpoint URL cannot be
    /// built from the base URL, or `ConfigError::HttpClient` if the HTTP
    /// client fails to build.
    pub fn new(config: CartConfig) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        let endpoint = |name: &str| {
            config
                .endpoint(name)
                .map_err(|e| ConfigError::InvalidEndpoint {
                    name: name.to_string(),
                    reason: e.to_string(),
                })
        };
        let endpoints = Endpoints {
            add: endpoint(ADD_TO_CART)?,
            update: endpoint(UPDATE_CART_QTY)?,
            delete: endpoint(DELETE_CART_ITEM)?,
            query: endpoint(QUERY)?,
        };

        Ok(Self {
            inner: Arc::new(CartClientInner {
                http,
                config,
                endpoints,
            }),
        })
    }

    /// The configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &CartConfig {
        &self.inner.config
    }

    // =========================================================================
    // Cart operations
    // =========================================================================

    /// Add an item to the identity's cart.
    ///
    /// Adding an item code that is already in the cart bumps its quantity
    /// on the backend and reports [`AddStatus::Updated`](super::AddStatus).
    ///
    /// # Errors
    ///
    /// Returns `CartError::OutOfStock` if the backend reports no stock.
    /// Returns `CartError::BackendRejected` for any other non-success code.
    /// Returns `CartError::NetworkFailure` if the request fails or the reply
    /// is undecodable.
    #[instrument(
        skip(self, identity, item),
        fields(item_code = %item.item_code, qty = %item.quantity, identity = identity.kind())
    )]
    pub async fn add_item(
        &self,
        identity: &CartIdentity,
        item: &NewCartItem,
    ) -> Result<AddedItem, CartError> {
        let config = &self.inner.config;
        let body = AddToCartRequest {
            item_code: item.item_code.as_str(),
            new_price: item.new_price,
            old_price: item.old_price,
            discount: item.discount,
            user_id: identity.user_id_field(),
            unique_id: identity.unique_id_field(),
            ip_address: &config.ip_address,
            company: &config.company,
            location: &config.location,
            qty: item.quantity.get(),
        };

        let bytes = self.post(&self.inner.endpoints.add, &body).await?;
        let reply = decode_add(&bytes, &config.response_codes).inspect_err(log_failure)?;

        debug!(
            status = ?reply.status,
            code = reply.code,
            cart_id = ?reply.cart_id,
            "Item added to cart"
        );

        Ok(AddedItem {
            status: reply.status,
            code: reply.code,
            message: reply.message,
            item: CartLineItem::from_new_item(item, reply.cart_id),
        })
    }

    /// List the lines in the identity's cart.
    ///
    /// An identity with no cart rows yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns `CartError::BackendRejected` if the query does not report
    /// success, or `CartError::NetworkFailure` if the request fails.
    #[instrument(skip(self, identity), fields(identity = identity.kind()))]
    pub async fn list_items(&self, identity: &CartIdentity) -> Result<Vec<CartLineItem>, CartError> {
        let config = &self.inner.config;
        let query = CartQuery {
            procedure: &config.cart_procedure,
            company: &config.company,
            location: &config.location,
            identity,
        };

        let rows = self.execute(&query).await?;
        let items = decode_cart_rows(rows);
        debug!(lines = items.len(), "Cart fetched");
        Ok(items)
    }

    /// Set the quantity of an existing cart line.
    ///
    /// # Errors
    ///
    /// Returns `CartError::PreconditionFailed` without sending anything if
    /// `cart_id` is absent or unassigned. Otherwise as [`Self::delete_item`].
    #[instrument(skip_all, fields(cart_id = ?cart_id, qty = %quantity))]
    pub async fn update_quantity(
        &self,
        cart_id: Option<CartId>,
        quantity: Quantity,
    ) -> Result<(), CartError> {
        let cart_id = require_cart_id(cart_id, "update quantity").inspect_err(log_failure)?;
        let config = &self.inner.config;
        let body = UpdateCartQtyRequest {
            cart_id,
            qty: quantity.get(),
            company: &config.company,
            location: &config.location,
        };

        let bytes = self.post(&self.inner.endpoints.update, &body).await?;
        decode_ack(&bytes).inspect_err(log_failure)?;

        debug!("Cart quantity updated");
        Ok(())
    }

    /// Remove a line from the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::PreconditionFailed` without sending anything if
    /// `cart_id` is absent or unassigned.
    /// Returns `CartError::BackendRejected` on a non-2xx status or an error
    /// flag in the body.
    /// Returns `CartError::NetworkFailure` if the request fails.
    #[instrument(skip_all, fields(cart_id = ?cart_id))]
    pub async fn delete_item(&self, cart_id: Option<CartId>) -> Result<(), CartError> {
        let cart_id = require_cart_id(cart_id, "delete item").inspect_err(log_failure)?;
        let body = DeleteCartItemRequest {
            cart_id,
            company: &self.inner.config.company,
        };

        let bytes = self.post(&self.inner.endpoints.delete, &body).await?;
        decode_ack(&bytes).inspect_err(log_failure)?;

        debug!("Cart item deleted");
        Ok(())
    }

    // =========================================================================
    // Generic query
    // =========================================================================

    /// Run a stored procedure through the generic query endpoint and return
    /// its raw rows.
    ///
    /// # Errors
    ///
    /// Returns `CartError::PreconditionFailed` if the procedure name is
    /// invalid, `CartError::BackendRejected` if the query does not report
    /// success, or `CartError::NetworkFailure` if the request fails.
    #[instrument(skip_all, fields(procedure = query.procedure()))]
    pub async fn execute<Q: StoredProcedure + ?Sized>(
        &self,
        query: &Q,
    ) -> Result<Vec<Value>, CartError> {
        let str_query = render_query(query)?;
        let body = QueryRequest {
            str_query: &str_query,
        };

        let bytes = self.post(&self.inner.endpoints.query, &body).await?;
        decode_rows(&bytes).inspect_err(log_failure)
    }

    // =========================================================================
    // Transport
    // =========================================================================

    /// POST a JSON body and return the response bytes of a 2xx reply.
    async fn post<B: Serialize + ?Sized>(&self, url: &Url, body: &B) -> Result<Vec<u8>, CartError> {
        let response = self
            .inner
            .http
            .post(url.clone())
            .json(body)
            .send()
            .await
            .map_err(CartError::from)
            .inspect_err(log_failure)?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(CartError::from)
            .inspect_err(log_failure)?;

        if !status.is_success() {
            let err = CartError::BackendRejected {
                code: i64::from(status.as_u16()),
                message: String::from_utf8_lossy(&bytes).into_owned(),
            };
            log_failure(&err);
            return Err(err);
        }

        Ok(bytes.to_vec())
    }
}

/// Only a backend-issued, positive cart ID may be sent.
fn require_cart_id(cart_id: Option<CartId>, operation: &str) -> Result<CartId, CartError> {
    cart_id.filter(CartId::is_assigned).ok_or_else(|| {
        CartError::PreconditionFailed(format!("{operation} requires a cart id from the backend"))
    })
}

fn log_failure(err: &CartError) {
    match err {
        CartError::NetworkFailure { message } => {
            error!(error = %message, "Cart backend unreachable");
        }
        CartError::OutOfStock { code, message } => {
            warn!(code, message = %message, "Cart backend reports out of stock");
        }
        CartError::BackendRejected { code, message } => {
            warn!(code, message = %message, "Cart backend rejected request");
        }
        CartError::PreconditionFailed(message) => {
            warn!(message = %message, "Cart request not sent");
        }
    }
}

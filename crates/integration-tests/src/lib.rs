//! Integration tests for cartsync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cartsync-integration-tests
//! ```
//!
//! Tests run against [`FakeBackend`], an in-process axum server that speaks
//! the cart backend's wire format and keeps its cart table in memory. No
//! external services are needed.
//!
//! # Test Categories
//!
//! - `cart_workflow` - Add, list, update and delete through `CartClient`
//! - `failures` - Network, timeout and backend rejection mapping
//! - `reachability` - Monitor against a live and a dead backend

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use cartsync_client::{CartClient, CartConfig, ConfigError};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// First cart line ID handed out by a fresh backend.
pub const FIRST_CART_ID: i32 = 28447;

/// Stored procedure the fake backend answers for cart listings.
pub const CART_PROCEDURE: &str = "GetCartDetails";

/// A request as the fake backend received it.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Endpoint name, e.g. `AddToCart`.
    pub endpoint: &'static str,
    pub body: Value,
}

/// One row of the fake cart table.
#[derive(Debug, Clone)]
pub struct StoredLine {
    pub cart_id: i32,
    pub company: String,
    pub location: String,
    pub user_id: String,
    pub unique_id: String,
    pub item_code: String,
    pub qty: u32,
    pub new_price: Value,
    pub old_price: Value,
    pub discount: Value,
}

impl StoredLine {
    fn belongs_to(&self, company: &str, location: &str, user_id: &str, unique_id: &str) -> bool {
        if self.company != company || self.location != location {
            return false;
        }
        if user_id.is_empty() {
            self.user_id.is_empty() && self.unique_id == unique_id
        } else {
            self.user_id == user_id
        }
    }

    fn to_row(&self) -> Value {
        json!({
            "CartId": self.cart_id,
            "ItemCode": self.item_code,
            "Qty": self.qty,
            "NewPrice": self.new_price,
            "OldPrice": self.old_price,
            "Discount": self.discount,
            "ItemName": format!("Item {}", self.item_code),
        })
    }
}

struct Tables {
    lines: Vec<StoredLine>,
    next_cart_id: i32,
    out_of_stock: HashSet<String>,
    delay: Duration,
    forced_status: Option<StatusCode>,
    echo_cart_id: bool,
    requests: Vec<RecordedRequest>,
}

impl Default for Tables {
    fn default() -> Self {
        Self {
            lines: Vec::new(),
            next_cart_id: FIRST_CART_ID,
            out_of_stock: HashSet::new(),
            delay: Duration::ZERO,
            forced_status: None,
            echo_cart_id: true,
            requests: Vec::new(),
        }
    }
}

#[derive(Default)]
struct BackendState {
    tables: Mutex<Tables>,
    request_count: AtomicUsize,
}

impl BackendState {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

type SharedState = Arc<BackendState>;

/// In-process stand-in for the cart backend.
///
/// Serves `/api/AddToCart`, `/api/UpdateCartQty`, `/api/DeleteCartItem`
/// and `/api/getData_JSON` on an ephemeral localhost port. The server stops
/// when the value is dropped.
pub struct FakeBackend {
    addr: SocketAddr,
    state: SharedState,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// # Errors
    ///
    /// Returns error if the listener cannot be bound.
    pub async fn start() -> std::io::Result<Self> {
        let state = SharedState::default();
        let app = Router::new().nest("/api", routes()).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Fake backend stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL to configure the client with.
    ///
    /// # Panics
    ///
    /// Never in practice: the address is always a valid host.
    #[must_use]
    pub fn base_url(&self) -> Url {
        Url::parse(&format!("http://{}/api", self.addr)).expect("socket address forms a URL")
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> CartConfig {
        CartConfig::new(self.base_url()).with_timeout(Duration::from_secs(5))
    }

    /// A client for this backend.
    ///
    /// # Errors
    ///
    /// Returns error if the client cannot be built.
    pub fn client(&self) -> Result<CartClient, ConfigError> {
        CartClient::new(self.config())
    }

    /// Number of requests received so far, on any endpoint.
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.state.request_count.load(Ordering::SeqCst)
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.tables().requests.clone()
    }

    /// Current contents of the cart table.
    #[must_use]
    pub fn lines(&self) -> Vec<StoredLine> {
        self.state.tables().lines.clone()
    }

    /// Make `/AddToCart` report `item_code` as out of stock.
    pub fn mark_out_of_stock(&self, item_code: &str) {
        self.state
            .tables()
            .out_of_stock
            .insert(item_code.to_string());
    }

    /// Hold every reply for `delay` before answering.
    pub fn set_delay(&self, delay: Duration) {
        self.state.tables().delay = delay;
    }

    /// Answer every request with `status` and a plain-text body.
    pub fn fail_with(&self, status: StatusCode) {
        self.state.tables().forced_status = Some(status);
    }

    /// Whether `/AddToCart` includes the `CartId` in its reply.
    pub fn set_echo_cart_id(&self, echo: bool) {
        self.state.tables().echo_cart_id = echo;
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// An address with nothing listening on it.
///
/// # Errors
///
/// Returns error if no ephemeral port could be reserved.
pub fn closed_port_url() -> std::io::Result<Url> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Url::parse(&format!("http://{addr}/api"))
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
}

// =============================================================================
// Routes
// =============================================================================

fn routes() -> Router<SharedState> {
    Router::new()
        .route("/AddToCart", post(add_to_cart))
        .route("/UpdateCartQty", post(update_cart_qty))
        .route("/DeleteCartItem", post(delete_cart_item))
        .route("/getData_JSON", post(get_data_json))
}

/// Record the request, apply the configured delay, and return a forced
/// failure if one is set.
async fn begin(state: &BackendState, endpoint: &'static str, body: &Value) -> Option<Response> {
    state.request_count.fetch_add(1, Ordering::SeqCst);
    let (delay, forced) = {
        let mut tables = state.tables();
        tables.requests.push(RecordedRequest {
            endpoint,
            body: body.clone(),
        });
        (tables.delay, tables.forced_status)
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
    forced.map(|status| (status, "Internal error").into_response())
}

fn bad_request(e: &serde_json::Error) -> Response {
    (StatusCode::BAD_REQUEST, e.to_string()).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct AddToCartBody {
    item_code: String,
    new_price: Value,
    old_price: Value,
    discount: Value,
    user_id: String,
    unique_id: String,
    company: String,
    location: String,
    qty: u32,
}

async fn add_to_cart(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    if let Some(response) = begin(&state, "AddToCart", &body).await {
        return response;
    }
    let req: AddToCartBody = match serde_json::from_value(body) {
        Ok(req) => req,
        Err(e) => return bad_request(&e),
    };

    let mut tables = state.tables();
    if tables.out_of_stock.contains(&req.item_code) {
        return Json(json!({ "ResponseCode": 3, "Message": "Out of stock" })).into_response();
    }

    let existing = tables.lines.iter_mut().find(|line| {
        line.item_code == req.item_code
            && line.belongs_to(&req.company, &req.location, &req.user_id, &req.unique_id)
    });
    let (code, message, cart_id) = if let Some(line) = existing {
        line.qty += req.qty;
        (2, "Cart updated", line.cart_id)
    } else {
        let cart_id = tables.next_cart_id;
        tables.next_cart_id += 1;
        tables.lines.push(StoredLine {
            cart_id,
            company: req.company,
            location: req.location,
            user_id: req.user_id,
            unique_id: req.unique_id,
            item_code: req.item_code,
            qty: req.qty,
            new_price: req.new_price,
            old_price: req.old_price,
            discount: req.discount,
        });
        (1, "Item added to cart", cart_id)
    };

    let mut reply = json!({ "ResponseCode": code, "Message": message });
    if tables.echo_cart_id {
        reply["CartId"] = json!(cart_id);
    }
    Json(reply).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct UpdateCartQtyBody {
    cart_id: i32,
    qty: u32,
    company: String,
}

async fn update_cart_qty(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    if let Some(response) = begin(&state, "UpdateCartQty", &body).await {
        return response;
    }
    let req: UpdateCartQtyBody = match serde_json::from_value(body) {
        Ok(req) => req,
        Err(e) => return bad_request(&e),
    };

    let mut tables = state.tables();
    let line = tables
        .lines
        .iter_mut()
        .find(|line| line.cart_id == req.cart_id && line.company == req.company);
    let reply = match line {
        Some(_) if req.qty == 0 => json!({ "error": "Quantity must be positive" }),
        Some(line) => {
            line.qty = req.qty;
            json!({ "ResponseCode": 1, "Message": "Quantity updated" })
        }
        None => json!({ "ResponseCode": -1, "error": "Cart item not found" }),
    };
    Json(reply).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DeleteCartItemBody {
    cart_id: i32,
    company: String,
}

async fn delete_cart_item(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    if let Some(response) = begin(&state, "DeleteCartItem", &body).await {
        return response;
    }
    let req: DeleteCartItemBody = match serde_json::from_value(body) {
        Ok(req) => req,
        Err(e) => return bad_request(&e),
    };

    let mut tables = state.tables();
    let before = tables.lines.len();
    tables
        .lines
        .retain(|line| !(line.cart_id == req.cart_id && line.company == req.company));
    let reply = if tables.lines.len() < before {
        json!({ "ResponseCode": 1, "Message": "Item removed" })
    } else {
        json!({ "ResponseCode": -1, "error": "Cart item not found" })
    };
    Json(reply).into_response()
}

#[derive(Deserialize)]
struct QueryBody {
    #[serde(rename = "strQuery")]
    str_query: String,
}

async fn get_data_json(State(state): State<SharedState>, Json(body): Json<Value>) -> Response {
    if let Some(response) = begin(&state, "getData_JSON", &body).await {
        return response;
    }
    let req: QueryBody = match serde_json::from_value(body) {
        Ok(req) => req,
        Err(e) => return bad_request(&e),
    };

    let Some((procedure, args)) = parse_exec(&req.str_query) else {
        return Json(json!({ "success": 0, "msg": "Incorrect syntax" })).into_response();
    };
    if procedure != CART_PROCEDURE {
        return Json(json!({
            "success": 0,
            "msg": format!("Could not find stored procedure '{procedure}'"),
        }))
        .into_response();
    }
    let [company, location, user_id, unique_id] = args.as_slice() else {
        return Json(json!({
            "success": 0,
            "msg": format!("{procedure} expects 4 arguments, got {}", args.len()),
        }))
        .into_response();
    };

    let rows: Vec<Value> = state
        .tables()
        .lines
        .iter()
        .filter(|line| line.belongs_to(company, location, user_id, unique_id))
        .map(StoredLine::to_row)
        .collect();
    Json(json!({ "success": 1, "row": rows })).into_response()
}

/// Split `EXEC Name 'a','b',5` into the procedure name and its arguments.
fn parse_exec(query: &str) -> Option<(&str, Vec<String>)> {
    let rest = query.trim().strip_prefix("EXEC ")?;
    let (name, args) = rest.split_once(' ').unwrap_or((rest, ""));

    let mut out = Vec::new();
    let mut chars = args.chars().peekable();
    while chars.peek().is_some() {
        let mut arg = String::new();
        if chars.peek() == Some(&'\'') {
            chars.next();
            loop {
                match chars.next()? {
                    '\'' if chars.peek() == Some(&'\'') => {
                        chars.next();
                        arg.push('\'');
                    }
                    '\'' => break,
                    c => arg.push(c),
                }
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c == ',' {
                    break;
                }
                arg.push(c);
                chars.next();
            }
        }
        out.push(arg);

        match chars.next() {
            None => break,
            Some(',') => {}
            Some(_) => return None,
        }
    }
    Some((name, out))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_exec() {
        let (name, args) = parse_exec("EXEC GetCartDetails '1','1','','guest-1'").unwrap();
        assert_eq!(name, "GetCartDetails");
        assert_eq!(args, vec!["1", "1", "", "guest-1"]);
    }

    #[test]
    fn test_parse_exec_escaped_quote_and_number() {
        let (name, args) = parse_exec("EXEC Lookup 'O''Brien',5").unwrap();
        assert_eq!(name, "Lookup");
        assert_eq!(args, vec!["O'Brien", "5"]);
    }

    #[test]
    fn test_parse_exec_rejects_garbage() {
        assert!(parse_exec("SELECT 1").is_none());
        assert!(parse_exec("EXEC P 'unterminated").is_none());
    }

    #[test]
    fn test_belongs_to_prefers_user_id() {
        let line = StoredLine {
            cart_id: 1,
            company: "1".into(),
            location: "1".into(),
            user_id: "1007".into(),
            unique_id: "guest-1".into(),
            item_code: "IM1".into(),
            qty: 1,
            new_price: json!(20),
            old_price: json!(20),
            discount: json!(0),
        };
        assert!(line.belongs_to("1", "1", "1007", ""));
        assert!(!line.belongs_to("1", "1", "", "guest-1"));
        assert!(!line.belongs_to("2", "1", "1007", ""));
    }
}

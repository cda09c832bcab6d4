//! Cart workflow tests against the in-process fake backend.
//!
//! Run with: cargo test -p cartsync-integration-tests

use cartsync_client::{AddStatus, CartClient, CartError};
use cartsync_core::{
    CartId, CartIdentity, CartLineItem, ItemCode, NewCartItem, Price, Quantity, UniqueId, UserId,
};
use cartsync_integration_tests::{FIRST_CART_ID, FakeBackend};
use serde_json::json;

async fn backend() -> (FakeBackend, CartClient) {
    let backend = FakeBackend::start().await.expect("Failed to start fake backend");
    let client = backend.client().expect("Failed to build cart client");
    (backend, client)
}

fn item(code: &str, qty: u32, price: i64) -> NewCartItem {
    NewCartItem::new(
        ItemCode::parse(code).expect("valid item code"),
        Quantity::new(qty).expect("positive quantity"),
        Price::from_units(price),
    )
}

fn line_for(items: &[CartLineItem], cart_id: CartId) -> Option<&CartLineItem> {
    items.iter().find(|i| i.cart_id == Some(cart_id))
}

// ============================================================================
// Add
// ============================================================================

#[tokio::test]
async fn test_add_then_list_fresh_guest() {
    let (backend, client) = backend().await;
    let identity = CartIdentity::new_guest();

    let added = client
        .add_item(&identity, &item("IM31790673", 1, 20))
        .await
        .expect("add should succeed");
    assert!(matches!(added.status, AddStatus::Added | AddStatus::Updated));
    assert_eq!(added.code, 1);
    assert_eq!(added.item.cart_id, Some(CartId::new(FIRST_CART_ID)));

    let items = client.list_items(&identity).await.expect("list should succeed");
    let matching: Vec<_> = items
        .iter()
        .filter(|i| i.item_code.as_str() == "IM31790673")
        .collect();
    assert_eq!(matching.len(), 1);
    assert_eq!(matching[0].quantity.get(), 1);
    assert_eq!(matching[0].new_price, Price::from_units(20));
    assert_eq!(matching[0].item_name.as_deref(), Some("Item IM31790673"));

    assert_eq!(backend.request_count(), 2);
}

#[tokio::test]
async fn test_add_sends_backend_field_names() {
    let (backend, client) = backend().await;
    let identity = CartIdentity::from(UniqueId::parse("guest-42").expect("valid id"));

    client
        .add_item(
            &identity,
            &item("IM31790673", 1, 20)
                .with_old_price(Price::from_units(25))
                .with_discount(Price::from_units(5)),
        )
        .await
        .expect("add should succeed");

    let requests = backend.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].endpoint, "AddToCart");
    assert_eq!(
        requests[0].body,
        json!({
            "ItemCode": "IM31790673",
            "NewPrice": 20,
            "OldPrice": 25,
            "Discount": 5,
            "UserId": "",
            "UniqueId": "guest-42",
            "IpAddress": "0.0.0.0",
            "Company": "1",
            "Location": "1",
            "Qty": 1
        })
    );
}

#[tokio::test]
async fn test_adding_same_item_twice_updates_instead_of_duplicating() {
    let (backend, client) = backend().await;
    let identity = CartIdentity::new_guest();
    let new_item = item("IM31790673", 1, 20);

    let first = client.add_item(&identity, &new_item).await.expect("first add");
    let second = client.add_item(&identity, &new_item).await.expect("second add");

    assert_eq!(first.status, AddStatus::Added);
    assert_eq!(second.status, AddStatus::Updated);
    assert_eq!(second.code, 2);
    assert_eq!(first.item.cart_id, second.item.cart_id);

    let items = client.list_items(&identity).await.expect("list");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity.get(), 2);
    assert_eq!(backend.lines().len(), 1);
}

#[tokio::test]
async fn test_add_without_echoed_cart_id_leaves_it_unset() {
    let (backend, client) = backend().await;
    backend.set_echo_cart_id(false);
    let identity = CartIdentity::new_guest();

    let added = client
        .add_item(&identity, &item("IM1", 1, 20))
        .await
        .expect("add should succeed");

    assert_eq!(added.status, AddStatus::Added);
    assert_eq!(added.item.cart_id, None);
    assert_eq!(backend.request_count(), 1, "no follow-up lookup");
}

#[tokio::test]
async fn test_out_of_stock_is_distinguished() {
    let (backend, client) = backend().await;
    backend.mark_out_of_stock("IM404");
    let identity = CartIdentity::new_guest();

    let err = client
        .add_item(&identity, &item("IM404", 1, 20))
        .await
        .expect_err("add should fail");

    assert!(err.is_out_of_stock());
    assert_eq!(err.code(), Some(3));
    assert!(matches!(&err, CartError::OutOfStock { message, .. } if message == "Out of stock"));
    assert_eq!(err.user_message(), "This item is currently unavailable.");
    assert!(backend.lines().is_empty());
}

// ============================================================================
// List
// ============================================================================

#[tokio::test]
async fn test_list_empty_cart_is_ok() {
    let (backend, client) = backend().await;

    let items = client
        .list_items(&CartIdentity::new_guest())
        .await
        .expect("empty cart is not an error");
    assert!(items.is_empty());

    let requests = backend.requests();
    assert_eq!(requests[0].endpoint, "getData_JSON");
    let query = requests[0].body["strQuery"].as_str().expect("strQuery");
    assert!(query.starts_with("EXEC GetCartDetails '1','1','',"));
}

#[tokio::test]
async fn test_carts_are_scoped_to_identity() {
    let (_backend, client) = backend().await;
    let guest = CartIdentity::new_guest();
    let other_guest = CartIdentity::new_guest();
    let user = CartIdentity::from(UserId::parse("1007").expect("valid id"));

    client.add_item(&guest, &item("IM1", 1, 10)).await.expect("add");
    client.add_item(&user, &item("IM2", 3, 15)).await.expect("add");

    let guest_items = client.list_items(&guest).await.expect("list");
    let user_items = client.list_items(&user).await.expect("list");
    let other_items = client.list_items(&other_guest).await.expect("list");

    assert_eq!(guest_items.len(), 1);
    assert_eq!(guest_items[0].item_code.as_str(), "IM1");
    assert_eq!(user_items.len(), 1);
    assert_eq!(user_items[0].item_code.as_str(), "IM2");
    assert_eq!(user_items[0].line_total(), Price::from_units(45));
    assert!(other_items.is_empty());
}

#[tokio::test]
async fn test_unknown_procedure_is_rejected() {
    let backend = FakeBackend::start().await.expect("Failed to start fake backend");
    let mut config = backend.config();
    config.cart_procedure = "GetCartDetailsV2".to_string();
    let client = CartClient::new(config).expect("client");

    let err = client
        .list_items(&CartIdentity::new_guest())
        .await
        .expect_err("unknown procedure should fail");
    assert!(
        matches!(&err, CartError::BackendRejected { code: 0, message } if message.contains("GetCartDetailsV2"))
    );
}

// ============================================================================
// Update & delete
// ============================================================================

#[tokio::test]
async fn test_update_quantity_then_list() {
    let (_backend, client) = backend().await;
    let identity = CartIdentity::new_guest();
    let added = client
        .add_item(&identity, &item("IM31790673", 1, 20))
        .await
        .expect("add");
    let cart_id = CartId::new(FIRST_CART_ID);
    assert_eq!(added.item.cart_id, Some(cart_id));

    client
        .update_quantity(Some(cart_id), Quantity::new(2).expect("positive"))
        .await
        .expect("update should succeed");

    let items = client.list_items(&identity).await.expect("list");
    let line = line_for(&items, cart_id).expect("line still present");
    assert_eq!(line.quantity.get(), 2);
}

#[tokio::test]
async fn test_delete_then_list() {
    let (_backend, client) = backend().await;
    let identity = CartIdentity::new_guest();
    client
        .add_item(&identity, &item("IM31790673", 1, 20))
        .await
        .expect("add");
    client.add_item(&identity, &item("IM2", 1, 5)).await.expect("add");
    let cart_id = CartId::new(FIRST_CART_ID);

    client
        .delete_item(Some(cart_id))
        .await
        .expect("delete should succeed");

    let items = client.list_items(&identity).await.expect("list");
    assert!(line_for(&items, cart_id).is_none());
    assert_eq!(items.len(), 1);
}

#[tokio::test]
async fn test_update_unknown_line_passes_backend_message_through() {
    let (_backend, client) = backend().await;

    let err = client
        .update_quantity(Some(CartId::new(999)), Quantity::ONE)
        .await
        .expect_err("unknown line should fail");
    assert!(
        matches!(&err, CartError::BackendRejected { code: -1, message } if message == "Cart item not found")
    );
    assert_eq!(err.user_message(), "Something went wrong. Please try again.");
}

#[tokio::test]
async fn test_delete_unknown_line_is_rejected() {
    let (_backend, client) = backend().await;

    let err = client
        .delete_item(Some(CartId::new(999)))
        .await
        .expect_err("unknown line should fail");
    assert!(matches!(err, CartError::BackendRejected { .. }));
}

#[tokio::test]
async fn test_missing_cart_id_sends_nothing() {
    let (backend, client) = backend().await;

    let err = client
        .update_quantity(None, Quantity::ONE)
        .await
        .expect_err("update without cart id");
    assert!(matches!(err, CartError::PreconditionFailed(_)));

    let err = client.delete_item(None).await.expect_err("delete without cart id");
    assert!(matches!(err, CartError::PreconditionFailed(_)));

    let err = client
        .delete_item(Some(CartId::new(0)))
        .await
        .expect_err("delete with unassigned cart id");
    assert!(matches!(err, CartError::PreconditionFailed(_)));

    assert_eq!(backend.request_count(), 0);
}

// ============================================================================
// Full session
// ============================================================================

#[tokio::test]
async fn test_full_guest_session() {
    let (backend, client) = backend().await;
    let identity = CartIdentity::new_guest();

    let added = client
        .add_item(&identity, &item("IM31790673", 1, 20))
        .await
        .expect("add");
    let cart_id = added.item.cart_id;

    client
        .update_quantity(cart_id, Quantity::new(2).expect("positive"))
        .await
        .expect("update");
    client.delete_item(cart_id).await.expect("delete");

    assert!(client.list_items(&identity).await.expect("list").is_empty());
    let endpoints: Vec<_> = backend.requests().iter().map(|r| r.endpoint).collect();
    assert_eq!(
        endpoints,
        vec!["AddToCart", "UpdateCartQty", "DeleteCartItem", "getData_JSON"]
    );
}

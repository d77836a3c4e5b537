mod common;

use common::{json_body, spawn_app};
use reqwest::StatusCode;
use storefront_api::client::{
    Cart, CartItem, ClientError, OrderHistory, StorefrontClient, DELIVERY_FEE,
};
use storefront_api::entities::order::Status;

#[tokio::test]
async fn checkout_creates_order_and_items() {
    let app = spawn_app().await;
    let user_id = common::id(&app.create_user("Jane Smith", "jane@example.com").await);
    app.create_product("Milk", 2.5, "Dairy").await;
    app.create_product("Eggs", 4.0, "Dairy").await;
    let client = StorefrontClient::new(&app.base_url);

    let mut cart = Cart::new();
    for product in client.products(Some("Dairy"), None).await.expect("products") {
        cart.add(CartItem::from(product));
    }
    cart.update_quantity(cart.items()[0].id, 2);

    let mut history = OrderHistory::new();
    let order = client
        .checkout(user_id as i32, &mut cart, &mut history)
        .await
        .expect("checkout");

    assert_eq!(order.status, Status::Pending);
    assert!((order.total - (9.0 + DELIVERY_FEE)).abs() < 1e-9);
    assert!(cart.is_empty());
    assert_eq!(history.len(), 1);
    assert_eq!(history.orders()[0].order_id, Some(order.id));
    assert_eq!(history.orders()[0].items.len(), 2);

    let stored = json_body(app.get(&format!("orders?id={}", order.id)).await).await;
    let items = stored["items"].as_array().expect("items array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[1]["product"]["name"], "Eggs");
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = spawn_app().await;
    let client = StorefrontClient::new(&app.base_url);

    let result = client
        .checkout(1, &mut Cart::new(), &mut OrderHistory::new())
        .await;
    assert!(matches!(result, Err(ClientError::EmptyCart)));
}

#[tokio::test]
async fn unknown_user_surfaces_api_error() {
    let app = spawn_app().await;
    let product = common::id(&app.create_product("Milk", 2.5, "Dairy").await);
    let client = StorefrontClient::new(&app.base_url);

    let mut cart = Cart::new();
    cart.add(client.product(product as i32).await.expect("product").into());

    let result = client.checkout(42, &mut cart, &mut OrderHistory::new()).await;
    match result {
        Err(ClientError::Api { status, code, .. }) => {
            assert_eq!(status, StatusCode::NOT_FOUND.as_u16());
            assert_eq!(code, "USER_NOT_FOUND");
        }
        other => panic!("expected API error, got {other:?}"),
    }
    assert_eq!(cart.items().len(), 1);
}

#[tokio::test]
async fn failed_item_keeps_cart_and_partial_order() {
    let app = spawn_app().await;
    let user_id = common::id(&app.create_user("Jane Smith", "jane@example.com").await) as i32;
    let milk = app.create_product("Milk", 2.5, "Dairy").await;
    let client = StorefrontClient::new(&app.base_url);

    let mut cart = Cart::new();
    cart.add(CartItem {
        id: common::id(&milk) as i32,
        name: "Milk".into(),
        price: 2.5,
        image: None,
        quantity: 1,
    });
    // Not in the catalog, so the second item insert fails.
    cart.add(CartItem {
        id: 9999,
        name: "Ghost".into(),
        price: 1.0,
        image: None,
        quantity: 1,
    });

    let mut history = OrderHistory::new();
    let result = client.checkout(user_id, &mut cart, &mut history).await;

    let order_id = match result {
        Err(ClientError::PartialCheckout {
            order_id,
            created,
            expected,
            source,
        }) => {
            assert_eq!((created, expected), (1, 2));
            assert!(matches!(*source, ClientError::Api { ref code, .. } if code == "PRODUCT_NOT_FOUND"));
            order_id
        }
        other => panic!("expected partial checkout, got {other:?}"),
    };

    assert_eq!(cart.items().len(), 2);
    assert!(history.is_empty());

    let stored = json_body(app.get(&format!("orders?id={order_id}")).await).await;
    assert_eq!(stored["items"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn zero_quantity_line_sends_nothing() {
    let app = spawn_app().await;
    let user_id = common::id(&app.create_user("Jane Smith", "jane@example.com").await) as i32;
    let product_id = common::id(&app.create_product("Milk", 2.5, "Dairy").await);
    let client = StorefrontClient::new(&app.base_url);

    // A hand-edited session file can still carry an empty line.
    let mut cart: Cart = serde_json::from_value(serde_json::json!([
        { "id": product_id, "name": "Milk", "price": 2.5, "image": null, "quantity": 0 }
    ]))
    .expect("cart json");

    let result = client.checkout(user_id, &mut cart, &mut OrderHistory::new()).await;
    assert!(matches!(result, Err(ClientError::EmptyLine { product_id: id }) if i64::from(id) == product_id));
    assert_eq!(cart.items().len(), 1);

    let orders = json_body(app.get("orders").await).await;
    assert_eq!(orders, serde_json::json!([]));
}

mod common;

use common::{assert_error, id, json_body, spawn_app};
use reqwest::StatusCode;
use serde_json::{json, Value};

#[tokio::test]
async fn create_order_for_existing_user() {
    let app = spawn_app().await;
    let user = app.create_user("Jane Smith", "jane@example.com").await;

    let response = app
        .post(
            "orders",
            &json!({ "userId": id(&user), "total": 24.5, "status": "processing" }),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let order = json_body(response).await;
    assert_eq!(order["userId"], id(&user));
    assert_eq!(order["total"], 24.5);
    assert_eq!(order["status"], "processing");
}

#[tokio::test]
async fn create_order_validation() {
    let app = spawn_app().await;
    let user_id = id(&app.create_user("Jane Smith", "jane@example.com").await);

    let cases = [
        (json!({ "total": 10, "status": "pending" }), "MISSING_USER_ID"),
        (json!({ "userId": user_id, "status": "pending" }), "MISSING_TOTAL"),
        (json!({ "userId": user_id, "total": 10 }), "MISSING_STATUS"),
        (json!({ "userId": "abc", "total": 10, "status": "pending" }), "INVALID_USER_ID"),
        (json!({ "userId": user_id, "total": -5, "status": "pending" }), "INVALID_TOTAL"),
        (json!({ "userId": user_id, "total": 10, "status": "shipped" }), "INVALID_STATUS"),
    ];
    for (payload, code) in cases {
        assert_error(app.post("orders", &payload).await, StatusCode::BAD_REQUEST, code).await;
    }

    assert_error(
        app.post("orders", &json!({ "userId": 999, "total": 10, "status": "pending" }))
            .await,
        StatusCode::NOT_FOUND,
        "USER_NOT_FOUND",
    )
    .await;
}

#[tokio::test]
async fn orders_embed_items_with_products() {
    let app = spawn_app().await;
    let user_id = id(&app.create_user("Jane Smith", "jane@example.com").await);
    let bread = app.create_product("Bread", 2.0, "Bakery").await;
    let jam = app.create_product("Jam", 3.5, "Pantry").await;
    let order = app.create_order(user_id, 12.5).await;
    let order_id = id(&order);

    for (product, quantity) in [(&bread, 2), (&jam, 1)] {
        let response = app
            .post(
                "order-items",
                &json!({
                    "orderId": order_id,
                    "productId": id(product),
                    "quantity": quantity,
                    "price": product["price"],
                }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    // An item whose product is later removed keeps a null product.
    app.delete(&format!("products?id={}", id(&jam))).await;

    let fetched = json_body(app.get(&format!("orders?id={order_id}")).await).await;
    assert_eq!(fetched["id"], order_id);
    let items = fetched["items"].as_array().expect("items array");
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["quantity"], 2);
    assert_eq!(items[0]["product"]["name"], "Bread");
    assert_eq!(items[1]["product"], Value::Null);

    let listed = json_body(app.get(&format!("orders?userId={user_id}")).await).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["items"].as_array().map(Vec::len), Some(2));
}

#[tokio::test]
async fn list_filters_by_status() {
    let app = spawn_app().await;
    let user_id = id(&app.create_user("Jane Smith", "jane@example.com").await);
    let first = app.create_order(user_id, 10.0).await;
    app.create_order(user_id, 20.0).await;

    app.patch(&format!("orders?id={}", id(&first)), &json!({ "status": "completed" }))
        .await;

    let completed = json_body(app.get("orders?status=completed").await).await;
    assert_eq!(completed.as_array().map(Vec::len), Some(1));
    assert_eq!(completed[0]["id"], id(&first));
    assert_eq!(completed[0]["items"], json!([]));

    assert_error(app.get("orders?status=lost").await, StatusCode::BAD_REQUEST, "INVALID_STATUS").await;
    assert_error(app.get("orders?userId=x").await, StatusCode::BAD_REQUEST, "INVALID_USER_ID").await;
}

#[tokio::test]
async fn patch_order_fields() {
    let app = spawn_app().await;
    let user_id = id(&app.create_user("Jane Smith", "jane@example.com").await);
    let order_id = id(&app.create_order(user_id, 10.0).await);
    let path = format!("orders?id={order_id}");

    let updated = json_body(
        app.patch(&path, &json!({ "status": "cancelled", "total": 12.75 }))
            .await,
    )
    .await;
    assert_eq!(updated["status"], "cancelled");
    assert_eq!(updated["total"], 12.75);

    assert_error(app.patch(&path, &json!({})).await, StatusCode::BAD_REQUEST, "NO_FIELDS_TO_UPDATE").await;
    assert_error(
        app.patch(&path, &json!({ "status": "Pending" })).await,
        StatusCode::BAD_REQUEST,
        "INVALID_STATUS",
    )
    .await;
    assert_error(
        app.patch(&path, &json!({ "total": "free" })).await,
        StatusCode::BAD_REQUEST,
        "INVALID_TOTAL",
    )
    .await;
    assert_error(
        app.patch("orders?id=77", &json!({ "status": "pending" })).await,
        StatusCode::NOT_FOUND,
        "ORDER_NOT_FOUND",
    )
    .await;
}

#[tokio::test]
async fn delete_order_then_404() {
    let app = spawn_app().await;
    let user_id = id(&app.create_user("Jane Smith", "jane@example.com").await);
    let order = app.create_order(user_id, 10.0).await;
    let path = format!("orders?id={}", id(&order));

    let body = json_body(app.delete(&path).await).await;
    assert_eq!(body["message"], "Order deleted successfully");
    assert_eq!(body["order"]["id"], id(&order));

    assert_error(app.get(&path).await, StatusCode::NOT_FOUND, "ORDER_NOT_FOUND").await;
}

#[tokio::test]
async fn user_and_status_filters_combine() {
    let app = spawn_app().await;
    let jane = id(&app.create_user("Jane Smith", "jane@example.com").await);
    let bob = id(&app.create_user("Bob Johnson", "bob@example.com").await);

    let jane_done = app.create_order(jane, 10.0).await;
    app.create_order(jane, 11.0).await;
    let bob_done = app.create_order(bob, 12.0).await;
    for order in [&jane_done, &bob_done] {
        app.patch(&format!("orders?id={}", id(order)), &json!({ "status": "completed" }))
            .await;
    }

    let listed = json_body(
        app.get(&format!("orders?userId={jane}&status=completed"))
            .await,
    )
    .await;
    let ids: Vec<i64> = listed
        .as_array()
        .expect("orders array")
        .iter()
        .filter_map(|order| order["id"].as_i64())
        .collect();
    assert_eq!(ids, [id(&jane_done)]);
}

#[tokio::test]
async fn explicit_nulls_are_validated() {
    let app = spawn_app().await;
    let user_id = id(&app.create_user("Jane Smith", "jane@example.com").await);
    let path = format!("orders?id={}", id(&app.create_order(user_id, 10.0).await));

    assert_error(
        app.patch(&path, &json!({ "status": null, "total": null })).await,
        StatusCode::BAD_REQUEST,
        "INVALID_STATUS",
    )
    .await;
    assert_error(
        app.patch(&path, &json!({ "total": null })).await,
        StatusCode::BAD_REQUEST,
        "INVALID_TOTAL",
    )
    .await;

    let unchanged = json_body(app.get(&path).await).await;
    assert_eq!(unchanged["status"], "pending");
    assert_eq!(unchanged["total"], 10.0);
}

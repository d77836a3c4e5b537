mod common;

use common::{assert_error, id, json_body, spawn_app};
use reqwest::StatusCode;
use serde_json::json;

#[tokio::test]
async fn favorites_are_listed_with_products() {
    let app = spawn_app().await;
    let tea = app.create_product("Green Tea", 3.25, "Beverages").await;
    let honey = app.create_product("Honey", 6.0, "Pantry").await;

    for product in [&tea, &honey] {
        let response = app
            .post(
                "favorites",
                &json!({ "userId": "auth0|user_1", "productId": id(product) }),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
    }
    app.post("favorites", &json!({ "userId": "auth0|user_2", "productId": id(&tea) }))
        .await;

    let response = app
        .client
        .get(app.url("favorites"))
        .query(&[("userId", "auth0|user_1")])
        .send()
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);

    let favorites = json_body(response).await;
    let favorites = favorites.as_array().expect("favorites array");
    assert_eq!(favorites.len(), 2);
    assert_eq!(favorites[0]["userId"], "auth0|user_1");
    assert_eq!(favorites[0]["product"]["name"], "Green Tea");
    assert_eq!(favorites[1]["product"]["price"], 6.0);
}

#[tokio::test]
async fn numeric_user_ids_are_stored_as_text() {
    let app = spawn_app().await;
    let product = app.create_product("Rice", 1.5, "Pantry").await;

    let favorite = json_body(
        app.post("favorites", &json!({ "userId": 17, "productId": id(&product) }))
            .await,
    )
    .await;
    assert_eq!(favorite["userId"], "17");

    let fetched = json_body(app.get(&format!("favorites?id={}", id(&favorite))).await).await;
    assert_eq!(fetched["productId"], id(&product));
}

#[tokio::test]
async fn create_favorite_validation() {
    let app = spawn_app().await;
    let product_id = id(&app.create_product("Rice", 1.5, "Pantry").await);

    assert_error(
        app.post("favorites", &json!({ "productId": product_id })).await,
        StatusCode::BAD_REQUEST,
        "MISSING_USER_ID",
    )
    .await;
    assert_error(
        app.post("favorites", &json!({ "userId": "u1" })).await,
        StatusCode::BAD_REQUEST,
        "MISSING_PRODUCT_ID",
    )
    .await;
    assert_error(
        app.post("favorites", &json!({ "userId": "u1", "productId": "rice" }))
            .await,
        StatusCode::BAD_REQUEST,
        "INVALID_PRODUCT_ID",
    )
    .await;
    assert_error(
        app.post("favorites", &json!({ "userId": "u1", "productId": 999 }))
            .await,
        StatusCode::NOT_FOUND,
        "PRODUCT_NOT_FOUND",
    )
    .await;
    assert_error(app.get("favorites").await, StatusCode::BAD_REQUEST, "MISSING_USER_ID").await;
}

#[tokio::test]
async fn duplicate_favorite_conflicts() {
    let app = spawn_app().await;
    let product_id = id(&app.create_product("Rice", 1.5, "Pantry").await);
    let payload = json!({ "userId": "u1", "productId": product_id });

    assert_eq!(app.post("favorites", &payload).await.status(), StatusCode::CREATED);
    assert_error(app.post("favorites", &payload).await, StatusCode::CONFLICT, "DUPLICATE_FAVORITE").await;
}

#[tokio::test]
async fn delete_favorite_then_404() {
    let app = spawn_app().await;
    let product_id = id(&app.create_product("Rice", 1.5, "Pantry").await);
    let favorite = json_body(
        app.post("favorites", &json!({ "userId": "u1", "productId": product_id }))
            .await,
    )
    .await;
    let path = format!("favorites?id={}", id(&favorite));

    let body = json_body(app.delete(&path).await).await;
    assert_eq!(body["favorite"]["id"], id(&favorite));

    assert_error(app.get(&path).await, StatusCode::NOT_FOUND, "FAVORITE_NOT_FOUND").await;

    // Removing the favorite frees the pair up again.
    let again = app
        .post("favorites", &json!({ "userId": "u1", "productId": product_id }))
        .await;
    assert_eq!(again.status(), StatusCode::CREATED);
}

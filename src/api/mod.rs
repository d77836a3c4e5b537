pub mod favorites;
pub mod order_items;
pub mod orders;
pub mod params;
pub mod products;
pub mod users;

use axum::{http::StatusCode, middleware::from_fn, response::Response, routing::get, Json, Router};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::middleware::logging::{logging_middleware, to_response};
use favorites::favorite_router;
use order_items::order_item_router;
use orders::order_router;
use products::product_router;
use users::user_router;

pub fn create_api_router(shared_db: Arc<DatabaseConnection>) -> Router {
    let resources = Router::new()
        .merge(product_router(shared_db.clone()))
        .merge(order_router(shared_db.clone()))
        .merge(order_item_router(shared_db.clone()))
        .merge(user_router(shared_db.clone()))
        .merge(favorite_router(shared_db));

    Router::new()
        .route("/health", get(health))
        .nest("/api", resources)
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
}

async fn health() -> Response {
    to_response((StatusCode::OK, Json(json!({ "status": "ok" }))), Ok(()))
}

use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::api::params::{self, IdQuery, Pagination};
use crate::entities::{
    order::Entity as OrderEntity,
    order_item::{self, Entity as OrderItemEntity},
    product::Entity as ProductEntity,
};
use crate::middleware::logging::{to_response, ApiError};

// Items are immutable once written, so there is no PATCH.
pub fn order_item_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route(
            "/order-items",
            get(get_order_items)
                .post(create_order_item)
                .delete(delete_order_item),
        )
        .layer(Extension(db))
}

async fn get_order_items(
    Query(query): Query<OrderItemsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db.begin().await?;

    if let Some(id) = params::optional_id(query.id.as_deref())? {
        let item = OrderItemEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(order_item_not_found)?;
        return Ok(to_response((StatusCode::OK, Json(item)), Ok(())));
    }

    let page = Pagination::parse(query.limit.as_deref(), query.offset.as_deref(), 50)?;

    let order_id = params::text(query.order_id.as_deref())
        .ok_or_else(|| ApiError::missing("orderId", "MISSING_ORDER_ID"))?
        .parse::<i32>()
        .map_err(|_| invalid_order_id())?;

    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .order_by_asc(order_item::Column::Id)
        .limit(page.limit)
        .offset(page.offset)
        .all(&txn)
        .await?;

    Ok(to_response((StatusCode::OK, Json(items)), Ok(())))
}

async fn create_order_item(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<CreateOrderItem>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = params::body(payload)?;
    debug!(?payload, "create_order_item");

    if params::is_blank(payload.order_id.as_ref()) {
        return Err(ApiError::missing("orderId", "MISSING_ORDER_ID"));
    }
    if params::is_blank(payload.product_id.as_ref()) {
        return Err(ApiError::missing("productId", "MISSING_PRODUCT_ID"));
    }
    if params::is_blank(payload.quantity.as_ref()) {
        return Err(ApiError::missing("quantity", "MISSING_QUANTITY"));
    }
    let price = payload
        .price
        .as_ref()
        .ok_or_else(|| ApiError::missing("price", "MISSING_PRICE"))?;

    let order_id = payload
        .order_id
        .as_ref()
        .and_then(params::as_int)
        .ok_or_else(invalid_order_id)?;
    let product_id = payload
        .product_id
        .as_ref()
        .and_then(params::as_int)
        .ok_or_else(|| {
            ApiError::invalid("productId must be a valid integer", "INVALID_PRODUCT_ID")
        })?;
    let quantity = payload
        .quantity
        .as_ref()
        .and_then(params::positive_int)
        .ok_or_else(|| ApiError::invalid("quantity must be a positive integer", "INVALID_QUANTITY"))?;
    let price = params::positive_float(price)
        .ok_or_else(|| ApiError::invalid("price must be a positive number", "INVALID_PRICE"))?;

    let txn = db.begin().await?;
    if OrderEntity::find_by_id(order_id).one(&txn).await?.is_none() {
        return Err(ApiError::not_found("Order", "ORDER_NOT_FOUND"));
    }
    if ProductEntity::find_by_id(product_id).one(&txn).await?.is_none() {
        return Err(ApiError::not_found("Product", "PRODUCT_NOT_FOUND"));
    }

    let new_item = order_item::ActiveModel {
        order_id: Set(order_id),
        product_id: Set(product_id),
        quantity: Set(quantity),
        price: Set(price),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_item.insert(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::CREATED, Json(created)), Ok(())))
}

async fn delete_order_item(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;

    let txn = db.begin().await?;
    let existing = OrderItemEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(order_item_not_found)?;

    OrderItemEntity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Order item deleted successfully",
                "orderItem": existing
            })),
        ),
        Ok(()),
    ))
}

fn order_item_not_found() -> ApiError {
    ApiError::not_found("Order item", "ORDER_ITEM_NOT_FOUND")
}

fn invalid_order_id() -> ApiError {
    ApiError::invalid("orderId must be a valid integer", "INVALID_ORDER_ID")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrderItemsQuery {
    id: Option<String>,
    order_id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateOrderItem {
    order_id: Option<Value>,
    product_id: Option<Value>,
    quantity: Option<Value>,
    price: Option<Value>,
}

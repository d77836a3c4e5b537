use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::api::params::{self, IdQuery, Pagination};
use crate::entities::{
    order::{self, Entity as OrderEntity, Status},
    order_item::{self, Entity as OrderItemEntity},
    product::{self, Entity as ProductEntity},
    user::Entity as UserEntity,
};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn order_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route(
            "/orders",
            get(get_orders)
                .post(create_order)
                .patch(patch_order)
                .delete(delete_order),
        )
        .layer(Extension(db))
}

//ROUTES
async fn get_orders(
    Query(query): Query<OrdersQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db.begin().await?;

    if let Some(id) = params::optional_id(query.id.as_deref())? {
        let order = OrderEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(order_not_found)?;
        let mut items = items_by_order(&txn, vec![order.id]).await?;
        let response = OrderWithItems {
            items: items.remove(&order.id).unwrap_or_default(),
            order,
        };
        return Ok(to_response((StatusCode::OK, Json(response)), Ok(())));
    }

    let page = Pagination::parse(query.limit.as_deref(), query.offset.as_deref(), 10)?;

    let mut condition = Condition::all();
    if let Some(user_id) = params::text(query.user_id.as_deref()) {
        let user_id = user_id
            .parse::<i32>()
            .map_err(|_| ApiError::invalid("Valid userId is required", "INVALID_USER_ID"))?;
        condition = condition.add(order::Column::UserId.eq(user_id));
    }
    if let Some(status) = params::text(query.status.as_deref()) {
        let status = status.parse::<Status>().map_err(|_| invalid_status())?;
        condition = condition.add(order::Column::Status.eq(status));
    }

    let orders = OrderEntity::find()
        .filter(condition)
        .order_by_asc(order::Column::Id)
        .limit(page.limit)
        .offset(page.offset)
        .all(&txn)
        .await?;

    let mut items = items_by_order(&txn, orders.iter().map(|order| order.id).collect()).await?;
    let response: Vec<OrderWithItems> = orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items.remove(&order.id).unwrap_or_default(),
            order,
        })
        .collect();

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn create_order(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<CreateOrder>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = params::body(payload)?;
    debug!(?payload, "create_order");

    if params::is_blank(payload.user_id.as_ref()) {
        return Err(ApiError::missing("userId", "MISSING_USER_ID"));
    }
    let total = payload
        .total
        .as_ref()
        .ok_or_else(|| ApiError::missing("total", "MISSING_TOTAL"))?;
    let status = params::text(payload.status.as_deref())
        .ok_or_else(|| ApiError::missing("status", "MISSING_STATUS"))?;

    let user_id = payload
        .user_id
        .as_ref()
        .and_then(params::as_int)
        .ok_or_else(|| ApiError::invalid("userId must be a valid integer", "INVALID_USER_ID"))?;
    let total = params::positive_float(total).ok_or_else(invalid_total)?;
    let status = status.parse::<Status>().map_err(|_| invalid_status())?;

    let txn = db.begin().await?;
    if UserEntity::find_by_id(user_id).one(&txn).await?.is_none() {
        return Err(ApiError::not_found("User", "USER_NOT_FOUND"));
    }

    let new_order = order::ActiveModel {
        user_id: Set(user_id),
        total: Set(total),
        status: Set(status),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_order.insert(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::CREATED, Json(created)), Ok(())))
}

async fn patch_order(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<PatchOrderPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;

    let txn = db.begin().await?;
    let existing = OrderEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(order_not_found)?;

    let payload = params::body(payload)?;
    if payload.status.is_none() && payload.total.is_none() {
        return Err(ApiError::invalid(
            "At least one field (status or total) must be provided",
            "NO_FIELDS_TO_UPDATE",
        ));
    }

    let mut order: order::ActiveModel = existing.into();

    // An explicit null is validated like any other value.
    if let Some(status) = payload.status {
        let status = status
            .and_then(|status| status.parse::<Status>().ok())
            .ok_or_else(invalid_status)?;
        order.status = Set(status);
    }

    if let Some(total) = payload.total {
        let total = total
            .as_ref()
            .and_then(params::positive_float)
            .ok_or_else(invalid_total)?;
        order.total = Set(total);
    }

    let updated = order.update(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::OK, Json(updated)), Ok(())))
}

async fn delete_order(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;

    let txn = db.begin().await?;
    let existing = OrderEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(order_not_found)?;

    OrderEntity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Order deleted successfully",
                "order": existing
            })),
        ),
        Ok(()),
    ))
}

/// Items of the given orders, each joined with its product (`None` when the
/// product row is gone), keyed by order id.
async fn items_by_order<C: ConnectionTrait>(
    conn: &C,
    order_ids: Vec<i32>,
) -> Result<HashMap<i32, Vec<ItemWithProduct>>, DbErr> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let items = OrderItemEntity::find()
        .filter(order_item::Column::OrderId.is_in(order_ids))
        .order_by_asc(order_item::Column::Id)
        .all(conn)
        .await?;

    let mut product_ids: Vec<i32> = items.iter().map(|item| item.product_id).collect();
    product_ids.sort_unstable();
    product_ids.dedup();

    let products: HashMap<i32, product::Model> = ProductEntity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(conn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let mut grouped: HashMap<i32, Vec<ItemWithProduct>> = HashMap::new();
    for item in items {
        grouped
            .entry(item.order_id)
            .or_default()
            .push(ItemWithProduct {
                product: products.get(&item.product_id).cloned(),
                item,
            });
    }

    Ok(grouped)
}

fn order_not_found() -> ApiError {
    ApiError::not_found("Order", "ORDER_NOT_FOUND")
}

fn invalid_status() -> ApiError {
    ApiError::invalid(
        format!("status must be one of: {}", Status::VALID),
        "INVALID_STATUS",
    )
}

fn invalid_total() -> ApiError {
    ApiError::invalid("total must be a positive number", "INVALID_TOTAL")
}

//Structs
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrdersQuery {
    id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    user_id: Option<String>,
    status: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateOrder {
    user_id: Option<Value>,
    total: Option<Value>,
    status: Option<String>,
}

#[derive(Deserialize)]
struct PatchOrderPayload {
    #[serde(default, deserialize_with = "params::nullable")]
    status: Option<Option<String>>,
    #[serde(default, deserialize_with = "params::nullable")]
    total: Option<Option<Value>>,
}

#[derive(Serialize)]
struct OrderWithItems {
    #[serde(flatten)]
    order: order::Model,
    items: Vec<ItemWithProduct>,
}

#[derive(Serialize)]
struct ItemWithProduct {
    #[serde(flatten)]
    item: order_item::Model,
    product: Option<product::Model>,
}

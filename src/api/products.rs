use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::api::params::{self, IdQuery, Pagination};
use crate::entities::product::{self, Entity as ProductEntity};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn product_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route(
            "/products",
            get(get_products)
                .post(create_product)
                .patch(patch_product)
                .delete(delete_product),
        )
        .layer(Extension(db))
}

//ROUTES
async fn get_products(
    Query(query): Query<ProductsQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db.begin().await?;

    if let Some(id) = params::optional_id(query.id.as_deref())? {
        let product = ProductEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(product_not_found)?;
        return Ok(to_response((StatusCode::OK, Json(product)), Ok(())));
    }

    let page = Pagination::parse(query.limit.as_deref(), query.offset.as_deref(), 10)?;

    let mut condition = Condition::all();
    if let Some(search) = params::text(query.search.as_deref()) {
        condition = condition.add(
            Condition::any()
                .add(product::Column::Name.contains(&search))
                .add(product::Column::Description.contains(&search)),
        );
    }
    if let Some(category) = params::text(query.category.as_deref()) {
        condition = condition.add(product::Column::Category.eq(category));
    }

    let products = ProductEntity::find()
        .filter(condition)
        .order_by_asc(product::Column::Id)
        .limit(page.limit)
        .offset(page.offset)
        .all(&txn)
        .await?;

    Ok(to_response((StatusCode::OK, Json(products)), Ok(())))
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<CreateProduct>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = params::body(payload)?;
    debug!(?payload, "create_product");

    let name = params::text(payload.name.as_deref())
        .ok_or_else(|| ApiError::missing("name", "MISSING_NAME"))?;
    let price = payload
        .price
        .as_ref()
        .ok_or_else(|| ApiError::missing("price", "MISSING_PRICE"))?;
    let price = params::positive_float(price).ok_or_else(invalid_price)?;
    let category = params::text(payload.category.as_deref())
        .ok_or_else(|| ApiError::missing("category", "MISSING_CATEGORY"))?;

    let txn = db.begin().await?;
    let new_product = product::ActiveModel {
        name: Set(name),
        price: Set(price),
        category: Set(category),
        image: Set(params::text(payload.image.as_deref())),
        description: Set(params::text(payload.description.as_deref())),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_product.insert(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::CREATED, Json(created)), Ok(())))
}

async fn patch_product(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<PatchProductPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;
    let payload = params::body(payload)?;

    let txn = db.begin().await?;
    let existing = ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(product_not_found)?;

    let mut product: product::ActiveModel = existing.clone().into();

    if let Some(name) = payload.name {
        product.name = Set(name.trim().to_owned());
    }

    if let Some(price) = payload.price {
        product.price = Set(params::positive_float(&price).ok_or_else(invalid_price)?);
    }

    if let Some(category) = payload.category {
        product.category = Set(category.trim().to_owned());
    }

    if let Some(image) = payload.image {
        product.image = Set(params::text(image.as_deref()));
    }

    if let Some(description) = payload.description {
        product.description = Set(params::text(description.as_deref()));
    }

    if !product.is_changed() {
        return Ok(to_response((StatusCode::OK, Json(existing)), Ok(())));
    }

    let updated = product.update(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::OK, Json(updated)), Ok(())))
}

async fn delete_product(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;

    let txn = db.begin().await?;
    let existing = ProductEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(product_not_found)?;

    ProductEntity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Product deleted successfully",
                "product": existing
            })),
        ),
        Ok(()),
    ))
}

fn product_not_found() -> ApiError {
    ApiError::not_found("Product", "PRODUCT_NOT_FOUND")
}

fn invalid_price() -> ApiError {
    ApiError::invalid("price must be a positive number", "INVALID_PRICE")
}

//Structs
#[derive(Deserialize)]
struct ProductsQuery {
    id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    search: Option<String>,
    category: Option<String>,
}

#[derive(Deserialize, Debug)]
struct CreateProduct {
    name: Option<String>,
    price: Option<Value>,
    category: Option<String>,
    image: Option<String>,
    description: Option<String>,
}

#[derive(Deserialize)]
struct PatchProductPayload {
    name: Option<String>,
    price: Option<Value>,
    category: Option<String>,
    #[serde(default, deserialize_with = "params::nullable")]
    image: Option<Option<String>>,
    #[serde(default, deserialize_with = "params::nullable")]
    description: Option<Option<String>>,
}

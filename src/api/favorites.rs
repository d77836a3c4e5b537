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
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use crate::api::params::{self, IdQuery, Pagination};
use crate::entities::{
    favorite::{self, Entity as FavoriteEntity},
    product::{self, Entity as ProductEntity},
};
use crate::middleware::logging::{to_response, ApiError};

pub fn favorite_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route(
            "/favorites",
            get(get_favorites)
                .post(create_favorite)
                .delete(delete_favorite),
        )
        .layer(Extension(db))
}

async fn get_favorites(
    Query(query): Query<FavoritesQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db.begin().await?;

    if let Some(id) = params::optional_id(query.id.as_deref())? {
        let favorite = FavoriteEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(favorite_not_found)?;
        return Ok(to_response((StatusCode::OK, Json(favorite)), Ok(())));
    }

    let user_id = params::text(query.user_id.as_deref())
        .ok_or_else(|| ApiError::missing("userId", "MISSING_USER_ID"))?;
    let page = Pagination::parse(query.limit.as_deref(), query.offset.as_deref(), 50)?;

    let favorites = FavoriteEntity::find()
        .filter(favorite::Column::UserId.eq(user_id))
        .order_by_asc(favorite::Column::Id)
        .limit(page.limit)
        .offset(page.offset)
        .all(&txn)
        .await?;

    let product_ids: Vec<i32> = favorites.iter().map(|fav| fav.product_id).collect();
    let mut products: HashMap<i32, product::Model> = ProductEntity::find()
        .filter(product::Column::Id.is_in(product_ids))
        .all(&txn)
        .await?
        .into_iter()
        .map(|product| (product.id, product))
        .collect();

    let response: Vec<FavoriteWithProduct> = favorites
        .into_iter()
        .map(|favorite| FavoriteWithProduct {
            // A product appears at most once per user.
            product: products.remove(&favorite.product_id),
            favorite,
        })
        .collect();

    Ok(to_response((StatusCode::OK, Json(response)), Ok(())))
}

async fn create_favorite(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<CreateFavorite>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = params::body(payload)?;
    debug!(?payload, "create_favorite");

    let user_id = payload
        .user_id
        .as_ref()
        .and_then(params::as_text)
        .ok_or_else(|| ApiError::missing("userId", "MISSING_USER_ID"))?;
    if params::is_blank(payload.product_id.as_ref()) {
        return Err(ApiError::missing("productId", "MISSING_PRODUCT_ID"));
    }
    let product_id = payload
        .product_id
        .as_ref()
        .and_then(params::positive_int)
        .ok_or_else(|| {
            ApiError::invalid(
                "productId must be a valid positive integer",
                "INVALID_PRODUCT_ID",
            )
        })?;

    let txn = db.begin().await?;
    if ProductEntity::find_by_id(product_id).one(&txn).await?.is_none() {
        return Err(ApiError::not_found("Product", "PRODUCT_NOT_FOUND"));
    }

    let duplicate = FavoriteEntity::find()
        .filter(favorite::Column::UserId.eq(user_id.as_str()))
        .filter(favorite::Column::ProductId.eq(product_id))
        .one(&txn)
        .await?;
    if duplicate.is_some() {
        return Err(ApiError::conflict(
            "Product already in favorites",
            "DUPLICATE_FAVORITE",
        ));
    }

    let new_favorite = favorite::ActiveModel {
        user_id: Set(user_id),
        product_id: Set(product_id),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_favorite.insert(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::CREATED, Json(created)), Ok(())))
}

async fn delete_favorite(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;

    let txn = db.begin().await?;
    let existing = FavoriteEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(favorite_not_found)?;

    FavoriteEntity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "Favorite removed successfully",
                "favorite": existing
            })),
        ),
        Ok(()),
    ))
}

fn favorite_not_found() -> ApiError {
    ApiError::not_found("Favorite", "FAVORITE_NOT_FOUND")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FavoritesQuery {
    id: Option<String>,
    user_id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct CreateFavorite {
    user_id: Option<Value>,
    product_id: Option<Value>,
}

#[derive(Serialize)]
struct FavoriteWithProduct {
    #[serde(flatten)]
    favorite: favorite::Model,
    product: Option<product::Model>,
}

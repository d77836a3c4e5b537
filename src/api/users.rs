use axum::{
    extract::{rejection::JsonRejection, Extension, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use chrono::Utc;
use once_cell::sync::Lazy;
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DatabaseTransaction, EntityTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::debug;

use crate::api::params::{self, IdQuery, Pagination};
use crate::entities::user::{self, hash_password, Entity as UserEntity};
use crate::middleware::logging::{to_response, ApiError};

//ROUTERS
pub fn user_router(db: Arc<DatabaseConnection>) -> Router {
    Router::new()
        .route(
            "/users",
            get(get_users)
                .post(create_user)
                .patch(patch_user)
                .delete(delete_user),
        )
        .layer(Extension(db))
}

//ROUTES
async fn get_users(
    Query(query): Query<UsersQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let txn = db.begin().await?;

    if let Some(id) = params::optional_id(query.id.as_deref())? {
        let user = UserEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(user_not_found)?;
        return Ok(to_response((StatusCode::OK, Json(user)), Ok(())));
    }

    let page = Pagination::parse(query.limit.as_deref(), query.offset.as_deref(), 10)?;

    let mut select = UserEntity::find();
    if let Some(search) = params::text(query.search.as_deref()) {
        select = select.filter(
            Condition::any()
                .add(user::Column::Name.contains(&search))
                .add(user::Column::Email.contains(&search)),
        );
    }

    let users = select
        .order_by_asc(user::Column::Id)
        .limit(page.limit)
        .offset(page.offset)
        .all(&txn)
        .await?;

    Ok(to_response((StatusCode::OK, Json(users)), Ok(())))
}

async fn create_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<CreateUser>, JsonRejection>,
) -> Result<Response, ApiError> {
    let payload = params::body(payload)?;
    debug!(email = ?payload.email, "create_user");

    let email = params::text(payload.email.as_deref())
        .ok_or_else(|| ApiError::missing("email", "MISSING_EMAIL"))?;
    let password = payload
        .password
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ApiError::missing("password", "MISSING_PASSWORD"))?;
    let name = params::text(payload.name.as_deref())
        .ok_or_else(|| ApiError::missing("name", "MISSING_NAME"))?;
    let email = normalize_email(&email)?;

    let txn = db.begin().await?;
    if email_owner(&txn, &email).await?.is_some() {
        return Err(email_exists());
    }

    let new_user = user::ActiveModel {
        name: Set(name),
        email: Set(email),
        password: Set(hash_password(&password).map_err(ApiError::Internal)?),
        created_at: Set(Utc::now()),
        ..Default::default()
    };
    let created = new_user.insert(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::CREATED, Json(created)), Ok(())))
}

async fn patch_user(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
    payload: Result<Json<PatchUserPayload>, JsonRejection>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;
    let payload = params::body(payload)?;

    let txn = db.begin().await?;
    let existing = UserEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(user_not_found)?;

    let mut user: user::ActiveModel = existing.clone().into();

    if let Some(email) = payload.email {
        let email = normalize_email(&email)?;
        if matches!(email_owner(&txn, &email).await?, Some(owner) if owner != id) {
            return Err(email_exists());
        }
        user.email = Set(email);
    }

    if let Some(password) = payload.password {
        if password.is_empty() {
            return Err(ApiError::missing("password", "MISSING_PASSWORD"));
        }
        user.password = Set(hash_password(&password).map_err(ApiError::Internal)?);
    }

    if let Some(name) = payload.name {
        user.name = Set(name.trim().to_owned());
    }

    if !user.is_changed() {
        return Ok(to_response((StatusCode::OK, Json(existing)), Ok(())));
    }

    let updated = user.update(&txn).await?;
    txn.commit().await?;

    Ok(to_response((StatusCode::OK, Json(updated)), Ok(())))
}

async fn delete_user(
    Query(query): Query<IdQuery>,
    Extension(db): Extension<Arc<DatabaseConnection>>,
) -> Result<Response, ApiError> {
    let id = params::required_id(query.id.as_deref())?;

    let txn = db.begin().await?;
    let existing = UserEntity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(user_not_found)?;

    // Orders and favorites of the user are left in place.
    UserEntity::delete_by_id(id).exec(&txn).await?;
    txn.commit().await?;

    Ok(to_response(
        (
            StatusCode::OK,
            Json(json!({
                "message": "User deleted successfully",
                "user": existing
            })),
        ),
        Ok(()),
    ))
}

static EMAIL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex compiles"));

fn normalize_email(raw: &str) -> Result<String, ApiError> {
    let email = raw.trim().to_lowercase();
    if !EMAIL_REGEX.is_match(&email) {
        return Err(ApiError::invalid("Invalid email format", "INVALID_EMAIL"));
    }
    Ok(email)
}

/// Id of the user already holding `email`, if any.
async fn email_owner(txn: &DatabaseTransaction, email: &str) -> Result<Option<i32>, ApiError> {
    Ok(UserEntity::find()
        .filter(user::Column::Email.eq(email))
        .one(txn)
        .await?
        .map(|user| user.id))
}

fn user_not_found() -> ApiError {
    ApiError::not_found("User", "USER_NOT_FOUND")
}

fn email_exists() -> ApiError {
    ApiError::conflict("Email already exists", "EMAIL_EXISTS")
}

//Structs
#[derive(Deserialize)]
struct UsersQuery {
    id: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    search: Option<String>,
}

#[derive(Deserialize)]
struct CreateUser {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

#[derive(Deserialize)]
struct PatchUserPayload {
    email: Option<String>,
    password: Option<String>,
    name: Option<String>,
}

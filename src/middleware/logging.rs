use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::DbErr;
use serde_json::json;
use std::time::Instant;
use thiserror::Error;
use tracing::{error, info, warn};

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let start = Instant::now();

    let response = next.run(req).await;

    let status = response.status();
    let elapsed = start.elapsed();
    match response.extensions().get::<Result<(), ApiError>>() {
        Some(Ok(_)) => info!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request"
        ),
        Some(Err(value)) if value.status().is_server_error() => error!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            "Failed to process request"
        ),
        Some(Err(value)) => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            value = %value,
            code = value.code(),
            "Rejected request"
        ),
        None => warn!(
            method = %method,
            uri = %uri,
            status = %status,
            elapsed = ?elapsed,
            "Processed request, but no Response extension is set"
        ),
    }

    response
}

/// Every failure a handler can report. Rendered as `{"error", "code"}`.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum ApiError {
    #[error("{field} is required")]
    MissingField {
        field: &'static str,
        code: &'static str,
    },
    #[error("{message}")]
    Invalid {
        message: String,
        code: &'static str,
    },
    #[error("{resource} not found")]
    NotFound {
        resource: &'static str,
        code: &'static str,
    },
    #[error("{message}")]
    Conflict {
        message: String,
        code: &'static str,
    },
    #[error("Invalid request body: {0}")]
    InvalidBody(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn missing(field: &'static str, code: &'static str) -> Self {
        ApiError::MissingField { field, code }
    }

    pub fn invalid(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Invalid {
            message: message.into(),
            code,
        }
    }

    pub fn not_found(resource: &'static str, code: &'static str) -> Self {
        ApiError::NotFound { resource, code }
    }

    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        ApiError::Conflict {
            message: message.into(),
            code,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField { .. } | ApiError::Invalid { .. } | ApiError::InvalidBody(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::MissingField { code, .. }
            | ApiError::Invalid { code, .. }
            | ApiError::NotFound { code, .. }
            | ApiError::Conflict { code, .. } => code,
            ApiError::InvalidBody(_) => "INVALID_BODY",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.to_string(),
            "code": self.code(),
        }));
        to_response((self.status(), body), Err(self))
    }
}

pub fn to_response<T: IntoResponse>(
    response: T,               //The response that we are sending + StatusCode
    ext: Result<(), ApiError>, //The extension, that we want to give logging middleware
) -> Response {
    let mut response = response.into_response();

    response.extensions_mut().insert(ext);

    response
}

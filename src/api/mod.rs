pub mod admin;
pub mod auth;
pub mod public;

use axum::{
    http::StatusCode,
    middleware::from_fn,
    response::{IntoResponse, Response},
    Extension, Json, Router,
};
use sea_orm::{DatabaseConnection, DatabaseTransaction, TransactionTrait};
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::catalog::CatalogError;
use crate::config::Config;
use crate::middleware::logging::{logging_middleware, to_response, ApiError};

use admin::admin_api_router;
use auth::auth_router;
use public::public_api_router;

pub fn create_api_router(db: Arc<DatabaseConnection>, config: Arc<Config>) -> Router {
    Router::new()
        .merge(public_api_router())
        .merge(auth_router())
        .nest("/admin", admin_api_router(db.clone(), &config))
        .layer(from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(db))
        .layer(Extension(config))
}

/// `{"error": message}` with the failure attached for the logging middleware.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>, err: ApiError) -> Response {
    to_response(
        (status, Json(json!({ "error": message.into() }))),
        Err(err),
    )
}

pub(crate) fn internal_error(err: ApiError) -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error", err)
}

pub(crate) fn catalog_error(err: CatalogError) -> Response {
    match err {
        CatalogError::NotFound(_) => {
            let message = err.to_string();
            error_response(StatusCode::NOT_FOUND, message.clone(), ApiError::General(message))
        }
        CatalogError::UniquenessViolation(message) => {
            error_response(StatusCode::CONFLICT, message.clone(), ApiError::General(message))
        }
        CatalogError::Validation(message) | CatalogError::TreeCycle(message) => error_response(
            StatusCode::BAD_REQUEST,
            message.clone(),
            ApiError::ValidationFail(message),
        ),
        CatalogError::Db(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

pub(crate) async fn begin(db: &DatabaseConnection) -> Result<DatabaseTransaction, Response> {
    db.begin()
        .await
        .map_err(|_| internal_error(ApiError::TransactionCreationFailed))
}

/// Commits and answers with `response`, or with a 500 if the commit fails.
pub(crate) async fn commit<T: IntoResponse>(txn: DatabaseTransaction, response: T) -> Response {
    match txn.commit().await {
        Ok(()) => to_response(response, Ok(())),
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

/// Rolls back and maps the store failure.
pub(crate) async fn rollback(txn: DatabaseTransaction, err: CatalogError) -> Response {
    let _ = txn.rollback().await;
    catalog_error(err)
}

pub(crate) fn message(status: StatusCode, message: &str) -> Response {
    to_response((status, Json(json!({ "message": message }))), Ok(()))
}

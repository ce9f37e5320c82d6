pub mod category;
pub mod import_export;
pub mod product;
pub mod review;
pub mod upload;
pub mod user;

use axum::{extract::DefaultBodyLimit, middleware::from_fn_with_state, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::config::Config;
use crate::entities::user::Role;
use crate::middleware::auth::{auth_middleware, AuthState};

/// Room for the multipart framing around a file of the configured size.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

pub fn admin_api_router(db: Arc<DatabaseConnection>, config: &Config) -> Router {
    Router::new()
        .merge(category::admin_category_router())
        .merge(product::admin_product_router())
        .merge(import_export::import_export_router())
        .merge(review::admin_review_router())
        .merge(upload::upload_router())
        .merge(user::admin_user_router())
        .layer(DefaultBodyLimit::max(
            config.file_size_limit + MULTIPART_OVERHEAD,
        ))
        .layer(from_fn_with_state(
            AuthState {
                db,
                role: Role::Admin,
                secret: Arc::from(config.secret.as_str()),
            },
            auth_middleware,
        ))
}

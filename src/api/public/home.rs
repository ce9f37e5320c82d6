use axum::{extract::Extension, http::StatusCode, response::Response, Json};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;

use crate::api::catalog_error;
use crate::catalog::{browse, categories};
use crate::middleware::logging::to_response;

/// Featured and bestseller shelves plus the navigation categories.
pub async fn home(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    let db = db.as_ref();

    let featured = match browse::featured(db).await {
        Ok(products) => products,
        Err(err) => return catalog_error(err.into()),
    };
    let bestsellers = match browse::bestsellers(db).await {
        Ok(products) => products,
        Err(err) => return catalog_error(err.into()),
    };
    let categories = match categories::top_level(db).await {
        Ok(categories) => categories,
        Err(err) => return catalog_error(err),
    };

    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "featured_products": featured,
                "bestseller_products": bestsellers,
                "categories": categories,
            })),
        ),
        Ok(()),
    )
}

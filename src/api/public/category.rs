use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    Json,
};
use sea_orm::DatabaseConnection;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::catalog_error;
use crate::catalog::{
    browse::{self, ProductFilter, PAGE_SIZE},
    categories, CatalogError,
};
use crate::middleware::logging::to_response;

#[derive(Deserialize, Debug, Default)]
pub struct CategoryQuery {
    page: Option<String>,
}

/// Available products of the category and all of its sub-categories.
pub async fn category_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(slug): Path<String>,
    Query(params): Query<CategoryQuery>,
) -> Response {
    let db = db.as_ref();

    let view = async {
        let category = categories::find_by_slug(db, &slug).await?;
        let scope = categories::descendants(db, &category, true)
            .await?
            .into_iter()
            .map(|node| node.id)
            .collect();
        let subcategories = categories::children(db, &category).await?;

        let filter = ProductFilter {
            category_ids: Some(scope),
            ..ProductFilter::default()
        };
        let page = browse::paginate(
            db,
            browse::available_products(&filter),
            PAGE_SIZE,
            params.page.as_deref(),
        )
        .await?;
        let navigation = categories::top_level(db).await?;

        Ok::<_, CatalogError>(json!({
            "category": category,
            "subcategories": subcategories,
            "page_obj": page,
            "categories": navigation,
        }))
    };

    match view.await {
        Ok(body) => to_response((StatusCode::OK, Json(body)), Ok(())),
        Err(err) => catalog_error(err),
    }
}

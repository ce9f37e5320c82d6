use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    Json,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::api::{catalog_error, error_response};
use crate::catalog::{
    browse::{self, ProductFilter, SortBy, PAGE_SIZE},
    categories, products, reviews, CatalogError,
};
use crate::entities::product;
use crate::middleware::logging::{to_response, ApiError};

/// Raw query parameters; numbers are parsed by hand so a bad value gets a
/// JSON error instead of an extractor rejection.
#[derive(Deserialize, Debug, Default)]
pub struct ProductListQuery {
    q: Option<String>,
    category: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    sort_by: Option<String>,
    page: Option<String>,
}

pub async fn product_list(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(params): Query<ProductListQuery>,
) -> Response {
    let db = db.as_ref();

    let min_price = match parse_price("min_price", params.min_price.as_deref()) {
        Ok(price) => price,
        Err(response) => return response,
    };
    let max_price = match parse_price("max_price", params.max_price.as_deref()) {
        Ok(price) => price,
        Err(response) => return response,
    };

    let category_ids = match params.category.as_deref().filter(|slug| !slug.is_empty()) {
        Some(slug) => match scope_of(db, slug).await {
            Ok(ids) => Some(ids),
            Err(err) => return catalog_error(err),
        },
        None => None,
    };

    let filter = ProductFilter {
        query: params.q,
        category_ids,
        min_price,
        max_price,
        sort_by: SortBy::parse(params.sort_by.as_deref()),
    };
    let page = match browse::paginate(
        db,
        browse::available_products(&filter),
        PAGE_SIZE,
        params.page.as_deref(),
    )
    .await
    {
        Ok(page) => page,
        Err(err) => return catalog_error(err.into()),
    };
    let navigation = match categories::top_level(db).await {
        Ok(categories) => categories,
        Err(err) => return catalog_error(err),
    };

    let total = page.total;
    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "page_obj": page,
                "categories": navigation,
                "total_products": total,
            })),
        ),
        Ok(()),
    )
}

pub async fn product_detail(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(slug): Path<String>,
) -> Response {
    let db = db.as_ref();

    let product = match product::Entity::find()
        .filter(product::Column::Slug.eq(slug.as_str()))
        .filter(product::Column::IsAvailable.eq(true))
        .one(db)
        .await
    {
        Ok(Some(product)) => product,
        Ok(None) => return catalog_error(CatalogError::NotFound(format!("Product '{slug}'"))),
        Err(err) => return catalog_error(err.into()),
    };

    let detail = async {
        let category = categories::find(db, product.category_id).await?;
        let breadcrumb = categories::ancestors(db, &category, true).await?;
        let images = products::images(db, product.id).await?;
        let related = browse::related(db, &product).await?;
        let (reviews, average_rating) = reviews::approved_for(db, product.id).await?;
        Ok::<_, CatalogError>(json!({
            "product": &product,
            "in_stock": product.in_stock(),
            "low_stock": product.low_stock(),
            "category": category,
            "breadcrumb": breadcrumb,
            "product_images": images,
            "related_products": related,
            "reviews": reviews,
            "average_rating": average_rating,
        }))
    };

    match detail.await {
        Ok(body) => to_response((StatusCode::OK, Json(body)), Ok(())),
        Err(err) => catalog_error(err),
    }
}

/// The category with `slug` and every id below it.
pub(crate) async fn scope_of(db: &DatabaseConnection, slug: &str) -> Result<Vec<i32>, CatalogError> {
    let category = categories::find_by_slug(db, slug).await?;
    Ok(categories::descendants(db, &category, true)
        .await?
        .into_iter()
        .map(|category| category.id)
        .collect())
}

fn parse_price(key: &str, value: Option<&str>) -> Result<Option<f64>, Response> {
    match value.map(str::trim).filter(|value| !value.is_empty()) {
        None => Ok(None),
        Some(value) => match value.parse::<f64>() {
            Ok(price) if price.is_finite() => Ok(Some(price)),
            _ => {
                let message = format!("Invalid {key}: {value}");
                Err(error_response(
                    StatusCode::BAD_REQUEST,
                    message.clone(),
                    ApiError::ValidationFail(message),
                ))
            }
        },
    }
}

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{delete, get},
    Json, Router,
};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::api::public::media::MEDIA_NAME_REGEX;
use crate::api::{begin, catalog_error, commit, rollback};
use crate::catalog::{
    browse::{self, PAGE_SIZE},
    icontains,
    products::{self, NewImage, ProductChanges, ProductDraft},
    CatalogError,
};
use crate::config::Config;
use crate::entities::product::{self, ProductType};
use crate::middleware::logging::to_response;

pub fn admin_product_router() -> Router {
    Router::new()
        .route("/product", get(get_products).post(create_product))
        .route(
            "/product/:id",
            get(get_product).patch(patch_product).delete(delete_product),
        )
        .route(
            "/product/:id/images",
            get(get_images).post(add_image),
        )
        .route("/product/:id/images/:image_id", delete(remove_image))
}

/// Paginated admin listing, searchable by name, SKU and brand.
async fn get_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(params): Query<ProductsQuery>,
) -> Response {
    let mut condition = Condition::all();
    if let Some(query) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        condition = condition.add(
            Condition::any()
                .add(icontains((product::Entity, product::Column::Name), query))
                .add(icontains((product::Entity, product::Column::Sku), query))
                .add(icontains((product::Entity, product::Column::Brand), query)),
        );
    }
    if let Some(is_available) = params.is_available {
        condition = condition.add(product::Column::IsAvailable.eq(is_available));
    }
    if let Some(category) = params.category {
        condition = condition.add(product::Column::CategoryId.eq(category));
    }
    if let Some(product_type) = params.product_type {
        condition = condition.add(product::Column::ProductType.eq(product_type));
    }
    if let Some(origin_country) = params.origin_country {
        condition = condition.add(product::Column::OriginCountry.eq(origin_country));
    }

    let select = product::Entity::find()
        .filter(condition)
        .order_by_desc(product::Column::CreatedAt)
        .order_by_desc(product::Column::Id);
    match browse::paginate(db.as_ref(), select, PAGE_SIZE, params.page.as_deref()).await {
        Ok(page) => to_response((StatusCode::OK, Json(page)), Ok(())),
        Err(err) => catalog_error(err.into()),
    }
}

async fn create_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<ProductDraft>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    match products::create_product(&txn, payload).await {
        Ok(product) => commit(txn, (StatusCode::CREATED, Json(product))).await,
        Err(err) => rollback(txn, err).await,
    }
}

async fn get_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
) -> Response {
    let db = db.as_ref();

    let detail = async {
        let product = products::find(db, id).await?;
        let images = products::images(db, id).await?;
        Ok::<_, CatalogError>(json!({
            "in_stock": product.in_stock(),
            "low_stock": product.low_stock(),
            "product": product,
            "images": images,
        }))
    };

    match detail.await {
        Ok(body) => to_response((StatusCode::OK, Json(body)), Ok(())),
        Err(err) => catalog_error(err),
    }
}

async fn patch_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductChanges>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    match products::update_product(&txn, id, payload).await {
        Ok(product) => commit(txn, (StatusCode::OK, Json(product))).await,
        Err(err) => rollback(txn, err).await,
    }
}

async fn delete_product(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    match products::delete_product(&txn, id).await {
        Ok(()) => {
            commit(
                txn,
                (
                    StatusCode::OK,
                    Json(json!({ "message": "Resource deleted successfully." })),
                ),
            )
            .await
        }
        Err(err) => rollback(txn, err).await,
    }
}

async fn get_images(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
) -> Response {
    let db = db.as_ref();
    if let Err(err) = products::find(db, id).await {
        return catalog_error(err);
    }
    match products::images(db, id).await {
        Ok(images) => to_response((StatusCode::OK, Json(images)), Ok(())),
        Err(err) => catalog_error(err),
    }
}

async fn add_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
    Json(payload): Json<NewImage>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    match products::add_image(&txn, id, payload).await {
        Ok(image) => commit(txn, (StatusCode::CREATED, Json(image))).await,
        Err(err) => rollback(txn, err).await,
    }
}

async fn remove_image(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<Config>>,
    Path((id, image_id)): Path<(i32, i32)>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    let image = match products::remove_image(&txn, id, image_id).await {
        Ok(image) => image,
        Err(err) => return rollback(txn, err).await,
    };
    let response = commit(
        txn,
        (
            StatusCode::OK,
            Json(json!({ "message": "Resource deleted successfully." })),
        ),
    )
    .await;

    // Only files this service stored under the media root are removed.
    let stored = image
        .image
        .strip_prefix("/media/")
        .filter(|file| MEDIA_NAME_REGEX.is_match(file));
    if let Some(file) = stored {
        if let Err(err) = tokio::fs::remove_file(config.media_root.join(file)).await {
            warn!(file, error = %err, "Failed to remove image file");
        }
    }
    response
}

#[derive(Deserialize)]
struct ProductsQuery {
    q: Option<String>,
    is_available: Option<bool>,
    category: Option<i32>,
    product_type: Option<ProductType>,
    origin_country: Option<String>,
    page: Option<String>,
}

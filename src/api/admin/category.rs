use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::{ColumnTrait, Condition, DatabaseConnection};
use serde::{Deserialize, Deserializer};
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::{begin, catalog_error, commit, error_response, rollback};
use crate::catalog::{
    categories::{self, CategoryChanges, NewCategory},
    icontains, CatalogError,
};
use crate::entities::category;
use crate::middleware::logging::{to_response, ApiError};

pub fn admin_category_router() -> Router {
    Router::new()
        .route("/category", get(get_categories).post(create_category))
        .route(
            "/category/:id",
            get(get_category)
                .patch(patch_category)
                .delete(delete_category),
        )
}

async fn get_categories(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(params): Query<CategoriesQuery>,
) -> Response {
    let mut condition = Condition::all();
    if let Some(query) = params.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        condition = condition.add(icontains(
            (category::Entity, category::Column::Name),
            query,
        ));
    }
    if let Some(is_active) = params.is_active {
        condition = condition.add(category::Column::IsActive.eq(is_active));
    }
    if let Some(parent) = params.parent {
        condition = condition.add(category::Column::ParentId.eq(parent));
    }

    match categories::list_tree(db.as_ref(), condition).await {
        Ok(categories) => to_response((StatusCode::OK, Json(categories)), Ok(())),
        Err(err) => catalog_error(err),
    }
}

async fn create_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateCategory>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Category name is required",
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    let new = NewCategory {
        name: payload.name,
        slug: payload.slug,
        parent_id: payload.parent_id,
        description: payload.description.unwrap_or_default(),
        image: payload.image,
        is_active: payload.is_active.unwrap_or(true),
    };
    match categories::create_category(&txn, new).await {
        Ok(category) => commit(txn, (StatusCode::CREATED, Json(category))).await,
        Err(err) => rollback(txn, err).await,
    }
}

async fn get_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
) -> Response {
    let db = db.as_ref();

    let detail = async {
        let category = categories::find(db, id).await?;
        let ancestors = categories::ancestors(db, &category, false).await?;
        let children = categories::children(db, &category).await?;
        Ok::<_, CatalogError>(json!({
            "is_root": category.is_root(),
            "descendant_count": category.descendant_count(),
            "category": category,
            "ancestors": ancestors,
            "children": children,
        }))
    };

    match detail.await {
        Ok(body) => to_response((StatusCode::OK, Json(body)), Ok(())),
        Err(err) => catalog_error(err),
    }
}

async fn patch_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchCategory>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    let changes = CategoryChanges {
        name: payload.name,
        slug: payload.slug,
        parent_id: payload.parent_id,
        description: payload.description,
        image: payload.image,
        is_active: payload.is_active,
    };
    match categories::update_category(&txn, id, changes).await {
        Ok(category) => commit(txn, (StatusCode::OK, Json(category))).await,
        Err(err) => rollback(txn, err).await,
    }
}

async fn delete_category(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    match categories::delete_category(&txn, id).await {
        Ok(deleted) => {
            commit(
                txn,
                (
                    StatusCode::OK,
                    Json(json!({
                        "message": "Resource deleted successfully.",
                        "deleted": deleted,
                    })),
                ),
            )
            .await
        }
        Err(err) => rollback(txn, err).await,
    }
}

#[derive(Deserialize)]
struct CategoriesQuery {
    q: Option<String>,
    is_active: Option<bool>,
    parent: Option<i32>,
}

#[derive(Deserialize, Validate, Debug)]
struct CreateCategory {
    #[validate(length(min = 1, max = 200))]
    name: String,
    slug: Option<String>,
    parent_id: Option<i32>,
    description: Option<String>,
    image: Option<String>,
    is_active: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct PatchCategory {
    name: Option<String>,
    slug: Option<String>,
    /// Absent leaves the parent alone, `null` moves the node to the top.
    #[serde(default, deserialize_with = "present")]
    parent_id: Option<Option<i32>>,
    description: Option<String>,
    image: Option<String>,
    is_active: Option<bool>,
}

fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

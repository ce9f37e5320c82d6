use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::Response,
    routing::{get, patch},
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::api::{begin, catalog_error, commit, error_response, message, rollback};
use crate::catalog::reviews::{self, NewReview, ReviewChanges, ReviewFilter};
use crate::entities::{product, product_review};
use crate::middleware::logging::{to_response, ApiError};

pub fn admin_review_router() -> Router {
    Router::new()
        .route("/review", get(get_reviews).post(create_review))
        .route("/review/:id", patch(patch_review).delete(delete_review))
}

async fn get_reviews(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Query(params): Query<ReviewsQuery>,
) -> Response {
    let filter = ReviewFilter {
        query: params.q,
        rating: params.rating,
        is_approved: params.is_approved,
    };
    match reviews::list_reviews(db.as_ref(), filter).await {
        Ok(rows) => {
            let rows: Vec<ReviewRow> = rows.into_iter().map(ReviewRow::new).collect();
            to_response((StatusCode::OK, Json(rows)), Ok(()))
        }
        Err(err) => catalog_error(err),
    }
}

async fn create_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateReview>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5",
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    let new = NewReview {
        product_id: payload.product_id,
        user_id: payload.user_id,
        rating: payload.rating,
        title: payload.title.unwrap_or_default(),
        comment: payload.comment.unwrap_or_default(),
        is_approved: payload.is_approved.unwrap_or(false),
    };
    match reviews::create_review(&txn, new).await {
        Ok(review) => commit(txn, (StatusCode::CREATED, Json(review))).await,
        Err(err) => rollback(txn, err).await,
    }
}

async fn patch_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
    Json(payload): Json<PatchReview>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    let changes = ReviewChanges {
        rating: payload.rating,
        title: payload.title,
        comment: payload.comment,
        is_approved: payload.is_approved,
    };
    match reviews::update_review(&txn, id, changes).await {
        Ok(review) => commit(txn, (StatusCode::OK, Json(review))).await,
        Err(err) => rollback(txn, err).await,
    }
}

async fn delete_review(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Path(id): Path<i32>,
) -> Response {
    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    match reviews::delete_review(&txn, id).await {
        Ok(()) => match txn.commit().await {
            Ok(()) => message(StatusCode::OK, "Resource deleted successfully."),
            Err(err) => catalog_error(err.into()),
        },
        Err(err) => rollback(txn, err).await,
    }
}

#[derive(Deserialize)]
struct ReviewsQuery {
    q: Option<String>,
    rating: Option<i32>,
    is_approved: Option<bool>,
}

#[derive(Deserialize, Validate, Debug)]
struct CreateReview {
    product_id: i32,
    user_id: i32,
    #[validate(range(min = 1, max = 5))]
    rating: i32,
    title: Option<String>,
    comment: Option<String>,
    is_approved: Option<bool>,
}

#[derive(Deserialize, Debug)]
struct PatchReview {
    rating: Option<i32>,
    title: Option<String>,
    comment: Option<String>,
    is_approved: Option<bool>,
}

#[derive(Serialize)]
struct ReviewRow {
    #[serde(flatten)]
    review: product_review::Model,
    product_name: Option<String>,
}

impl ReviewRow {
    fn new((review, product): (product_review::Model, Option<product::Model>)) -> ReviewRow {
        ReviewRow {
            review,
            product_name: product.map(|product| product.name),
        }
    }
}

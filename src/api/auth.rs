use axum::{extract::Extension, http::StatusCode, response::Response, routing::post, Json, Router};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use validator::Validate;

use crate::api::{error_response, internal_error};
use crate::config::Config;
use crate::entities::user::{self, Entity as UserEntity};
use crate::middleware::{
    auth::generate_token,
    logging::{to_response, ApiError},
};

pub fn auth_router() -> Router {
    Router::new().route("/login", post(login))
}

async fn login(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Extension(config): Extension<Arc<Config>>,
    Json(payload): Json<UserLogin>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username and password are required",
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let result = UserEntity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .one(db.as_ref())
        .await;

    let model = match result {
        Ok(Some(model)) => model,
        Ok(None) => return invalid_credentials(),
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    };
    if model.check_hash(&payload.password).is_err() {
        return invalid_credentials();
    }

    match generate_token(model.id, model.role, &config.secret) {
        Ok(token) => to_response((StatusCode::OK, Json(json!({ "token": token }))), Ok(())),
        Err(err) => internal_error(ApiError::TokenGenerationFailed(err.to_string())),
    }
}

fn invalid_credentials() -> Response {
    error_response(
        StatusCode::UNAUTHORIZED,
        "Invalid username or password",
        ApiError::General("Invalid username or password".to_owned()),
    )
}

#[derive(Deserialize, Validate)]
struct UserLogin {
    #[validate(length(min = 1))]
    username: String,
    #[validate(length(min = 1))]
    password: String,
}

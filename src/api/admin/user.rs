use axum::{
    extract::Extension, http::StatusCode, response::Response, routing::get, Json, Router,
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::api::{begin, commit, error_response, internal_error};
use crate::entities::user::{self, hash_password, Entity as UserEntity, Role};
use crate::middleware::logging::{to_response, ApiError};

pub fn admin_user_router() -> Router {
    Router::new().route("/user", get(get_users).post(create_user))
}

async fn get_users(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    match UserEntity::find()
        .order_by_asc(user::Column::Id)
        .all(db.as_ref())
        .await
    {
        Ok(users) => {
            let users: Vec<UserResponse> = users.into_iter().map(UserResponse::new).collect();
            to_response((StatusCode::OK, Json(users)), Ok(()))
        }
        Err(err) => internal_error(ApiError::DbError(err.to_string())),
    }
}

async fn create_user(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    Json(payload): Json<CreateUser>,
) -> Response {
    if let Err(err) = payload.validate() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Username must be 3-32 characters and the password at least 5",
            ApiError::ValidationFail(err.to_string()),
        );
    }

    let txn = match begin(&db).await {
        Ok(txn) => txn,
        Err(response) => return response,
    };

    match UserEntity::find()
        .filter(user::Column::Username.eq(payload.username.as_str()))
        .count(&txn)
        .await
    {
        Ok(0) => {}
        Ok(_) => {
            let _ = txn.rollback().await;
            return error_response(
                StatusCode::CONFLICT,
                "Username already exists",
                ApiError::General(format!("Duplicate username {}", payload.username)),
            );
        }
        Err(err) => return internal_error(ApiError::DbError(err.to_string())),
    }

    let password = match hash_password(&payload.password) {
        Ok(password) => password,
        Err(err) => return internal_error(ApiError::PasswordHashFailed(err)),
    };

    let new_user = user::ActiveModel {
        username: Set(payload.username),
        password: Set(password),
        role: Set(payload.role.unwrap_or(Role::Customer)),
        ..Default::default()
    };
    match UserEntity::insert(new_user).exec_with_returning(&txn).await {
        Ok(model) => commit(txn, (StatusCode::CREATED, Json(UserResponse::new(model)))).await,
        Err(err) => {
            let _ = txn.rollback().await;
            internal_error(ApiError::DbError(err.to_string()))
        }
    }
}

#[derive(Deserialize, Validate, Debug)]
struct CreateUser {
    #[validate(length(min = 3, max = 32))]
    username: String,
    #[validate(length(min = 5))]
    password: String,
    role: Option<Role>,
}

#[derive(Serialize)]
struct UserResponse {
    id: i32,
    username: String,
    role: Role,
}

impl UserResponse {
    fn new(model: user::Model) -> UserResponse {
        UserResponse {
            id: model.id,
            username: model.username,
            role: model.role,
        }
    }
}

use axum::{
    extract::{Extension, Multipart},
    http::StatusCode,
    response::Response,
    routing::post,
    Json, Router,
};
use serde_json::json;
use std::{collections::HashMap, sync::Arc};
use tracing::info;
use uuid::Uuid;

use crate::api::{error_response, internal_error};
use crate::config::Config;
use crate::middleware::logging::{to_response, ApiError};

pub fn upload_router() -> Router {
    Router::new().route("/upload", post(upload))
}

/// Stores the first file of the form under the media root with a fresh name
/// and answers with the path it is served from.
async fn upload(Extension(config): Extension<Arc<Config>>, mut multipart: Multipart) -> Response {
    let field = match multipart.next_field().await {
        Ok(Some(field)) => field,
        Ok(None) => return bad_request("No file was sent."),
        Err(err) => return bad_request_with("Malformed multipart body.", err.to_string()),
    };

    let Some(content_type) = field.content_type().map(str::to_owned) else {
        return bad_request("Content type is not set.");
    };
    let Some(&extension) = allowed_content_types().get(content_type.as_str()) else {
        return bad_request("Unsupported content type.");
    };

    let data = match field.bytes().await {
        Ok(data) => data,
        Err(err) => return bad_request_with("Failed to read file bytes.", err.to_string()),
    };
    if data.len() > config.file_size_limit {
        return error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Payload too large",
            ApiError::General(format!("{} bytes over the limit", data.len())),
        );
    }

    let file_name = format!("{}.{}", Uuid::new_v4(), extension);
    if let Err(err) = tokio::fs::create_dir_all(&config.media_root).await {
        return internal_error(ApiError::Io(err.to_string()));
    }
    if let Err(err) = tokio::fs::write(config.media_root.join(&file_name), &data).await {
        return internal_error(ApiError::Io(err.to_string()));
    }
    info!(file = %file_name, bytes = data.len(), "Stored upload");

    to_response(
        (
            StatusCode::CREATED,
            Json(json!({
                "message": "File uploaded successfully.",
                "path": format!("/media/{file_name}"),
            })),
        ),
        Ok(()),
    )
}

fn allowed_content_types() -> HashMap<&'static str, &'static str> {
    HashMap::from([
        ("image/jpeg", "jpg"),
        ("image/png", "png"),
        ("image/webp", "webp"),
        ("image/gif", "gif"),
    ])
}

fn bad_request(message: &str) -> Response {
    bad_request_with(message, message.to_owned())
}

fn bad_request_with(message: &str, detail: String) -> Response {
    error_response(StatusCode::BAD_REQUEST, message, ApiError::General(detail))
}

use axum::{
    body::Body,
    extract::{Extension, Path},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::error_response;
use crate::config::Config;
use crate::middleware::logging::{to_response, ApiError};

/// Stored names are `{uuid}.{ext}`; anything else is refused before the
/// filesystem is touched.
pub(crate) static MEDIA_NAME_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]+\.[a-zA-Z0-9]+$").unwrap());

pub async fn print_media(
    Extension(config): Extension<Arc<Config>>,
    Path(file): Path<String>,
) -> Response {
    if !MEDIA_NAME_REGEX.is_match(&file) {
        return not_found(format!("Rejected media name {file}"));
    }

    let path = config.media_root.join(&file);
    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) => return not_found(err.to_string()),
    };

    let content_type = mime_guess::from_path(&path)
        .first_raw()
        .unwrap_or("application/octet-stream");

    let body = Body::from_stream(ReaderStream::new(file));

    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_str(content_type)
            .unwrap_or(HeaderValue::from_static("application/octet-stream")),
    );
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("inline"),
    );

    to_response((headers, body), Ok(()))
}

fn not_found(detail: String) -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", ApiError::Io(detail))
}

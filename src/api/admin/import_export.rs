use axum::{
    extract::{Extension, Multipart},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::Response,
    routing::get,
    Json, Router,
};
use sea_orm::DatabaseConnection;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::api::{error_response, internal_error};
use crate::catalog::{
    export::{self, ExportError, EXPORT_FILE_NAME, TEMPLATE_FILE_NAME},
    import::{self, ImportFormat, COLUMNS},
};
use crate::middleware::logging::{to_response, ApiError};

pub fn import_export_router() -> Router {
    Router::new()
        .route(
            "/product/import-products",
            get(import_form).post(import_products),
        )
        .route("/product/export-products", get(export_products))
        .route("/product/download-template", get(download_template))
}

async fn import_form() -> Response {
    to_response(
        (
            StatusCode::OK,
            Json(json!({
                "fields": {
                    "file": "CSV or Excel file with a header row",
                    "format": ["csv", "excel"],
                },
                "columns": COLUMNS,
            })),
        ),
        Ok(()),
    )
}

/// Multipart form with `file` and an optional `format` (`csv` by default).
async fn import_products(
    Extension(db): Extension<Arc<DatabaseConnection>>,
    mut multipart: Multipart,
) -> Response {
    let mut file = None;
    let mut format = String::from("csv");

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Malformed multipart body.",
                    ApiError::General(err.to_string()),
                )
            }
        };
        let name = field.name().unwrap_or_default().to_owned();
        let read = match name.as_str() {
            "file" => field.bytes().await.map(|bytes| file = Some(bytes)),
            "format" => field.text().await.map(|text| format = text),
            _ => Ok(()),
        };
        if let Err(err) = read {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Failed to read the form.",
                ApiError::General(err.to_string()),
            );
        }
    }

    let Some(file) = file.filter(|bytes| !bytes.is_empty()) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Please select a file to import.",
            ApiError::ImportFailed("No file".to_owned()),
        );
    };
    let format = match format.parse::<ImportFormat>() {
        Ok(format) => format,
        Err(err) => return import_failed(err),
    };

    match import::import_file(db.as_ref(), &file, format).await {
        Ok(report) => {
            info!(
                imported = report.imported,
                skipped = report.skipped,
                errors = report.errors,
                "Imported products"
            );
            to_response(
                (
                    StatusCode::OK,
                    Json(json!({
                        "imported": report.imported,
                        "skipped": report.skipped,
                        "errors": report.errors,
                        "messages": report.messages(),
                        "rows": report.summaries(),
                    })),
                ),
                Ok(()),
            )
        }
        Err(err) => import_failed(err),
    }
}

async fn export_products(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    csv_attachment(export::export_products(db.as_ref()).await, EXPORT_FILE_NAME)
}

async fn download_template(Extension(db): Extension<Arc<DatabaseConnection>>) -> Response {
    csv_attachment(export::import_template(db.as_ref()).await, TEMPLATE_FILE_NAME)
}

fn csv_attachment(result: Result<Vec<u8>, ExportError>, file_name: &str) -> Response {
    let body = match result {
        Ok(body) => body,
        Err(err) => return internal_error(ApiError::General(err.to_string())),
    };

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/csv"));
    match HeaderValue::from_str(&format!("attachment; filename=\"{file_name}\"")) {
        Ok(value) => {
            headers.insert(header::CONTENT_DISPOSITION, value);
        }
        Err(err) => return internal_error(ApiError::General(err.to_string())),
    }

    to_response((StatusCode::OK, headers, body), Ok(()))
}

fn import_failed(err: import::ImportError) -> Response {
    let message = format!("Error importing products: {err}");
    error_response(StatusCode::BAD_REQUEST, message.clone(), ApiError::ImportFailed(message))
}

pub mod api;
pub mod catalog;
pub mod config;
pub mod entities;
pub mod middleware;

use axum::{extract::Request, Router, ServiceExt};
use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::info;

use crate::config::Config;
use crate::entities::setup_schema;

/// Opens the pool and creates any missing tables.
pub async fn connect(database_url: &str, max_connections: u32) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());
    options.max_connections(max_connections).sqlx_logging(false);

    let db = Database::connect(options).await?;
    setup_schema(&db).await?;
    info!(url = %database_url, "Connected to database");
    Ok(db)
}

pub async fn connect_with(config: &Config) -> Result<DatabaseConnection, DbErr> {
    connect(&config.database_url, config.db_max_connections).await
}

/// Serves `app` with trailing slashes made optional on every route.
pub async fn serve(listener: TcpListener, app: Router) -> std::io::Result<()> {
    let app = NormalizePathLayer::trim_trailing_slash().layer(app);
    axum::serve(listener, ServiceExt::<Request>::into_make_service(app)).await
}

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use sunrise_store::api::create_api_router;
use sunrise_store::config::Config;
use sunrise_store::entities::primary_setup;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("sunrise_store=info,tower_http=info")),
        )
        .init();

    let config = Config::from_env()?;
    let db = sunrise_store::connect_with(&config).await?;
    primary_setup(&db, &config).await?;

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %listener.local_addr()?, "Listening");

    let app = create_api_router(Arc::new(db), Arc::new(config));
    sunrise_store::serve(listener, app).await?;
    Ok(())
}

use sea_orm::{Database, DatabaseConnection};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use storefront_api::api::create_api_router;
use storefront_api::config::Config;
use storefront_api::entities::{seed_sample_data, setup_schema};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().expect("Invalid configuration");

    let db: DatabaseConnection = Database::connect(&config.database_url)
        .await
        .expect("Failed to connect to the database");
    setup_schema(&db).await.expect("Failed to create schema");

    if config.seed_data {
        seed_sample_data(&db).await.expect("Failed to seed sample data");
    }

    let shared_db = Arc::new(db);
    let app = create_api_router(shared_db);

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .expect("Failed to bind listener");
    info!(addr = %config.bind_addr, "Storefront API listening");
    axum::serve(listener, app).await.expect("Server error");
}

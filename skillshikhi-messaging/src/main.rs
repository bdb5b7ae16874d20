use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod models;
mod routes;
mod schema;

use config::AppConfig;
use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;
use skillshikhi_shared::middleware::HasDb;

pub use skillshikhi_shared::clients::db::DbPool;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
}

impl HasDb for AppState {
    fn db(&self) -> &DbPool {
        &self.db
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skillshikhi_shared::middleware::init_tracing("skillshikhi-messaging");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the shared auth extractor
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = skillshikhi_shared::clients::db::create_pool(&config.database_url, 10)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/messages", post(routes::messages::send_message))
        .route("/messages/unread-count", get(routes::messages::unread_count))
        .route("/messages/:id", get(routes::messages::get_conversation))
        .route("/messages/:id/read", post(routes::messages::mark_conversation_read))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "skillshikhi-messaging starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

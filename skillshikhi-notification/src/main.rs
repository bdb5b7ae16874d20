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
mod services;

use config::AppConfig;
use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;

pub use skillshikhi_shared::clients::db::DbPool;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skillshikhi_shared::middleware::init_tracing("skillshikhi-notification");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the shared auth extractor
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = skillshikhi_shared::clients::db::create_pool(&config.database_url, 10)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq });

    // Spawn friendship event subscriber
    let friend_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_friend_events(friend_state).await {
            tracing::error!(error = %e, "friend event subscriber failed");
        }
    });

    // Spawn session event subscriber
    let session_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_session_events(session_state).await {
            tracing::error!(error = %e, "session event subscriber failed");
        }
    });

    // Spawn message event subscriber
    let message_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_message_events(message_state).await {
            tracing::error!(error = %e, "message event subscriber failed");
        }
    });

    // Spawn moderation event subscriber
    let moderation_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_moderation_events(moderation_state).await {
            tracing::error!(error = %e, "moderation event subscriber failed");
        }
    });

    // Purge notifications past the retention window once a day.
    services::notification_service::spawn_retention_task(state.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/unread-count", get(routes::notifications::unread_count))
        .route("/notifications/mark-all-read", post(routes::notifications::mark_all_read))
        .route("/notifications/:id/read", post(routes::notifications::mark_read))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "skillshikhi-notification starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

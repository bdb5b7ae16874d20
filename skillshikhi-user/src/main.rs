use axum::routing::{delete, get, post, put};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod config;
mod events;
mod friendship;
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
    skillshikhi_shared::middleware::init_tracing("skillshikhi-user");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the shared auth extractor
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = skillshikhi_shared::clients::db::create_pool(&config.database_url, 10)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq });

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/users/me", get(routes::profile::get_own_profile).put(routes::profile::update_profile))
        .route("/users/search", get(routes::profile::search_users))
        .route("/users/:id", get(routes::profile::get_profile))
        .route("/friends", get(routes::friends::list_friends))
        .route("/friends/requests", get(routes::friends::list_pending_requests))
        .route("/friends/status/:id", get(routes::friends::friend_status))
        .route("/friends/:id", post(routes::friends::send_request).delete(routes::friends::remove_request))
        .route("/friends/:id/accept", put(routes::friends::accept_request))
        .route("/friends/:id/unfriend", delete(routes::friends::unfriend))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "skillshikhi-user starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

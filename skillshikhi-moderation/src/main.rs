use axum::routing::{get, patch, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

mod audit;
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
    skillshikhi_shared::middleware::init_tracing("skillshikhi-moderation");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var for the shared auth extractor
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = skillshikhi_shared::clients::db::create_pool(&config.database_url, 10)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq });

    let admin_routes = Router::new()
        .route("/reports", get(routes::admin_reports::list_reports))
        .route("/reports/bulk/:action", post(routes::admin_reports::bulk_review_reports))
        .route("/reports/:id", get(routes::admin_reports::get_report))
        .route("/reports/:id/:action", post(routes::admin_reports::review_report))
        .route("/users", get(routes::admin_users::list_users))
        .route("/users/:id/promote", patch(routes::admin_users::promote_user))
        .route("/users/:id/demote", patch(routes::admin_users::demote_user))
        .route("/users/:id/ban", patch(routes::admin_users::ban_user))
        .route("/users/:id/unban", patch(routes::admin_users::unban_user))
        .route("/audit-log", get(routes::admin_reports::get_audit_log));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/reports", post(routes::user_routes::create_report))
        .nest("/admin", admin_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "skillshikhi-moderation starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

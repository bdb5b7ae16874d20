use axum::routing::get;
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
    skillshikhi_shared::middleware::init_tracing("skillshikhi-analytics");

    let config = AppConfig::load()?;
    let port = config.port;

    // Set JWT_SECRET env var so the shared auth extractor can read it
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = skillshikhi_shared::clients::db::create_pool(&config.database_url, 10)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;

    let state = Arc::new(AppState { db, config, rabbitmq });

    // Spawn RabbitMQ subscriber for all events
    let sub_state = state.clone();
    tokio::spawn(async move {
        if let Err(e) = events::subscriber::listen_all_events(sub_state).await {
            tracing::error!(error = %e, "analytics event subscriber failed");
        }
    });

    // Regenerate today's snapshot every hour
    services::aggregation::spawn_aggregation_task(state.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route(
            "/admin/analytics",
            get(routes::stats::get_snapshots).post(routes::stats::generate_snapshot),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "skillshikhi-analytics starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

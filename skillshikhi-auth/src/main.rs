use axum::routing::{get, patch, post};
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
use skillshikhi_shared::clients::email::EmailClient;
use skillshikhi_shared::clients::rabbitmq::RabbitMQClient;
use skillshikhi_shared::middleware::HasDb;

pub use skillshikhi_shared::clients::db::DbPool;

pub struct AppState {
    pub db: DbPool,
    pub config: AppConfig,
    pub rabbitmq: RabbitMQClient,
    pub email: EmailClient,
}

impl HasDb for AppState {
    fn db(&self) -> &DbPool {
        &self.db
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    skillshikhi_shared::middleware::init_tracing("skillshikhi-auth");

    let config = AppConfig::load()?;
    let port = config.port;

    // The shared auth extractor reads the secret from the environment.
    std::env::set_var("JWT_SECRET", &config.jwt_secret);

    let db = skillshikhi_shared::clients::db::create_pool(&config.database_url, 10)?;

    let rabbitmq = RabbitMQClient::connect(&config.rabbitmq_url).await?;
    let email = EmailClient::new(&config.resend_api_key, &config.from_email, "SkillShikhi");

    let state = Arc::new(AppState { db, config, rabbitmq, email });

    // Expire idle device sessions in the background.
    services::session_service::spawn_expiry_task(state.clone());

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/register", post(routes::register::register))
        .route("/login", post(routes::login::login))
        .route("/refresh", post(routes::refresh::refresh_token))
        .route("/logout", post(routes::logout::logout))
        .route("/forgot-password", post(routes::forgot_password::forgot_password))
        .route("/reset-password", post(routes::reset_password::reset_password))
        .route("/validate-reset-token", get(routes::validate_reset_token::validate_reset_token))
        .route("/me", get(routes::me::me))
        .route("/admin/login", post(routes::admin_login::admin_login).get(routes::admin_login::validate_admin))
        .route("/admin/sessions", get(routes::sessions::list_sessions).post(routes::sessions::record_own_session))
        .route("/admin/sessions/:id/terminate", patch(routes::sessions::terminate_session))
        .route("/internal/sessions/heartbeat", post(routes::sessions::heartbeat))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = format!("0.0.0.0:{port}");
    tracing::info!(addr = %addr, "skillshikhi-auth starting");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

use axum::Json;

use skillshikhi_shared::types::api::HealthResponse;

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse::healthy(
        "skillshikhi-auth",
        env!("CARGO_PKG_VERSION"),
    ))
}

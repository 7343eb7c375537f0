use axum::http::StatusCode;
use axum::response::IntoResponse;

/// GET a liveness response for load balancers and orchestration probes
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "healthy")
}

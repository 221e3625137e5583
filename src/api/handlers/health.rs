use axum::{http::StatusCode, response::IntoResponse};

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is up", body = String, content_type = "text/plain")
    ),
    tag = "system"
)]
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

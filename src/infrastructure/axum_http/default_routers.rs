use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;
use tracing::debug;

pub async fn not_found() -> impl IntoResponse {
    debug!("router: unmatched route");
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "code": 404, "message": "route not found" })),
    )
        .into_response()
}

pub async fn health_check() -> impl IntoResponse {
    Json(json!({ "status": "ok", "service": "tillkeeper" })).into_response()
}

use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use retailerp_infra::snapshot_store::StoreError;

/// Snapshot reads only fail on the backend, so every `StoreError` is a 503.
pub fn store_error_to_response(err: StoreError) -> axum::response::Response {
    json_error(StatusCode::SERVICE_UNAVAILABLE, "store_error", err.to_string())
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

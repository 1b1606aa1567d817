use std::sync::Arc;

use axum::{
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;

use retailerp_infra::{ReconstructionReport, snapshot_store::StockSnapshot};

use crate::app::errors;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/recalculate", post(recalculate))
        .route("/snapshots", get(list_snapshots))
}

#[derive(Debug, Serialize)]
pub struct SnapshotList {
    pub count: usize,
    pub snapshots: Vec<StockSnapshot>,
}

/// Rebuild every stock snapshot from movement history. The request body is ignored.
pub async fn recalculate(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.recalculate().await {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "inventory recalculation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ReconstructionReport::failure(&e)),
            )
                .into_response()
        }
    }
}

pub async fn list_snapshots(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.snapshots().await {
        Ok(snapshots) => (
            StatusCode::OK,
            Json(SnapshotList {
                count: snapshots.len(),
                snapshots,
            }),
        )
            .into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

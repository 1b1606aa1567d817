use axum::Router;

pub mod inventory;
pub mod system;

/// Router for all API endpoints except `/health`.
pub fn router() -> Router {
    Router::new().nest("/inventory", inventory::router())
}

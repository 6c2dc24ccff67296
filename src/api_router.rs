//! Combines all API endpoints from the feature modules into a unified router.

use axum::{
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::core::shared::state::AppState;
use crate::directory::roles;

/// Configure all API routes from all modules
pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health))
        // ===== Authentication (directory module) =====
        .merge(crate::directory::auth_routes::configure())
        // ===== Role membership (directory module, admin only) =====
        .route(
            "/api/users/:id/roles",
            post(roles::attach_role).delete(roles::detach_role),
        )
        // ===== Tickets =====
        .merge(crate::tickets::configure_tickets_routes())
        // ===== Ticket responses =====
        .merge(crate::responses::configure_responses_routes())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

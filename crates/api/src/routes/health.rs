//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use domain::User;
use serde::Serialize;
use store::EntityStore;

use crate::routes::users::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether queries run on a separate read-only store.
    pub read_replica: bool,
}

/// GET /health — returns system health status.
pub async fn check<S: EntityStore<User>>(
    State(state): State<Arc<AppState<S>>>,
) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        read_replica: state.users.router().has_replica(),
    })
}

//! HTTP API server for the users bounded context.
//!
//! Provides REST endpoints over the CQRS dispatcher, with structured
//! logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use domain::{DispatchError, NotificationProducer, User, users};
use metrics_exporter_prometheus::PrometheusHandle;
use store::{ConnectionRouter, EntityStore};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use routes::users::AppState;

/// Creates the Axum application router with all routes and shared state.
pub fn create_app<S: EntityStore<User>>(
    state: Arc<AppState<S>>,
    metrics_handle: PrometheusHandle,
) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check::<S>))
        .route(
            "/users",
            get(routes::users::list::<S>).post(routes::users::create::<S>),
        )
        .route(
            "/users/{id}",
            get(routes::users::get::<S>)
                .put(routes::users::update::<S>)
                .delete(routes::users::delete::<S>),
        )
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates the application state, wiring the users bounded context over `router`.
pub fn create_state<S: EntityStore<User>>(
    router: ConnectionRouter<S>,
    producer: Arc<dyn NotificationProducer>,
) -> Result<Arc<AppState<S>>, DispatchError> {
    let users = users::bounded_context(router, producer)?;
    Ok(Arc::new(AppState { users }))
}

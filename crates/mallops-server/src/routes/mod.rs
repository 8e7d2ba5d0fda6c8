//! HTTP route definitions.

mod health;
mod notifications;
mod permits;
mod tenants;
mod workflows;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health::root))
        .route("/health", get(health::health))
        .nest("/api/work-permits", permits::router())
        .nest("/api/workflows", workflows::router())
        .nest("/api/notifications", notifications::router())
        .nest("/api/tenants", tenants::router())
        .with_state(state)
}

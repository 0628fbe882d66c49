//! Route definitions for the dispatch API

mod configs;
mod incidents;
mod ratings;
mod staff;
mod zones;

use axum::{routing::get, Router};

use crate::app_state::AppState;

pub use configs::config_routes;
pub use incidents::incident_routes;
pub use ratings::rating_routes;
pub use staff::staff_routes;
pub use zones::zone_routes;

/// Every route, bound to `state`. Transport layers (CORS, tracing) are added
/// by the binary.
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .nest("/incidents", incident_routes())
        .nest("/staff", staff_routes())
        .nest("/danger-zones", zone_routes())
        .nest("/ratings", rating_routes())
        .nest("/configs", config_routes());

    Router::new()
        .route("/", get(root))
        .route("/health", get(health_check))
        .nest("/api", api)
        .with_state(state)
}

async fn root() -> &'static str {
    "Dididaren Dispatch API Server"
}

async fn health_check() -> &'static str {
    "OK"
}

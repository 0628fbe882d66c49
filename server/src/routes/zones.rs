use axum::{
    routing::{get, post, put},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::zones::{
    check_point, create_zone, delete_zone, get_zone, list_active_zones, nearby_zones,
    update_heat_level, update_zone,
};

pub fn zone_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_zone))
        .route("/check", get(check_point))
        .route("/nearby", get(nearby_zones))
        .route("/active", get(list_active_zones))
        .route("/:id", get(get_zone).put(update_zone).delete(delete_zone))
        .route("/:id/heat-level", put(update_heat_level))
}

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::staff::{apply_for_staff, get_my_profile, update_location, verify_staff};

pub fn staff_routes() -> Router<AppState> {
    Router::new()
        .route("/apply", post(apply_for_staff))
        .route("/me", get(get_my_profile))
        .route("/location", put(update_location))
        .route("/:id/verification", put(verify_staff))
}

use axum::{
    routing::{get, post},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::ratings::{
    create_rating, delete_rating, get_incident_rating, get_rating, get_staff_average,
    list_staff_ratings, update_rating,
};

pub fn rating_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(create_rating))
        .route("/incident/:id", get(get_incident_rating))
        .route("/staff/:id", get(list_staff_ratings))
        .route("/staff/:id/average", get(get_staff_average))
        .route("/:id", get(get_rating).put(update_rating).delete(delete_rating))
}

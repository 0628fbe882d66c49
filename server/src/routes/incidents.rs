use axum::{
    routing::{get, post, put},
    Router,
};

use crate::app_state::AppState;
use crate::handlers::incidents::{
    accept_incident, assign_incident, complete_incident, delete_incident, get_incident,
    list_incidents, list_records, record_progress, report_incident, update_incident_status,
};

pub fn incident_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(report_incident).get(list_incidents))
        .route("/:id", get(get_incident).delete(delete_incident))
        .route("/:id/assign", post(assign_incident))
        .route("/:id/accept", post(accept_incident))
        .route("/:id/records", post(record_progress).get(list_records))
        .route("/:id/complete", post(complete_incident))
        .route("/:id/status", put(update_incident_status))
}

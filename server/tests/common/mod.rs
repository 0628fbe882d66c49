#![allow(dead_code)]

use std::sync::Arc;

use uuid::Uuid;

use dididaren_server::app_state::AppState;
use dididaren_server::auth::{generate_access_token, JwtKeys};
use dididaren_server::geo::Coordinate;
use dididaren_server::models::{
    ApplyStaffRequest, Identity, IncidentCategory, ReportIncidentRequest, Role, StaffProfile,
    VerificationStatus,
};
use dididaren_server::store::MemoryStore;

pub const SECRET: &str = "integration-test-secret";

pub fn state() -> AppState {
    state_with_radius(5_000.0)
}

pub fn state_with_radius(radius_meters: f64) -> AppState {
    AppState::new(
        Arc::new(MemoryStore::new()),
        JwtKeys::new(SECRET, 1),
        radius_meters,
    )
}

pub fn user() -> Identity {
    Identity::new(Uuid::new_v4(), Role::User)
}

pub fn admin() -> Identity {
    Identity::new(Uuid::new_v4(), Role::Admin)
}

pub fn bearer(identity: &Identity) -> String {
    let token = generate_access_token(&JwtKeys::new(SECRET, 1), identity.user_id, identity.role)
        .expect("sign token");
    format!("Bearer {token}")
}

/// An approved, online staff member at the given position.
pub async fn on_duty_staff(state: &AppState, latitude: f64, longitude: f64) -> (Identity, StaffProfile) {
    let identity = Identity::new(Uuid::new_v4(), Role::Staff);
    let dispatch = &state.dispatch_service;

    let profile = dispatch
        .apply(&identity, application())
        .await
        .expect("apply");
    dispatch
        .verify(profile.id, VerificationStatus::Approved)
        .await
        .expect("approve");
    let profile = dispatch
        .set_availability(
            profile.id,
            Coordinate::new(latitude, longitude).expect("coordinate"),
            true,
        )
        .await
        .expect("go online");

    (identity, profile)
}

pub fn application() -> ApplyStaffRequest {
    ApplyStaffRequest {
        company_name: "Night Patrol Ltd".to_string(),
        license_number: "LIC-2024-0042".to_string(),
        cert_files: vec!["certs/guard-card.pdf".to_string()],
    }
}

pub fn report(category: IncidentCategory, latitude: f64, longitude: f64) -> ReportIncidentRequest {
    ReportIncidentRequest {
        category,
        latitude,
        longitude,
        address: None,
        description: "needs help".to_string(),
    }
}

//! Application state shared across handlers

use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::JwtKeys;
use crate::services::{ConfigService, DispatchService, IncidentService, RatingService, ZoneService};
use crate::store::SharedStore;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub incident_service: Arc<IncidentService>,
    pub dispatch_service: Arc<DispatchService>,
    pub zone_service: Arc<ZoneService>,
    pub rating_service: Arc<RatingService>,
    pub config_service: Arc<ConfigService>,
    pub jwt_keys: JwtKeys,
}

impl AppState {
    pub fn new(store: SharedStore, jwt_keys: JwtKeys, dispatch_radius_meters: f64) -> Self {
        let dispatch = DispatchService::new(store.clone());
        let zones = ZoneService::new(store.clone());
        let config = ConfigService::new(store.clone());
        let ratings = RatingService::new(store.clone(), dispatch.clone());
        let incidents = IncidentService::new(
            store,
            dispatch.clone(),
            zones.clone(),
            config.clone(),
            dispatch_radius_meters,
        );

        Self {
            incident_service: Arc::new(incidents),
            dispatch_service: Arc::new(dispatch),
            zone_service: Arc::new(zones),
            rating_service: Arc::new(ratings),
            config_service: Arc::new(config),
            jwt_keys,
        }
    }
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.jwt_keys.clone()
    }
}

impl FromRef<AppState> for Arc<IncidentService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.incident_service.clone()
    }
}

impl FromRef<AppState> for Arc<DispatchService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.dispatch_service.clone()
    }
}

impl FromRef<AppState> for Arc<ZoneService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.zone_service.clone()
    }
}

impl FromRef<AppState> for Arc<RatingService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.rating_service.clone()
    }
}

impl FromRef<AppState> for Arc<ConfigService> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.config_service.clone()
    }
}

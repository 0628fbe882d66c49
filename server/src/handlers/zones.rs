use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{AdminUser, AuthenticatedUser, ValidatedJson, ValidatedPath, ValidatedQuery};
use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::models::{
    ApiResponse, CheckPointQuery, CreateZoneRequest, HeatAdjustment, HeatLevelRequest,
    NearbyZonesQuery, UpdateZoneRequest, Zone, ZoneCheck, ZoneMatch,
};
use crate::services::ZoneService;

pub async fn create_zone(
    State(service): State<Arc<ZoneService>>,
    AdminUser(_): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateZoneRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Zone>>), DispatchError> {
    let zone = service.create(payload.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Zone created", zone)),
    ))
}

pub async fn get_zone(
    State(service): State<Arc<ZoneService>>,
    AuthenticatedUser(_): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<Zone>>, DispatchError> {
    let zone = service.get(id).await?;
    Ok(Json(ApiResponse::ok(zone)))
}

pub async fn update_zone(
    State(service): State<Arc<ZoneService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateZoneRequest>,
) -> Result<Json<ApiResponse<Zone>>, DispatchError> {
    let zone = service.update(id, payload).await?;
    Ok(Json(ApiResponse::with_message("Zone updated", zone)))
}

pub async fn delete_zone(
    State(service): State<Arc<ZoneService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    service.delete(id).await?;
    Ok(Json(ApiResponse::with_message("Zone deleted", ())))
}

pub async fn list_active_zones(
    State(service): State<Arc<ZoneService>>,
    AuthenticatedUser(_): AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<Zone>>>, DispatchError> {
    let zones = service.list_active().await?;
    Ok(Json(ApiResponse::ok(zones)))
}

pub async fn check_point(
    State(service): State<Arc<ZoneService>>,
    AuthenticatedUser(_): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<CheckPointQuery>,
) -> Result<Json<ApiResponse<ZoneCheck>>, DispatchError> {
    let point = Coordinate::new(query.latitude, query.longitude)?;
    let check = service.check_point(point).await?;
    Ok(Json(ApiResponse::ok(check)))
}

pub async fn nearby_zones(
    State(service): State<Arc<ZoneService>>,
    AuthenticatedUser(_): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<NearbyZonesQuery>,
) -> Result<Json<ApiResponse<Vec<ZoneMatch>>>, DispatchError> {
    let point = Coordinate::new(query.latitude, query.longitude)?;
    let zones = service.nearby(point, query.radius).await?;
    Ok(Json(ApiResponse::ok(zones)))
}

pub async fn update_heat_level(
    State(service): State<Arc<ZoneService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<HeatLevelRequest>,
) -> Result<Json<ApiResponse<Zone>>, DispatchError> {
    let adjustment = HeatAdjustment::try_from(payload)?;
    let zone = service.adjust_heat(id, adjustment).await?;
    Ok(Json(ApiResponse::with_message("Heat level updated", zone)))
}

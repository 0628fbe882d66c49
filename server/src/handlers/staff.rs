use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{AdminUser, AuthenticatedUser, StaffUser, ValidatedJson, ValidatedPath};
use crate::error::DispatchError;
use crate::geo::Coordinate;
use crate::models::{
    ApiResponse, ApplyStaffRequest, SetAvailabilityRequest, StaffProfile, VerifyStaffRequest,
};
use crate::services::DispatchService;

pub async fn apply_for_staff(
    State(service): State<Arc<DispatchService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<ApplyStaffRequest>,
) -> Result<(StatusCode, Json<ApiResponse<StaffProfile>>), DispatchError> {
    let profile = service.apply(&identity, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Application submitted", profile)),
    ))
}

pub async fn get_my_profile(
    State(service): State<Arc<DispatchService>>,
    StaffUser(identity): StaffUser,
) -> Result<Json<ApiResponse<StaffProfile>>, DispatchError> {
    let profile = service.profile_for_user(identity.user_id).await?;
    Ok(Json(ApiResponse::ok(profile)))
}

pub async fn update_location(
    State(service): State<Arc<DispatchService>>,
    StaffUser(identity): StaffUser,
    ValidatedJson(payload): ValidatedJson<SetAvailabilityRequest>,
) -> Result<Json<ApiResponse<StaffProfile>>, DispatchError> {
    let profile = service.profile_for_user(identity.user_id).await?;
    let coordinate = Coordinate::new(payload.latitude, payload.longitude)?;
    let updated = service
        .set_availability(profile.id, coordinate, payload.online)
        .await?;
    Ok(Json(ApiResponse::with_message("Availability updated", updated)))
}

pub async fn verify_staff(
    State(service): State<Arc<DispatchService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<VerifyStaffRequest>,
) -> Result<Json<ApiResponse<StaffProfile>>, DispatchError> {
    let profile = service.verify(id, payload.status).await?;
    Ok(Json(ApiResponse::with_message("Verification updated", profile)))
}

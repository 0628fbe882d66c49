use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{AuthenticatedUser, ValidatedJson, ValidatedPath};
use crate::error::DispatchError;
use crate::models::{ApiResponse, CreateRatingRequest, Rating, StaffAverage, UpdateRatingRequest};
use crate::services::RatingService;

pub async fn create_rating(
    State(service): State<Arc<RatingService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<CreateRatingRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Rating>>), DispatchError> {
    let rating = service.create(&identity, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Rating submitted", rating)),
    ))
}

pub async fn get_rating(
    State(service): State<Arc<RatingService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<Rating>>, DispatchError> {
    let rating = service.get(&identity, id).await?;
    Ok(Json(ApiResponse::ok(rating)))
}

pub async fn get_incident_rating(
    State(service): State<Arc<RatingService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(incident_id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<Rating>>, DispatchError> {
    let rating = service.for_incident(&identity, incident_id).await?;
    Ok(Json(ApiResponse::ok(rating)))
}

pub async fn list_staff_ratings(
    State(service): State<Arc<RatingService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(staff_id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<Rating>>>, DispatchError> {
    let ratings = service.for_staff(&identity, staff_id).await?;
    Ok(Json(ApiResponse::ok(ratings)))
}

pub async fn get_staff_average(
    State(service): State<Arc<RatingService>>,
    AuthenticatedUser(_): AuthenticatedUser,
    ValidatedPath(staff_id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<StaffAverage>>, DispatchError> {
    let average = service.staff_average(staff_id).await?;
    Ok(Json(ApiResponse::ok(average)))
}

pub async fn update_rating(
    State(service): State<Arc<RatingService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateRatingRequest>,
) -> Result<Json<ApiResponse<Rating>>, DispatchError> {
    let rating = service.update(&identity, id, payload.into()).await?;
    Ok(Json(ApiResponse::with_message("Rating updated", rating)))
}

pub async fn delete_rating(
    State(service): State<Arc<RatingService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    service.delete(&identity, id).await?;
    Ok(Json(ApiResponse::with_message("Rating deleted", ())))
}

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::{
    AdminUser, AuthenticatedUser, StaffUser, ValidatedJson, ValidatedPath, ValidatedQuery,
};
use crate::error::DispatchError;
use crate::models::{
    ApiResponse, AssignIncidentRequest, CompleteIncidentRequest, HandlingRecord, Incident,
    IncidentReport, IncidentStatus, ListIncidentsQuery, PaginatedResponse, PaginationParams,
    RecordProgressRequest, ReportIncidentRequest, UpdateIncidentStatusRequest,
};
use crate::services::IncidentService;

pub async fn report_incident(
    State(service): State<Arc<IncidentService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedJson(payload): ValidatedJson<ReportIncidentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<IncidentReport>>), DispatchError> {
    let report = service.report(&identity, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Incident reported", report)),
    ))
}

pub async fn list_incidents(
    State(service): State<Arc<IncidentService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedQuery(query): ValidatedQuery<ListIncidentsQuery>,
) -> Result<Json<ApiResponse<PaginatedResponse<Incident>>>, DispatchError> {
    let pagination = PaginationParams {
        page: query.page,
        size: query.size,
    };
    let page = service.list(&identity, query.status, pagination).await?;
    Ok(Json(ApiResponse::ok(page)))
}

pub async fn get_incident(
    State(service): State<Arc<IncidentService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<Incident>>, DispatchError> {
    let incident = service.get(&identity, id).await?;
    Ok(Json(ApiResponse::ok(incident)))
}

/// Admin dispatches a named staff member
pub async fn assign_incident(
    State(service): State<Arc<IncidentService>>,
    AdminUser(identity): AdminUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<AssignIncidentRequest>,
) -> Result<Json<ApiResponse<Incident>>, DispatchError> {
    let incident = service.assign(&identity, id, payload.staff_id).await?;
    Ok(Json(ApiResponse::with_message("Incident assigned", incident)))
}

/// Staff member takes the incident
pub async fn accept_incident(
    State(service): State<Arc<IncidentService>>,
    StaffUser(identity): StaffUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<Incident>>, DispatchError> {
    let incident = service.accept(&identity, id).await?;
    Ok(Json(ApiResponse::with_message("Incident accepted", incident)))
}

pub async fn record_progress(
    State(service): State<Arc<IncidentService>>,
    StaffUser(identity): StaffUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<RecordProgressRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Incident>>), DispatchError> {
    let incident = service.record_progress(&identity, id, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Progress recorded", incident)),
    ))
}

pub async fn list_records(
    State(service): State<Arc<IncidentService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<Vec<HandlingRecord>>>, DispatchError> {
    let records = service.records(&identity, id).await?;
    Ok(Json(ApiResponse::ok(records)))
}

pub async fn complete_incident(
    State(service): State<Arc<IncidentService>>,
    StaffUser(identity): StaffUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<CompleteIncidentRequest>,
) -> Result<Json<ApiResponse<Incident>>, DispatchError> {
    let incident = service.complete(&identity, id, payload.note).await?;
    Ok(Json(ApiResponse::with_message("Incident completed", incident)))
}

/// Only cancellation is reachable here; other moves have their own routes.
pub async fn update_incident_status(
    State(service): State<Arc<IncidentService>>,
    AuthenticatedUser(identity): AuthenticatedUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
    ValidatedJson(payload): ValidatedJson<UpdateIncidentStatusRequest>,
) -> Result<Json<ApiResponse<Incident>>, DispatchError> {
    if payload.status != IncidentStatus::Cancelled {
        return Err(DispatchError::Validation(format!(
            "status can only be set to cancelled here, got {}",
            payload.status
        )));
    }
    let incident = service.cancel(&identity, id, payload.reason).await?;
    Ok(Json(ApiResponse::with_message("Incident cancelled", incident)))
}

pub async fn delete_incident(
    State(service): State<Arc<IncidentService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(id): ValidatedPath<Uuid>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    service.tombstone(id).await?;
    Ok(Json(ApiResponse::with_message("Incident deleted", ())))
}

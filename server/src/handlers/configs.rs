use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

use super::{AdminUser, AuthenticatedUser, ValidatedJson, ValidatedPath};
use crate::error::DispatchError;
use crate::models::{
    ApiResponse, ConfigValue, CreateConfigRequest, SystemConfig, UpdateConfigRequest,
    UpdateConfigValueRequest,
};
use crate::services::ConfigService;

pub async fn create_config(
    State(service): State<Arc<ConfigService>>,
    AdminUser(_): AdminUser,
    ValidatedJson(payload): ValidatedJson<CreateConfigRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SystemConfig>>), DispatchError> {
    let entry = service.create(payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_message("Config created", entry)),
    ))
}

pub async fn list_configs(
    State(service): State<Arc<ConfigService>>,
    AuthenticatedUser(_): AuthenticatedUser,
) -> Result<Json<ApiResponse<Vec<SystemConfig>>>, DispatchError> {
    let entries = service.list().await?;
    Ok(Json(ApiResponse::ok(entries)))
}

pub async fn get_config(
    State(service): State<Arc<ConfigService>>,
    AuthenticatedUser(_): AuthenticatedUser,
    ValidatedPath(key): ValidatedPath<String>,
) -> Result<Json<ApiResponse<SystemConfig>>, DispatchError> {
    let entry = service.get(&key).await?;
    Ok(Json(ApiResponse::ok(entry)))
}

/// Typed value only, without the entry metadata
pub async fn get_config_value(
    State(service): State<Arc<ConfigService>>,
    AuthenticatedUser(_): AuthenticatedUser,
    ValidatedPath(key): ValidatedPath<String>,
) -> Result<Json<ApiResponse<ConfigValue>>, DispatchError> {
    let value = service.get_value(&key).await?;
    Ok(Json(ApiResponse::ok(value)))
}

pub async fn update_config_value(
    State(service): State<Arc<ConfigService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(key): ValidatedPath<String>,
    ValidatedJson(payload): ValidatedJson<UpdateConfigValueRequest>,
) -> Result<Json<ApiResponse<ConfigValue>>, DispatchError> {
    let value = service.update_value(&key, &payload.value).await?;
    Ok(Json(ApiResponse::with_message("Config value updated", value)))
}

pub async fn update_config(
    State(service): State<Arc<ConfigService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(key): ValidatedPath<String>,
    ValidatedJson(payload): ValidatedJson<UpdateConfigRequest>,
) -> Result<Json<ApiResponse<SystemConfig>>, DispatchError> {
    let entry = service.update(&key, payload).await?;
    Ok(Json(ApiResponse::with_message("Config updated", entry)))
}

pub async fn delete_config(
    State(service): State<Arc<ConfigService>>,
    AdminUser(_): AdminUser,
    ValidatedPath(key): ValidatedPath<String>,
) -> Result<Json<ApiResponse<()>>, DispatchError> {
    service.delete(&key).await?;
    Ok(Json(ApiResponse::with_message("Config deleted", ())))
}

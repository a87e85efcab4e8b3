use axum::extract::{Path, Query, State};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Json, Pagination};
use crate::models::device::{DeviceStore, DeviceWithContainer, DeviceWithRelations};
use crate::validation::device::{
    validate_create, validate_list, validate_update, CreateDeviceBody, DeviceListQuery,
    UpdateDeviceBody,
};
use crate::AppState;

use super::parse_id;

pub async fn list_devices(
    State(state): State<AppState>,
    Query(query): Query<DeviceListQuery>,
) -> ApiResult<Vec<DeviceWithContainer>> {
    let (filter, page) = validate_list(query)?;
    let store = DeviceStore::new(&state.db);
    let (devices, total) = store.find_all(&filter, page).await?;
    Ok(ApiResponse::paginated(devices, Pagination::new(page, total)))
}

pub async fn get_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<DeviceWithRelations> {
    let id = parse_id(&id)?;
    let store = DeviceStore::new(&state.db);
    let device = store
        .find_by_id_with_relations(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Device not found"))?;
    Ok(ApiResponse::success(device))
}

pub async fn create_device(
    State(state): State<AppState>,
    Json(body): Json<CreateDeviceBody>,
) -> ApiResult<DeviceWithContainer> {
    let data = validate_create(body)?;
    let store = DeviceStore::new(&state.db);
    if let Some(serial) = data.serial_number.as_deref() {
        if store.find_by_serial_number(serial).await?.is_some() {
            return Err(ApiError::bad_request(
                "Device already exists with this serial number",
            ));
        }
    }
    let device = store.create(data).await?;
    tracing::info!(device_id = %device.id, "device created");
    let device = reload_with_container(&store, device.id).await?;
    Ok(ApiResponse::created(device))
}

pub async fn update_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateDeviceBody>,
) -> ApiResult<DeviceWithContainer> {
    let id = parse_id(&id)?;
    let patch = validate_update(body)?;
    let store = DeviceStore::new(&state.db);
    store
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Device not found"))?;
    let device = reload_with_container(&store, id).await?;
    Ok(ApiResponse::success(device))
}

pub async fn delete_device(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let store = DeviceStore::new(&state.db);
    if !store.delete(id).await? {
        return Err(ApiError::not_found("Device not found"));
    }
    tracing::info!(device_id = %id, "device deleted");
    Ok(ApiResponse::success(
        json!({ "message": "Device deleted successfully" }),
    ))
}

async fn reload_with_container(
    store: &DeviceStore<'_>,
    id: Uuid,
) -> Result<DeviceWithContainer, ApiError> {
    store
        .find_by_id_with_container(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Device not found"))
}

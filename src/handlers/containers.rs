use axum::extract::{Path, Query, State};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Json, Pagination};
use crate::models::container::{ContainerStore, ContainerWithRelations, ContainerWithSite};
use crate::validation::container::{
    validate_create, validate_list, validate_update, ContainerListQuery, CreateContainerBody,
    UpdateContainerBody,
};
use crate::AppState;

use super::parse_id;

pub async fn list_containers(
    State(state): State<AppState>,
    Query(query): Query<ContainerListQuery>,
) -> ApiResult<Vec<ContainerWithSite>> {
    let (filter, page) = validate_list(query)?;
    let store = ContainerStore::new(&state.db);
    let (containers, total) = store.find_all(&filter, page).await?;
    Ok(ApiResponse::paginated(
        containers,
        Pagination::new(page, total),
    ))
}

pub async fn get_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<ContainerWithRelations> {
    let id = parse_id(&id)?;
    let store = ContainerStore::new(&state.db);
    let container = store
        .find_by_id_with_relations(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Container not found"))?;
    Ok(ApiResponse::success(container))
}

pub async fn create_container(
    State(state): State<AppState>,
    Json(body): Json<CreateContainerBody>,
) -> ApiResult<ContainerWithSite> {
    let data = validate_create(body)?;
    let store = ContainerStore::new(&state.db);
    let container = store.create(data).await?;
    tracing::info!(container_id = %container.id, "container created");
    let container = reload_with_site(&store, container.id).await?;
    Ok(ApiResponse::created(container))
}

pub async fn update_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateContainerBody>,
) -> ApiResult<ContainerWithSite> {
    let id = parse_id(&id)?;
    let patch = validate_update(body)?;
    let store = ContainerStore::new(&state.db);
    store
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Container not found"))?;
    let container = reload_with_site(&store, id).await?;
    Ok(ApiResponse::success(container))
}

pub async fn delete_container(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let store = ContainerStore::new(&state.db);
    if !store.delete(id).await? {
        return Err(ApiError::not_found("Container not found"));
    }
    tracing::info!(container_id = %id, "container deleted");
    Ok(ApiResponse::success(
        json!({ "message": "Container deleted successfully" }),
    ))
}

/// Writes return the joined representation so clients see the parent site
/// without a second request.
async fn reload_with_site(
    store: &ContainerStore<'_>,
    id: Uuid,
) -> Result<ContainerWithSite, ApiError> {
    store
        .find_by_id_with_site(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Container not found"))
}

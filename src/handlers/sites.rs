use axum::extract::{Path, Query, State};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, Json, Pagination};
use crate::models::site::{Site, SiteStore, SiteWithContainers};
use crate::validation::site::{
    validate_create, validate_list, validate_update, CreateSiteBody, SiteListQuery, UpdateSiteBody,
};
use crate::AppState;

use super::parse_id;

pub async fn list_sites(
    State(state): State<AppState>,
    Query(query): Query<SiteListQuery>,
) -> ApiResult<Vec<Site>> {
    let (filter, page) = validate_list(query)?;
    let store = SiteStore::new(&state.db);
    let (sites, total) = store.find_all(&filter, page).await?;
    Ok(ApiResponse::paginated(sites, Pagination::new(page, total)))
}

pub async fn get_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SiteWithContainers> {
    let id = parse_id(&id)?;
    let store = SiteStore::new(&state.db);
    let site = store
        .find_by_id_with_containers(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Site not found"))?;
    Ok(ApiResponse::success(site))
}

pub async fn create_site(
    State(state): State<AppState>,
    Json(body): Json<CreateSiteBody>,
) -> ApiResult<Site> {
    let data = validate_create(body)?;
    let store = SiteStore::new(&state.db);
    let site = store.create(data).await?;
    tracing::info!(site_id = %site.id, "site created");
    Ok(ApiResponse::created(site))
}

pub async fn update_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<UpdateSiteBody>,
) -> ApiResult<Site> {
    let id = parse_id(&id)?;
    let patch = validate_update(body)?;
    let store = SiteStore::new(&state.db);
    let site = store
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("Site not found"))?;
    Ok(ApiResponse::success(site))
}

pub async fn delete_site(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let store = SiteStore::new(&state.db);
    if !store.delete(id).await? {
        return Err(ApiError::not_found("Site not found"));
    }
    tracing::info!(site_id = %id, "site deleted");
    Ok(ApiResponse::success(
        json!({ "message": "Site deleted successfully" }),
    ))
}

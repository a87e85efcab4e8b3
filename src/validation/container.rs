use serde::Deserialize;
use serde_json::Value;

use super::Validator;
use crate::database::query::Page;
use crate::database::update::Patch;
use crate::error::ApiError;
use crate::models::container::{
    ContainerCreate, ContainerFilter, ContainerPatch, ContainerStatus, ContainerType,
};

const TYPE_MESSAGE: &str = "Type must be rack, cabinet, closet, room, or other";
const STATUS_MESSAGE: &str = "Status must be either active or inactive";
const SITE_ID_MESSAGE: &str = "Invalid Site ID format";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateContainerBody {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub container_type: Option<String>,
    pub site_id: Option<String>,
    pub location: Option<String>,
    pub capacity: Option<Value>,
    pub status: Option<String>,
}

pub fn validate_create(body: CreateContainerBody) -> Result<ContainerCreate, ApiError> {
    let mut v = Validator::new();

    let name = v.required_text("name", "Container name", body.name, 100);
    let container_type = match body.container_type {
        None => {
            v.push("type", "Container type is required");
            None
        }
        some => v.parse_enum::<ContainerType>("type", some, TYPE_MESSAGE),
    };
    let site_id = match body.site_id {
        None => {
            v.push("siteId", "Site ID is required");
            None
        }
        some => v.parse_uuid("siteId", some, SITE_ID_MESSAGE),
    };
    let location = v.optional_text("location", "Location", body.location, 200);
    // capacity defaults to 0 when omitted
    let capacity = v
        .non_negative_int("capacity", "Capacity", body.capacity)
        .unwrap_or(0);
    let status = v
        .parse_enum::<ContainerStatus>("status", body.status, STATUS_MESSAGE)
        .unwrap_or(ContainerStatus::Active);

    v.finish()?;
    Ok(ContainerCreate {
        name: name.unwrap_or_default(),
        container_type: container_type.unwrap_or(ContainerType::Other),
        site_id: site_id.unwrap_or_default(),
        location,
        capacity,
        status,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateContainerBody {
    pub name: Patch<String>,
    #[serde(rename = "type")]
    pub container_type: Patch<String>,
    pub site_id: Patch<String>,
    pub location: Patch<String>,
    pub capacity: Patch<Value>,
    pub status: Patch<String>,
}

pub fn validate_update(body: UpdateContainerBody) -> Result<ContainerPatch, ApiError> {
    let mut v = Validator::new();

    let name = v.required_text_patch("name", "Container name", body.name, 100);
    let container_type = v.parse_enum_patch::<ContainerType>("type", body.container_type, TYPE_MESSAGE);
    let site_id = v.parse_uuid_patch("siteId", body.site_id, SITE_ID_MESSAGE);
    let location = v.optional_text_patch("location", "Location", body.location, 200);
    let capacity = match body.capacity {
        Patch::Missing => None,
        Patch::Null => {
            v.push("capacity", "Capacity must be a non-negative integer");
            None
        }
        Patch::Value(value) => v.non_negative_int("capacity", "Capacity", Some(value)),
    };
    let status = v.parse_enum_patch::<ContainerStatus>("status", body.status, STATUS_MESSAGE);

    v.finish()?;
    Ok(ContainerPatch {
        name,
        container_type,
        site_id,
        location,
        capacity,
        status,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ContainerListQuery {
    pub site_id: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub fn validate_list(query: ContainerListQuery) -> Result<(ContainerFilter, Page), ApiError> {
    let mut v = Validator::new();

    let site_id = v.parse_uuid("siteId", query.site_id, SITE_ID_MESSAGE);
    let status = v.parse_enum::<ContainerStatus>("status", query.status, STATUS_MESSAGE);
    let page = v.page_params(query.page, query.limit);

    v.finish()?;
    Ok((ContainerFilter { site_id, status }, page))
}

use serde::Deserialize;

use super::Validator;
use crate::database::query::Page;
use crate::database::update::Patch;
use crate::error::ApiError;
use crate::models::site::{SiteCreate, SiteFilter, SitePatch, SiteStatus};

const STATUS_MESSAGE: &str = "Status must be either active or inactive";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateSiteBody {
    pub name: Option<String>,
    pub location: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub status: Option<String>,
}

pub fn validate_create(body: CreateSiteBody) -> Result<SiteCreate, ApiError> {
    let mut v = Validator::new();

    let name = v.required_text("name", "Site name", body.name, 100);
    let location = v.required_text("location", "Location", body.location, 200);
    let address = v.optional_text("address", "Address", body.address, 300);
    let description = v.optional_text("description", "Description", body.description, 500);
    let status = v
        .parse_enum::<SiteStatus>("status", body.status, STATUS_MESSAGE)
        .unwrap_or(SiteStatus::Active);

    v.finish()?;
    Ok(SiteCreate {
        name: name.unwrap_or_default(),
        location: location.unwrap_or_default(),
        address,
        description,
        status,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateSiteBody {
    pub name: Patch<String>,
    pub location: Patch<String>,
    pub address: Patch<String>,
    pub description: Patch<String>,
    pub status: Patch<String>,
}

pub fn validate_update(body: UpdateSiteBody) -> Result<SitePatch, ApiError> {
    let mut v = Validator::new();

    let name = v.required_text_patch("name", "Site name", body.name, 100);
    let location = v.required_text_patch("location", "Location", body.location, 200);
    let address = v.optional_text_patch("address", "Address", body.address, 300);
    let description = v.optional_text_patch("description", "Description", body.description, 500);
    let status = v.parse_enum_patch::<SiteStatus>("status", body.status, STATUS_MESSAGE);

    v.finish()?;
    Ok(SitePatch {
        name,
        location,
        address,
        description,
        status,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SiteListQuery {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub fn validate_list(query: SiteListQuery) -> Result<(SiteFilter, Page), ApiError> {
    let mut v = Validator::new();

    let search = query
        .search
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    let status = v.parse_enum::<SiteStatus>("status", query.status, STATUS_MESSAGE);
    let page = v.page_params(query.page, query.limit);

    v.finish()?;
    Ok((SiteFilter { search, status }, page))
}

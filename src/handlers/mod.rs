pub mod auth;
pub mod containers;
pub mod devices;
pub mod sites;

use uuid::Uuid;

use crate::error::ApiError;

/// Path ids are rejected before any query runs; the store-level 22P02
/// classification only covers ids smuggled in through payloads.
pub(crate) fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::bad_request("Invalid ID format"))
}

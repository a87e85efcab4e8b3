use serde::Deserialize;

use super::Validator;
use crate::database::query::Page;
use crate::database::update::Patch;
use crate::error::ApiError;
use crate::models::device::{DeviceCreate, DeviceFilter, DevicePatch, DeviceStatus, DeviceType};

const TYPE_MESSAGE: &str = "Type must be switch, router, firewall, server, access-point, or other";
const STATUS_MESSAGE: &str = "Status must be active, inactive, or maintenance";
const CONTAINER_ID_MESSAGE: &str = "Invalid Container ID format";

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateDeviceBody {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub container_id: Option<String>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

pub fn validate_create(body: CreateDeviceBody) -> Result<DeviceCreate, ApiError> {
    let mut v = Validator::new();

    let name = v.required_text("name", "Device name", body.name, 100);
    let device_type = match body.device_type {
        None => {
            v.push("type", "Device type is required");
            None
        }
        some => v.parse_enum::<DeviceType>("type", some, TYPE_MESSAGE),
    };
    let manufacturer = v.optional_text("manufacturer", "Manufacturer name", body.manufacturer, 100);
    let model = v.optional_text("model", "Model name", body.model, 100);
    let serial_number = v.optional_text("serialNumber", "Serial number", body.serial_number, 100);
    let ip_address = v.ipv4("ipAddress", body.ip_address);
    let mac_address = v.mac("macAddress", body.mac_address);
    let container_id = match body.container_id {
        None => {
            v.push("containerId", "Container ID is required");
            None
        }
        some => v.parse_uuid("containerId", some, CONTAINER_ID_MESSAGE),
    };
    let status = v
        .parse_enum::<DeviceStatus>("status", body.status, STATUS_MESSAGE)
        .unwrap_or(DeviceStatus::Active);
    let notes = v.optional_text("notes", "Notes", body.notes, 1000);

    v.finish()?;
    Ok(DeviceCreate {
        name: name.unwrap_or_default(),
        device_type: device_type.unwrap_or(DeviceType::Other),
        manufacturer,
        model,
        serial_number,
        ip_address,
        mac_address,
        container_id: container_id.unwrap_or_default(),
        status,
        notes,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateDeviceBody {
    pub name: Patch<String>,
    #[serde(rename = "type")]
    pub device_type: Patch<String>,
    pub manufacturer: Patch<String>,
    pub model: Patch<String>,
    pub serial_number: Patch<String>,
    pub ip_address: Patch<String>,
    pub mac_address: Patch<String>,
    pub container_id: Patch<String>,
    pub status: Patch<String>,
    pub notes: Patch<String>,
}

pub fn validate_update(body: UpdateDeviceBody) -> Result<DevicePatch, ApiError> {
    let mut v = Validator::new();

    let name = v.required_text_patch("name", "Device name", body.name, 100);
    let device_type = v.parse_enum_patch::<DeviceType>("type", body.device_type, TYPE_MESSAGE);
    let manufacturer =
        v.optional_text_patch("manufacturer", "Manufacturer name", body.manufacturer, 100);
    let model = v.optional_text_patch("model", "Model name", body.model, 100);
    let serial_number =
        v.optional_text_patch("serialNumber", "Serial number", body.serial_number, 100);
    let ip_address = v.ipv4_patch("ipAddress", body.ip_address);
    let mac_address = v.mac_patch("macAddress", body.mac_address);
    let container_id = v.parse_uuid_patch("containerId", body.container_id, CONTAINER_ID_MESSAGE);
    let status = v.parse_enum_patch::<DeviceStatus>("status", body.status, STATUS_MESSAGE);
    let notes = v.optional_text_patch("notes", "Notes", body.notes, 1000);

    v.finish()?;
    Ok(DevicePatch {
        name,
        device_type,
        manufacturer,
        model,
        serial_number,
        ip_address,
        mac_address,
        container_id,
        status,
        notes,
    })
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct DeviceListQuery {
    pub container_id: Option<String>,
    #[serde(rename = "type")]
    pub device_type: Option<String>,
    pub status: Option<String>,
    pub page: Option<String>,
    pub limit: Option<String>,
}

pub fn validate_list(query: DeviceListQuery) -> Result<(DeviceFilter, Page), ApiError> {
    let mut v = Validator::new();

    let container_id = v.parse_uuid("containerId", query.container_id, CONTAINER_ID_MESSAGE);
    let device_type = v.parse_enum::<DeviceType>("type", query.device_type, TYPE_MESSAGE);
    let status = v.parse_enum::<DeviceStatus>("status", query.status, STATUS_MESSAGE);
    let page = v.page_params(query.page, query.limit);

    v.finish()?;
    Ok((
        DeviceFilter {
            container_id,
            device_type,
            status,
        },
        page,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn minimal_create() -> CreateDeviceBody {
        CreateDeviceBody {
            name: Some("core-sw-01".to_string()),
            device_type: Some("switch".to_string()),
            container_id: Some(Uuid::new_v4().to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn create_accepts_minimal_device() {
        let data = validate_create(minimal_create()).unwrap();
        assert_eq!(data.device_type, DeviceType::Switch);
        assert_eq!(data.status, DeviceStatus::Active);
        assert!(data.ip_address.is_none());
    }

    #[test]
    fn rejects_out_of_range_ip_naming_the_field() {
        let err = validate_create(CreateDeviceBody {
            ip_address: Some("999.1.1.1".to_string()),
            ..minimal_create()
        })
        .unwrap_err();
        match err {
            ApiError::Validation { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "ipAddress");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn accepts_access_point_type() {
        let data = validate_create(CreateDeviceBody {
            device_type: Some("access-point".to_string()),
            ..minimal_create()
        })
        .unwrap();
        assert_eq!(data.device_type, DeviceType::AccessPoint);
    }

    #[test]
    fn update_null_clears_nullable_fields_only() {
        let body: UpdateDeviceBody = serde_json::from_str(
            r#"{"notes": null, "macAddress": null, "containerId": null}"#,
        )
        .unwrap();
        let err = validate_update(body).unwrap_err();
        match err {
            ApiError::Validation { errors } => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].field, "containerId");
            }
            other => panic!("expected validation error, got {:?}", other),
        }

        let body: UpdateDeviceBody =
            serde_json::from_str(r#"{"notes": null, "macAddress": null}"#).unwrap();
        let patch = validate_update(body).unwrap();
        assert_eq!(patch.notes, Patch::Null);
        assert_eq!(patch.mac_address, Patch::Null);
        assert!(patch.name.is_none());
    }

    #[test]
    fn list_validates_filters() {
        let err = validate_list(DeviceListQuery {
            container_id: Some("abc".to_string()),
            device_type: Some("toaster".to_string()),
            ..Default::default()
        })
        .unwrap_err();
        match err {
            ApiError::Validation { errors } => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}

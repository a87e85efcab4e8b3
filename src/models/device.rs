use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::container::{ContainerSummary, ContainerType};
use super::site::SiteSummary;
use super::str_enum;
use crate::database::query::{Page, WhereBuilder};
use crate::database::update::{Patch, UpdateBuilder};
use crate::database::{bind_param, bind_param_as, Database};

str_enum!(DeviceType, "device type" {
    Switch => "switch",
    Router => "router",
    Firewall => "firewall",
    Server => "server",
    AccessPoint => "access-point",
    Other => "other",
});

str_enum!(DeviceStatus, "device status" {
    Active => "active",
    Inactive => "inactive",
    Maintenance => "maintenance",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub device_type: DeviceType,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub container_id: Uuid,
    #[sqlx(try_from = "String")]
    pub status: DeviceStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Device denormalized with its parent container summary (list rows and
/// post-write reads).
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceWithContainer {
    #[serde(flatten)]
    pub device: Device,
    pub container: Option<ContainerSummary>,
}

impl FromRow<'_, PgRow> for DeviceWithContainer {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let device = Device::from_row(row)?;
        let container = match row.try_get::<Option<Uuid>, _>("container_ref_id")? {
            Some(id) => Some(ContainerSummary {
                id,
                name: row.try_get("container_ref_name")?,
                container_type: decode_container_type(row, "container_ref_type")?,
                location: row.try_get("container_ref_location")?,
            }),
            None => None,
        };
        Ok(Self { device, container })
    }
}

/// Parent container carrying its own parent site, for single-device reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerWithSiteRef {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub location: Option<String>,
    pub site: Option<SiteSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceWithRelations {
    #[serde(flatten)]
    pub device: Device,
    pub container: Option<ContainerWithSiteRef>,
}

impl FromRow<'_, PgRow> for DeviceWithRelations {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let device = Device::from_row(row)?;
        let container = match row.try_get::<Option<Uuid>, _>("container_ref_id")? {
            Some(id) => {
                let site = match row.try_get::<Option<Uuid>, _>("site_ref_id")? {
                    Some(site_id) => Some(SiteSummary {
                        id: site_id,
                        name: row.try_get("site_ref_name")?,
                        location: row.try_get("site_ref_location")?,
                    }),
                    None => None,
                };
                Some(ContainerWithSiteRef {
                    id,
                    name: row.try_get("container_ref_name")?,
                    container_type: decode_container_type(row, "container_ref_type")?,
                    location: row.try_get("container_ref_location")?,
                    site,
                })
            }
            None => None,
        };
        Ok(Self { device, container })
    }
}

fn decode_container_type(row: &PgRow, column: &str) -> Result<ContainerType, sqlx::Error> {
    let raw: String = row.try_get(column)?;
    ContainerType::try_from(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

#[derive(Debug)]
pub struct DeviceCreate {
    pub name: String,
    pub device_type: DeviceType,
    pub manufacturer: Option<String>,
    pub model: Option<String>,
    pub serial_number: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
    pub container_id: Uuid,
    pub status: DeviceStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Default)]
pub struct DevicePatch {
    pub name: Option<String>,
    pub device_type: Option<DeviceType>,
    pub manufacturer: Patch<String>,
    pub model: Patch<String>,
    pub serial_number: Patch<String>,
    pub ip_address: Patch<String>,
    pub mac_address: Patch<String>,
    pub container_id: Option<Uuid>,
    pub status: Option<DeviceStatus>,
    pub notes: Patch<String>,
}

#[derive(Debug, Default)]
pub struct DeviceFilter {
    pub container_id: Option<Uuid>,
    pub device_type: Option<DeviceType>,
    pub status: Option<DeviceStatus>,
}

/// MAC addresses are stored case-normalized to uppercase.
pub fn normalize_mac(mac: &str) -> String {
    mac.to_ascii_uppercase()
}

const COLUMNS: &str = "id, name, type, manufacturer, model, serial_number, ip_address, \
     mac_address, container_id, status, notes, created_at, updated_at";

const JOINED_COLUMNS: &str = "d.id, d.name, d.type, d.manufacturer, d.model, d.serial_number, \
     d.ip_address, d.mac_address, d.container_id, d.status, d.notes, d.created_at, d.updated_at, \
     c.id AS container_ref_id, c.name AS container_ref_name, c.type AS container_ref_type, \
     c.location AS container_ref_location";

pub struct DeviceStore<'a> {
    db: &'a Database,
}

impl<'a> DeviceStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Device>, sqlx::Error> {
        sqlx::query_as::<_, Device>(&format!("SELECT {} FROM devices WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
    }

    pub async fn find_by_id_with_container(
        &self,
        id: Uuid,
    ) -> Result<Option<DeviceWithContainer>, sqlx::Error> {
        sqlx::query_as::<_, DeviceWithContainer>(&format!(
            "SELECT {} FROM devices d \
             LEFT JOIN containers c ON d.container_id = c.id WHERE d.id = $1",
            JOINED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
    }

    /// Device joined with its container and that container's site.
    pub async fn find_by_id_with_relations(
        &self,
        id: Uuid,
    ) -> Result<Option<DeviceWithRelations>, sqlx::Error> {
        sqlx::query_as::<_, DeviceWithRelations>(&format!(
            "SELECT {}, s.id AS site_ref_id, s.name AS site_ref_name, \
             s.location AS site_ref_location \
             FROM devices d \
             LEFT JOIN containers c ON d.container_id = c.id \
             LEFT JOIN sites s ON c.site_id = s.id \
             WHERE d.id = $1",
            JOINED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
    }

    pub async fn find_by_serial_number(
        &self,
        serial_number: &str,
    ) -> Result<Option<Device>, sqlx::Error> {
        sqlx::query_as::<_, Device>(&format!(
            "SELECT {} FROM devices WHERE serial_number = $1",
            COLUMNS
        ))
        .bind(serial_number)
        .fetch_optional(self.db.pool())
        .await
    }

    /// Children of one container, for the container-with-relations read.
    pub async fn find_by_container(&self, container_id: Uuid) -> Result<Vec<Device>, sqlx::Error> {
        sqlx::query_as::<_, Device>(&format!(
            "SELECT {} FROM devices WHERE container_id = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(container_id)
        .fetch_all(self.db.pool())
        .await
    }

    pub async fn find_all(
        &self,
        filter: &DeviceFilter,
        page: Page,
    ) -> Result<(Vec<DeviceWithContainer>, i64), sqlx::Error> {
        let mut where_builder = WhereBuilder::new();
        if let Some(container_id) = filter.container_id {
            where_builder.eq("d.container_id", container_id);
        }
        if let Some(device_type) = filter.device_type {
            where_builder.eq("d.type", device_type);
        }
        if let Some(status) = filter.status {
            where_builder.eq("d.status", status);
        }

        let page_sql = format!(
            "SELECT {} FROM devices d LEFT JOIN containers c ON d.container_id = c.id{} \
             ORDER BY d.created_at DESC{}",
            JOINED_COLUMNS,
            where_builder.clause(),
            page.limit_offset_sql(where_builder.next_index()),
        );
        let count_sql = format!("SELECT COUNT(*) FROM devices d{}", where_builder.clause());

        let mut page_query = sqlx::query_as::<_, DeviceWithContainer>(&page_sql);
        let mut count_query = sqlx::query(&count_sql);
        for p in where_builder.params() {
            page_query = bind_param_as(page_query, p);
            count_query = bind_param(count_query, p);
        }
        page_query = page_query.bind(page.limit).bind(page.offset());

        let (devices, count_row) = tokio::try_join!(
            page_query.fetch_all(self.db.pool()),
            count_query.fetch_one(self.db.pool()),
        )?;

        let total: i64 = count_row.try_get(0)?;
        Ok((devices, total))
    }

    pub async fn create(&self, data: DeviceCreate) -> Result<Device, sqlx::Error> {
        sqlx::query_as::<_, Device>(&format!(
            "INSERT INTO devices (name, type, manufacturer, model, serial_number, \
             ip_address, mac_address, container_id, status, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) RETURNING {}",
            COLUMNS
        ))
        .bind(&data.name)
        .bind(data.device_type.as_str())
        .bind(&data.manufacturer)
        .bind(&data.model)
        .bind(&data.serial_number)
        .bind(&data.ip_address)
        .bind(data.mac_address.as_deref().map(normalize_mac))
        .bind(data.container_id)
        .bind(data.status.as_str())
        .bind(&data.notes)
        .fetch_one(self.db.pool())
        .await
    }

    pub async fn update(&self, id: Uuid, patch: DevicePatch) -> Result<Option<Device>, sqlx::Error> {
        let mut builder = UpdateBuilder::new("devices");
        builder
            .set_opt("name", patch.name)
            .set_opt("type", patch.device_type)
            .set_patch("manufacturer", patch.manufacturer)
            .set_patch("model", patch.model)
            .set_patch("serial_number", patch.serial_number)
            .set_patch("ip_address", patch.ip_address)
            .set_patch("mac_address", patch.mac_address.map(|m| normalize_mac(&m)))
            .set_opt("container_id", patch.container_id)
            .set_opt("status", patch.status)
            .set_patch("notes", patch.notes);

        // Empty payload is a read, not a write
        if builder.is_empty() {
            return self.find_by_id(id).await;
        }

        let (sql, params) = builder.build(id, COLUMNS);
        let mut query = sqlx::query_as::<_, Device>(&sql);
        for p in params.iter() {
            query = bind_param_as(query, p);
        }
        query.fetch_optional(self.db.pool()).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM devices WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mac_normalization_is_uppercase_and_idempotent() {
        assert_eq!(normalize_mac("aa:bb:cc:dd:ee:ff"), "AA:BB:CC:DD:EE:FF");
        assert_eq!(normalize_mac("AA:BB:CC:DD:EE:FF"), "AA:BB:CC:DD:EE:FF");
        assert_eq!(
            normalize_mac(&normalize_mac("aa-bb-cc-dd-ee-0f")),
            "AA-BB-CC-DD-EE-0F"
        );
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Row};
use uuid::Uuid;

use super::device::Device;
use super::site::SiteSummary;
use super::str_enum;
use crate::database::query::{Page, WhereBuilder};
use crate::database::update::{Patch, UpdateBuilder};
use crate::database::{bind_param, bind_param_as, Database, SqlParam};

str_enum!(ContainerType, "container type" {
    Rack => "rack",
    Cabinet => "cabinet",
    Closet => "closet",
    Room => "room",
    Other => "other",
});

str_enum!(ContainerStatus, "container status" {
    Active => "active",
    Inactive => "inactive",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Container {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type", try_from = "String")]
    pub container_type: ContainerType,
    pub site_id: Uuid,
    pub location: Option<String>,
    pub capacity: i32,
    #[sqlx(try_from = "String")]
    pub status: ContainerStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parent reference embedded in device reads.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerSummary {
    pub id: Uuid,
    pub name: String,
    #[serde(rename = "type")]
    pub container_type: ContainerType,
    pub location: Option<String>,
}

/// Container denormalized with its parent site summary.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerWithSite {
    #[serde(flatten)]
    pub container: Container,
    pub site: Option<SiteSummary>,
}

impl FromRow<'_, PgRow> for ContainerWithSite {
    fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let container = Container::from_row(row)?;
        let site = match row.try_get::<Option<Uuid>, _>("site_ref_id")? {
            Some(id) => Some(SiteSummary {
                id,
                name: row.try_get("site_ref_name")?,
                location: row.try_get("site_ref_location")?,
            }),
            None => None,
        };
        Ok(Self { container, site })
    }
}

/// Container with parent site and child devices, for single-record reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerWithRelations {
    #[serde(flatten)]
    pub container: Container,
    pub site: Option<SiteSummary>,
    pub devices: Vec<Device>,
}

#[derive(Debug)]
pub struct ContainerCreate {
    pub name: String,
    pub container_type: ContainerType,
    pub site_id: Uuid,
    pub location: Option<String>,
    pub capacity: i32,
    pub status: ContainerStatus,
}

#[derive(Debug, Default)]
pub struct ContainerPatch {
    pub name: Option<String>,
    pub container_type: Option<ContainerType>,
    pub site_id: Option<Uuid>,
    pub location: Patch<String>,
    pub capacity: Option<i32>,
    pub status: Option<ContainerStatus>,
}

#[derive(Debug, Default)]
pub struct ContainerFilter {
    pub site_id: Option<Uuid>,
    pub status: Option<ContainerStatus>,
}

const COLUMNS: &str =
    "id, name, type, site_id, location, capacity, status, created_at, updated_at";

// Aliased c.* plus the parent site summary
const JOINED_COLUMNS: &str = "c.id, c.name, c.type, c.site_id, c.location, c.capacity, \
     c.status, c.created_at, c.updated_at, \
     s.id AS site_ref_id, s.name AS site_ref_name, s.location AS site_ref_location";

pub struct ContainerStore<'a> {
    db: &'a Database,
}

impl<'a> ContainerStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Container>, sqlx::Error> {
        sqlx::query_as::<_, Container>(&format!(
            "SELECT {} FROM containers WHERE id = $1",
            COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
    }

    pub async fn find_by_id_with_site(
        &self,
        id: Uuid,
    ) -> Result<Option<ContainerWithSite>, sqlx::Error> {
        sqlx::query_as::<_, ContainerWithSite>(&format!(
            "SELECT {} FROM containers c \
             LEFT JOIN sites s ON c.site_id = s.id WHERE c.id = $1",
            JOINED_COLUMNS
        ))
        .bind(id)
        .fetch_optional(self.db.pool())
        .await
    }

    pub async fn find_by_id_with_relations(
        &self,
        id: Uuid,
    ) -> Result<Option<ContainerWithRelations>, sqlx::Error> {
        let Some(with_site) = self.find_by_id_with_site(id).await? else {
            return Ok(None);
        };

        let devices = super::device::DeviceStore::new(self.db)
            .find_by_container(id)
            .await?;

        Ok(Some(ContainerWithRelations {
            container: with_site.container,
            site: with_site.site,
            devices,
        }))
    }

    /// Children of one site, for the site-with-containers read.
    pub async fn find_by_site(&self, site_id: Uuid) -> Result<Vec<Container>, sqlx::Error> {
        sqlx::query_as::<_, Container>(&format!(
            "SELECT {} FROM containers WHERE site_id = $1 ORDER BY created_at DESC",
            COLUMNS
        ))
        .bind(site_id)
        .fetch_all(self.db.pool())
        .await
    }

    pub async fn find_all(
        &self,
        filter: &ContainerFilter,
        page: Page,
    ) -> Result<(Vec<ContainerWithSite>, i64), sqlx::Error> {
        let mut where_builder = WhereBuilder::new();
        if let Some(site_id) = filter.site_id {
            where_builder.eq("c.site_id", site_id);
        }
        if let Some(status) = filter.status {
            where_builder.eq("c.status", status);
        }

        let page_sql = format!(
            "SELECT {} FROM containers c LEFT JOIN sites s ON c.site_id = s.id{} \
             ORDER BY c.created_at DESC{}",
            JOINED_COLUMNS,
            where_builder.clause(),
            page.limit_offset_sql(where_builder.next_index()),
        );
        let count_sql = format!("SELECT COUNT(*) FROM containers c{}", where_builder.clause());

        let mut page_query = sqlx::query_as::<_, ContainerWithSite>(&page_sql);
        let mut count_query = sqlx::query(&count_sql);
        for p in where_builder.params() {
            page_query = bind_param_as(page_query, p);
            count_query = bind_param(count_query, p);
        }
        page_query = page_query.bind(page.limit).bind(page.offset());

        let (containers, count_row) = tokio::try_join!(
            page_query.fetch_all(self.db.pool()),
            count_query.fetch_one(self.db.pool()),
        )?;

        let total: i64 = count_row.try_get(0)?;
        Ok((containers, total))
    }

    pub async fn create(&self, data: ContainerCreate) -> Result<Container, sqlx::Error> {
        sqlx::query_as::<_, Container>(&format!(
            "INSERT INTO containers (name, type, site_id, location, capacity, status) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            COLUMNS
        ))
        .bind(&data.name)
        .bind(data.container_type.as_str())
        .bind(data.site_id)
        .bind(&data.location)
        .bind(data.capacity)
        .bind(data.status.as_str())
        .fetch_one(self.db.pool())
        .await
    }

    pub async fn update(
        &self,
        id: Uuid,
        patch: ContainerPatch,
    ) -> Result<Option<Container>, sqlx::Error> {
        let mut builder = UpdateBuilder::new("containers");
        builder
            .set_opt("name", patch.name)
            .set_opt("type", patch.container_type)
            .set_opt("site_id", patch.site_id)
            .set_patch("location", patch.location)
            .set_opt("capacity", patch.capacity.map(|c| SqlParam::Int(c as i64)))
            .set_opt("status", patch.status);

        // Empty payload is a read, not a write
        if builder.is_empty() {
            return self.find_by_id(id).await;
        }

        let (sql, params) = builder.build(id, COLUMNS);
        let mut query = sqlx::query_as::<_, Container>(&sql);
        for p in params.iter() {
            query = bind_param_as(query, p);
        }
        query.fetch_optional(self.db.pool()).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM containers WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

use super::container::Container;
use super::str_enum;
use crate::database::query::{Page, WhereBuilder};
use crate::database::update::{Patch, UpdateBuilder};
use crate::database::{bind_param, bind_param_as, Database};

str_enum!(SiteStatus, "site status" {
    Active => "active",
    Inactive => "inactive",
});

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: Uuid,
    pub name: String,
    pub location: String,
    pub address: Option<String>,
    pub description: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: SiteStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Parent reference embedded in container and device reads.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SiteSummary {
    pub id: Uuid,
    pub name: String,
    pub location: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteWithContainers {
    #[serde(flatten)]
    pub site: Site,
    pub containers: Vec<Container>,
}

#[derive(Debug)]
pub struct SiteCreate {
    pub name: String,
    pub location: String,
    pub address: Option<String>,
    pub description: Option<String>,
    pub status: SiteStatus,
}

#[derive(Debug, Default)]
pub struct SitePatch {
    pub name: Option<String>,
    pub location: Option<String>,
    pub address: Patch<String>,
    pub description: Patch<String>,
    pub status: Option<SiteStatus>,
}

/// Equality filters for site listings; `search` is a case-insensitive
/// substring match across name and location.
#[derive(Debug, Default)]
pub struct SiteFilter {
    pub search: Option<String>,
    pub status: Option<SiteStatus>,
}

const COLUMNS: &str = "id, name, location, address, description, status, created_at, updated_at";

pub struct SiteStore<'a> {
    db: &'a Database,
}

impl<'a> SiteStore<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Site>, sqlx::Error> {
        sqlx::query_as::<_, Site>(&format!("SELECT {} FROM sites WHERE id = $1", COLUMNS))
            .bind(id)
            .fetch_optional(self.db.pool())
            .await
    }

    /// Site joined with its child containers.
    pub async fn find_by_id_with_containers(
        &self,
        id: Uuid,
    ) -> Result<Option<SiteWithContainers>, sqlx::Error> {
        let Some(site) = self.find_by_id(id).await? else {
            return Ok(None);
        };

        let containers = super::container::ContainerStore::new(self.db)
            .find_by_site(id)
            .await?;

        Ok(Some(SiteWithContainers { site, containers }))
    }

    pub async fn find_all(
        &self,
        filter: &SiteFilter,
        page: Page,
    ) -> Result<(Vec<Site>, i64), sqlx::Error> {
        let mut where_builder = WhereBuilder::new();
        if let Some(search) = filter.search.as_deref() {
            where_builder.search(&["name", "location"], search);
        }
        if let Some(status) = filter.status {
            where_builder.eq("status", status);
        }

        let page_sql = format!(
            "SELECT {} FROM sites{} ORDER BY created_at DESC{}",
            COLUMNS,
            where_builder.clause(),
            page.limit_offset_sql(where_builder.next_index()),
        );
        let count_sql = format!("SELECT COUNT(*) FROM sites{}", where_builder.clause());

        let mut page_query = sqlx::query_as::<_, Site>(&page_sql);
        let mut count_query = sqlx::query(&count_sql);
        for p in where_builder.params() {
            page_query = bind_param_as(page_query, p);
            count_query = bind_param(count_query, p);
        }
        page_query = page_query.bind(page.limit).bind(page.offset());

        // Independent reads; run them concurrently
        let (sites, count_row) = tokio::try_join!(
            page_query.fetch_all(self.db.pool()),
            count_query.fetch_one(self.db.pool()),
        )?;

        use sqlx::Row;
        let total: i64 = count_row.try_get(0)?;
        Ok((sites, total))
    }

    pub async fn create(&self, data: SiteCreate) -> Result<Site, sqlx::Error> {
        sqlx::query_as::<_, Site>(&format!(
            "INSERT INTO sites (name, location, address, description, status) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {}",
            COLUMNS
        ))
        .bind(&data.name)
        .bind(&data.location)
        .bind(&data.address)
        .bind(&data.description)
        .bind(data.status.as_str())
        .fetch_one(self.db.pool())
        .await
    }

    pub async fn update(&self, id: Uuid, patch: SitePatch) -> Result<Option<Site>, sqlx::Error> {
        let mut builder = UpdateBuilder::new("sites");
        builder
            .set_opt("name", patch.name)
            .set_opt("location", patch.location)
            .set_patch("address", patch.address)
            .set_patch("description", patch.description)
            .set_opt("status", patch.status);

        // Empty payload is a read, not a write
        if builder.is_empty() {
            return self.find_by_id(id).await;
        }

        let (sql, params) = builder.build(id, COLUMNS);
        let mut query = sqlx::query_as::<_, Site>(&sql);
        for p in params.iter() {
            query = bind_param_as(query, p);
        }
        query.fetch_optional(self.db.pool()).await
    }

    pub async fn delete(&self, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sites WHERE id = $1")
            .bind(id)
            .execute(self.db.pool())
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

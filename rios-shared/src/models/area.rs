/// Area (department) model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE areas (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     active BOOLEAN NOT NULL DEFAULT TRUE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::entity::{require_fields, Entity, EntityKind, ModelError};
use super::patch::{Patch, UpdateSet};

/// Area record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Area {
    pub id: Uuid,
    pub name: String,

    /// Active flag
    #[serde(rename = "state")]
    pub active: bool,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an area
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateArea {
    pub name: Option<String>,

    /// Set by the request edge, defaults to true
    #[serde(skip)]
    pub active: Option<bool>,
}

/// Partial update of an area
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AreaPatch {
    #[serde(default)]
    pub name: Patch<String>,

    /// Set by the request edge
    #[serde(skip)]
    pub active: Patch<bool>,
}

impl Entity for Area {
    const KIND: EntityKind = EntityKind::Area;
    type Create = CreateArea;
    type Patch = AreaPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(input: CreateArea, id: Uuid, now: DateTime<Utc>) -> Result<Self, ModelError> {
        require_fields(&[("name", &input.name)])?;

        Ok(Self {
            id,
            name: input.name.unwrap_or_default().trim().to_string(),
            active: input.active.unwrap_or(true),
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, patch: AreaPatch) -> Result<UpdateSet, ModelError> {
        let mut changes = UpdateSet::new();
        changes.apply("name", patch.name.map(|n| n.trim().to_string()), &mut self.name);
        changes.apply("active", patch.active, &mut self.active);
        Ok(changes)
    }

    fn validate(&self) -> Result<(), ModelError> {
        require_fields(&[("name", &Some(self.name.clone()))])
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

const AREA_COLUMNS: &str = "id, name, active, created_at, updated_at";

impl Area {
    /// Inserts a fully built area row
    pub async fn insert(pool: &PgPool, area: &Area) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Area>(&format!(
            "INSERT INTO areas ({AREA_COLUMNS}) VALUES ($1, $2, $3, $4, $5) RETURNING {AREA_COLUMNS}"
        ))
        .bind(area.id)
        .bind(&area.name)
        .bind(area.active)
        .bind(area.created_at)
        .bind(area.updated_at)
        .fetch_one(pool)
        .await
    }

    /// Finds an area by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Area>(&format!("SELECT {AREA_COLUMNS} FROM areas WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists all areas, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Area>(&format!(
            "SELECT {AREA_COLUMNS} FROM areas ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Writes the supplied columns of a merged row
    pub async fn update_columns(
        pool: &PgPool,
        area: &Area,
        changes: &UpdateSet,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE areas SET updated_at = ");
        query.push_bind(area.updated_at);

        for column in changes.columns() {
            query.push(", ").push(*column).push(" = ");
            match *column {
                "name" => query.push_bind(area.name.clone()),
                "active" => query.push_bind(area.active),
                other => return Err(sqlx::Error::ColumnNotFound(other.to_string())),
            };
        }

        query
            .push(" WHERE id = ")
            .push_bind(area.id)
            .push(" RETURNING ")
            .push(AREA_COLUMNS);

        query.build_query_as::<Area>().fetch_optional(pool).await
    }

    /// Deletes an area by ID
    ///
    /// Fails with a foreign key violation while tasks reference the area.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM areas WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Saved filter presets
///
/// A custom filter is a named `(field, value)` pair stored for one listing
/// screen. Names are unique per screen; saving an existing name returns the
/// stored filter unchanged.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE custom_filters (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     field VARCHAR(255) NOT NULL,
///     value VARCHAR(255) NOT NULL,
///     entity VARCHAR(32) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (name, entity)
/// );
/// ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::entity::{require_fields, Entity, EntityKind, ModelError};
use super::patch::UpdateSet;

/// Listing screen a filter belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterEntity {
    Company,
    Task,
    User,
}

impl FilterEntity {
    pub fn as_str(&self) -> &'static str {
        match self {
            FilterEntity::Company => "company",
            FilterEntity::Task => "task",
            FilterEntity::User => "user",
        }
    }
}

impl fmt::Display for FilterEntity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterEntity {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "company" => Ok(FilterEntity::Company),
            "task" => Ok(FilterEntity::Task),
            "user" => Ok(FilterEntity::User),
            other => Err(ModelError::InvalidValue {
                field: "entity",
                message: format!("'{}' no es uno de company, task, user", other),
            }),
        }
    }
}

/// Saved filter record
///
/// `entity` is stored as text; rows are only written through [`Entity::build`],
/// which checks it against [`FilterEntity`].
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CustomFilter {
    pub id: Uuid,
    pub name: String,
    pub field: String,
    pub value: String,
    pub entity: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for saving a filter
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCustomFilter {
    pub name: Option<String>,
    pub field: Option<String>,
    pub value: Option<String>,
    pub entity: Option<String>,
}

impl Entity for CustomFilter {
    const KIND: EntityKind = EntityKind::CustomFilter;
    type Create = CreateCustomFilter;
    type Patch = Infallible;

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(input: CreateCustomFilter, id: Uuid, now: DateTime<Utc>) -> Result<Self, ModelError> {
        require_fields(&[
            ("name", &input.name),
            ("field", &input.field),
            ("value", &input.value),
            ("entity", &input.entity),
        ])?;

        let entity: FilterEntity = input.entity.unwrap_or_default().parse()?;

        Ok(Self {
            id,
            name: input.name.unwrap_or_default().trim().to_string(),
            field: input.field.unwrap_or_default(),
            value: input.value.unwrap_or_default(),
            entity: entity.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, patch: Infallible) -> Result<UpdateSet, ModelError> {
        match patch {}
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

const FILTER_COLUMNS: &str = "id, name, field, value, entity, created_at, updated_at";

impl CustomFilter {
    /// Inserts a saved filter
    pub async fn insert(pool: &PgPool, filter: &CustomFilter) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, CustomFilter>(&format!(
            r#"
            INSERT INTO custom_filters ({FILTER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {FILTER_COLUMNS}
            "#
        ))
        .bind(filter.id)
        .bind(&filter.name)
        .bind(&filter.field)
        .bind(&filter.value)
        .bind(&filter.entity)
        .bind(filter.created_at)
        .bind(filter.updated_at)
        .fetch_one(pool)
        .await
    }

    /// Finds a filter by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomFilter>(&format!(
            "SELECT {FILTER_COLUMNS} FROM custom_filters WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Finds a filter by its `(name, entity)` key
    pub async fn find_by_name(
        pool: &PgPool,
        name: &str,
        entity: FilterEntity,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, CustomFilter>(&format!(
            "SELECT {FILTER_COLUMNS} FROM custom_filters WHERE name = $1 AND entity = $2"
        ))
        .bind(name)
        .bind(entity.as_str())
        .fetch_optional(pool)
        .await
    }

    /// Lists filters, newest first, optionally for one screen
    pub async fn list(
        pool: &PgPool,
        entity: Option<FilterEntity>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        match entity {
            Some(entity) => {
                sqlx::query_as::<_, CustomFilter>(&format!(
                    "SELECT {FILTER_COLUMNS} FROM custom_filters WHERE entity = $1 ORDER BY created_at DESC"
                ))
                .bind(entity.as_str())
                .fetch_all(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, CustomFilter>(&format!(
                    "SELECT {FILTER_COLUMNS} FROM custom_filters ORDER BY created_at DESC"
                ))
                .fetch_all(pool)
                .await
            }
        }
    }

    /// Deletes a filter by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM custom_filters WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_normalizes_entity() {
        let filter = CustomFilter::build(
            CreateCustomFilter {
                name: Some("Vencidas ".to_string()),
                field: Some("status".to_string()),
                value: Some("pendiente".to_string()),
                entity: Some(" task".to_string()),
            },
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap();

        assert_eq!(filter.name, "Vencidas");
        assert_eq!(filter.entity, "task");
    }

    #[test]
    fn test_build_rejects_unknown_entity() {
        let err = CustomFilter::build(
            CreateCustomFilter {
                name: Some("x".to_string()),
                field: Some("f".to_string()),
                value: Some("v".to_string()),
                entity: Some("area".to_string()),
            },
            Uuid::new_v4(),
            Utc::now(),
        )
        .unwrap_err();

        assert!(matches!(err, ModelError::InvalidValue { field: "entity", .. }));
    }

    #[test]
    fn test_build_requires_fields() {
        let err = CustomFilter::build(CreateCustomFilter::default(), Uuid::new_v4(), Utc::now())
            .unwrap_err();
        assert_eq!(
            err,
            ModelError::MissingFields(vec!["name", "field", "value", "entity"])
        );
    }
}

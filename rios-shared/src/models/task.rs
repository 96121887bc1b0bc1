/// Task model and database operations
///
/// A task is a unit of work for one company, owned by an area and assigned to
/// a user.
///
/// # Status
///
/// ```text
/// pendiente → en_progreso → terminada
/// ```
///
/// Administrators may set any status. Assignees may only close their own
/// tasks (`terminada`).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('pendiente', 'en_progreso', 'terminada');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255) NOT NULL,
///     description TEXT NOT NULL,
///     due_date TIMESTAMPTZ NOT NULL,
///     status task_status NOT NULL DEFAULT 'pendiente',
///     company_id UUID NOT NULL REFERENCES companies(id),
///     area_id UUID NOT NULL REFERENCES areas(id),
///     user_id UUID NOT NULL REFERENCES users(id),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::entity::{missing_fields, Entity, EntityKind, ModelError, Reference};
use super::patch::{Patch, UpdateSet};

/// Task status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started
    Pendiente,

    /// Being worked on
    EnProgreso,

    /// Done
    Terminada,
}

impl TaskStatus {
    /// Converts status to its wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pendiente => "pendiente",
            TaskStatus::EnProgreso => "en_progreso",
            TaskStatus::Terminada => "terminada",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pendiente" => Ok(TaskStatus::Pendiente),
            "en_progreso" => Ok(TaskStatus::EnProgreso),
            "terminada" => Ok(TaskStatus::Terminada),
            other => Err(ModelError::InvalidValue {
                field: "status",
                message: format!(
                    "'{}' no es uno de pendiente, en_progreso, terminada",
                    other
                ),
            }),
        }
    }
}

/// Parses a due date sent as RFC 3339, `YYYY-MM-DDTHH:MM[:SS]` or `YYYY-MM-DD`
///
/// Dates without an offset are taken as UTC.
pub fn parse_due_date(value: &str) -> Result<DateTime<Utc>, ModelError> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Ok(parsed.with_timezone(&Utc));
    }

    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| ModelError::InvalidValue {
            field: "dueDate",
            message: format!("fecha inválida '{}'", value),
        })
}

/// Task record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub status: TaskStatus,
    pub company_id: Uuid,
    pub area_id: Uuid,

    /// Assignee
    pub user_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a task
///
/// All seven fields are required.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub name: Option<String>,
    pub description: Option<String>,
    pub company_id: Option<Uuid>,
    pub area_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub due_date: Option<String>,
    pub status: Option<String>,
}

/// Partial update of a task
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default)]
    pub name: Patch<String>,
    #[serde(default)]
    pub description: Patch<String>,
    #[serde(default)]
    pub due_date: Patch<String>,
    #[serde(default)]
    pub status: Patch<String>,
    #[serde(default)]
    pub company_id: Patch<Uuid>,
    #[serde(default)]
    pub area_id: Patch<Uuid>,
    #[serde(default)]
    pub user_id: Patch<Uuid>,
}

impl Entity for Task {
    const KIND: EntityKind = EntityKind::Task;
    type Create = CreateTask;
    type Patch = TaskPatch;

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(input: CreateTask, id: Uuid, now: DateTime<Utc>) -> Result<Self, ModelError> {
        let mut missing = missing_fields(&[
            ("name", &input.name),
            ("description", &input.description),
        ]);
        if input.company_id.is_none() {
            missing.push("companyId");
        }
        if input.area_id.is_none() {
            missing.push("areaId");
        }
        if input.user_id.is_none() {
            missing.push("userId");
        }
        missing.extend(missing_fields(&[
            ("dueDate", &input.due_date),
            ("status", &input.status),
        ]));

        let (Some(company_id), Some(area_id), Some(user_id), Some(due_date), Some(status)) = (
            input.company_id,
            input.area_id,
            input.user_id,
            input.due_date,
            input.status,
        ) else {
            return Err(ModelError::MissingFields(missing));
        };
        if !missing.is_empty() {
            return Err(ModelError::MissingFields(missing));
        }

        Ok(Self {
            id,
            name: input.name.unwrap_or_default().trim().to_string(),
            description: input.description.unwrap_or_default(),
            due_date: parse_due_date(&due_date)?,
            status: status.parse()?,
            company_id,
            area_id,
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, patch: TaskPatch) -> Result<UpdateSet, ModelError> {
        let mut changes = UpdateSet::new();

        changes.apply("name", patch.name.map(|v| v.trim().to_string()), &mut self.name);
        changes.apply("description", patch.description, &mut self.description);
        if let Patch::Present(due_date) = patch.due_date {
            changes.apply("due_date", Patch::Present(parse_due_date(&due_date)?), &mut self.due_date);
        }
        if let Patch::Present(status) = patch.status {
            changes.apply("status", Patch::Present(status.parse()?), &mut self.status);
        }
        changes.apply("company_id", patch.company_id, &mut self.company_id);
        changes.apply("area_id", patch.area_id, &mut self.area_id);
        changes.apply("user_id", patch.user_id, &mut self.user_id);

        Ok(changes)
    }

    fn validate(&self) -> Result<(), ModelError> {
        let missing = missing_fields(&[
            ("name", &Some(self.name.clone())),
            ("description", &Some(self.description.clone())),
        ]);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ModelError::MissingFields(missing))
        }
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn references(&self) -> Vec<Reference> {
        vec![
            Reference {
                column: "company_id",
                kind: EntityKind::Company,
                id: self.company_id,
            },
            Reference {
                column: "area_id",
                kind: EntityKind::Area,
                id: self.area_id,
            },
            Reference {
                column: "user_id",
                kind: EntityKind::User,
                id: self.user_id,
            },
        ]
    }
}

const TASK_COLUMNS: &str =
    "id, name, description, due_date, status, company_id, area_id, user_id, created_at, updated_at";

impl Task {
    /// Inserts a fully built task row
    pub async fn insert(pool: &PgPool, task: &Task) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            r#"
            INSERT INTO tasks ({TASK_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {TASK_COLUMNS}
            "#
        ))
        .bind(task.id)
        .bind(&task.name)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.status)
        .bind(task.company_id)
        .bind(task.area_id)
        .bind(task.user_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(pool)
        .await
    }

    /// Finds a task by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists all tasks, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Lists tasks assigned to a user, earliest due first
    pub async fn list_by_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE user_id = $1 ORDER BY due_date ASC"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// Writes the supplied columns of a merged row
    pub async fn update_columns(
        pool: &PgPool,
        task: &Task,
        changes: &UpdateSet,
    ) -> Result<Option<Self>, sqlx::Error> {
        let mut query = QueryBuilder::<Postgres>::new("UPDATE tasks SET updated_at = ");
        query.push_bind(task.updated_at);

        for column in changes.columns() {
            query.push(", ").push(*column).push(" = ");
            match *column {
                "name" => query.push_bind(task.name.clone()),
                "description" => query.push_bind(task.description.clone()),
                "due_date" => query.push_bind(task.due_date),
                "status" => query.push_bind(task.status),
                "company_id" => query.push_bind(task.company_id),
                "area_id" => query.push_bind(task.area_id),
                "user_id" => query.push_bind(task.user_id),
                other => return Err(sqlx::Error::ColumnNotFound(other.to_string())),
            };
        }

        query
            .push(" WHERE id = ")
            .push_bind(task.id)
            .push(" RETURNING ")
            .push(TASK_COLUMNS);

        query.build_query_as::<Task>().fetch_optional(pool).await
    }

    /// Deletes a task by ID
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

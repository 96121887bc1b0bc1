/// PostgreSQL-backed [`Store`]
///
/// Each repository delegates to the SQL that lives next to its model.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::error::StoreError;
use super::pool::health_check;
use super::store::{Repository, Store};
use crate::models::area::Area;
use crate::models::company::Company;
use crate::models::custom_filter::{CustomFilter, FilterEntity};
use crate::models::entity::EntityKind;
use crate::models::patch::UpdateSet;
use crate::models::task::Task;
use crate::models::user::User;

/// Store over a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn deleted(removed: bool) -> Result<(), StoreError> {
    if removed {
        Ok(())
    } else {
        Err(StoreError::NotFound)
    }
}

#[async_trait]
impl Repository<User> for PgStore {
    async fn list(&self) -> Result<Vec<User>, StoreError> {
        Ok(User::list(&self.pool).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn insert(&self, row: &User) -> Result<User, StoreError> {
        Ok(User::insert(&self.pool, row).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        deleted(User::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Repository<Company> for PgStore {
    async fn list(&self) -> Result<Vec<Company>, StoreError> {
        Ok(Company::list(&self.pool).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Company>, StoreError> {
        Ok(Company::find_by_id(&self.pool, id).await?)
    }

    async fn insert(&self, row: &Company) -> Result<Company, StoreError> {
        Ok(Company::insert(&self.pool, row).await?)
    }

    async fn update(&self, row: &Company, changes: &UpdateSet) -> Result<Company, StoreError> {
        Company::update_columns(&self.pool, row, changes)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        deleted(Company::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Repository<Area> for PgStore {
    async fn list(&self) -> Result<Vec<Area>, StoreError> {
        Ok(Area::list(&self.pool).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Area>, StoreError> {
        Ok(Area::find_by_id(&self.pool, id).await?)
    }

    async fn insert(&self, row: &Area) -> Result<Area, StoreError> {
        Ok(Area::insert(&self.pool, row).await?)
    }

    async fn update(&self, row: &Area, changes: &UpdateSet) -> Result<Area, StoreError> {
        Area::update_columns(&self.pool, row, changes)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        deleted(Area::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Repository<Task> for PgStore {
    async fn list(&self) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list(&self.pool).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn insert(&self, row: &Task) -> Result<Task, StoreError> {
        Ok(Task::insert(&self.pool, row).await?)
    }

    async fn update(&self, row: &Task, changes: &UpdateSet) -> Result<Task, StoreError> {
        Task::update_columns(&self.pool, row, changes)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        deleted(Task::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Repository<CustomFilter> for PgStore {
    async fn list(&self) -> Result<Vec<CustomFilter>, StoreError> {
        Ok(CustomFilter::list(&self.pool, None).await?)
    }

    async fn find(&self, id: Uuid) -> Result<Option<CustomFilter>, StoreError> {
        Ok(CustomFilter::find_by_id(&self.pool, id).await?)
    }

    async fn insert(&self, row: &CustomFilter) -> Result<CustomFilter, StoreError> {
        Ok(CustomFilter::insert(&self.pool, row).await?)
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        deleted(CustomFilter::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(health_check(&self.pool).await?)
    }

    async fn exists(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        let query = format!("SELECT EXISTS (SELECT 1 FROM {} WHERE id = $1)", kind.table());
        let found: bool = sqlx::query_scalar(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(found)
    }

    async fn value_taken(
        &self,
        kind: EntityKind,
        column: &'static str,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        // `column` only ever comes from an entity's unique_keys
        let query = format!(
            "SELECT EXISTS (SELECT 1 FROM {} WHERE lower({}) = lower($1) AND ($2::uuid IS NULL OR id <> $2))",
            kind.table(),
            column
        );
        let taken: bool = sqlx::query_scalar(&query)
            .bind(value.trim())
            .bind(exclude)
            .fetch_one(&self.pool)
            .await?;
        Ok(taken)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn list_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_user(&self.pool, user_id).await?)
    }

    async fn find_filter(
        &self,
        name: &str,
        entity: FilterEntity,
    ) -> Result<Option<CustomFilter>, StoreError> {
        Ok(CustomFilter::find_by_name(&self.pool, name, entity).await?)
    }

    async fn list_filters(
        &self,
        entity: Option<FilterEntity>,
    ) -> Result<Vec<CustomFilter>, StoreError> {
        Ok(CustomFilter::list(&self.pool, entity).await?)
    }
}

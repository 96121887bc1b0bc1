/// Storage abstraction
///
/// [`Repository`] is the generic per-entity contract the entity service is
/// written against; [`Store`] bundles one repository per record type with
/// the lookups that do not fit the generic shape.

use async_trait::async_trait;
use uuid::Uuid;

use super::error::StoreError;
use crate::models::area::Area;
use crate::models::company::Company;
use crate::models::custom_filter::{CustomFilter, FilterEntity};
use crate::models::entity::{Entity, EntityKind};
use crate::models::patch::UpdateSet;
use crate::models::task::Task;
use crate::models::user::User;

/// CRUD over one record type
#[async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    /// All rows, newest first
    async fn list(&self) -> Result<Vec<E>, StoreError>;

    /// Row by ID
    async fn find(&self, id: Uuid) -> Result<Option<E>, StoreError>;

    /// Writes a new row
    async fn insert(&self, row: &E) -> Result<E, StoreError>;

    /// Writes the `changes` columns of an already merged row
    ///
    /// Returns `NotFound` if the row disappeared since it was read.
    async fn update(&self, row: &E, changes: &UpdateSet) -> Result<E, StoreError> {
        let _ = changes;
        Err(StoreError::Backend(format!(
            "{} rows cannot be updated (id {})",
            E::KIND.table(),
            row.id()
        )))
    }

    /// Removes a row
    ///
    /// Returns `NotFound` if there was nothing to remove and
    /// `ForeignKeyViolation` if other rows still point at it.
    async fn delete(&self, id: Uuid) -> Result<(), StoreError>;
}

/// Every repository plus the specialised lookups
#[async_trait]
pub trait Store:
    Repository<User>
    + Repository<Company>
    + Repository<Area>
    + Repository<Task>
    + Repository<CustomFilter>
{
    /// Checks the backend answers
    async fn ping(&self) -> Result<(), StoreError>;

    /// Whether a row of `kind` with this ID exists
    async fn exists(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError>;

    /// Whether `column` already holds `value` (case-insensitive) on a row
    /// other than `exclude`
    async fn value_taken(
        &self,
        kind: EntityKind,
        column: &'static str,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError>;

    /// User by email (case-insensitive)
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Tasks assigned to a user, earliest due first
    async fn list_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError>;

    /// Filter by its `(name, entity)` key
    async fn find_filter(
        &self,
        name: &str,
        entity: FilterEntity,
    ) -> Result<Option<CustomFilter>, StoreError>;

    /// Filters, newest first, optionally for one screen
    async fn list_filters(
        &self,
        entity: Option<FilterEntity>,
    ) -> Result<Vec<CustomFilter>, StoreError>;
}

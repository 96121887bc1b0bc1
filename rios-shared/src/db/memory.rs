/// In-memory [`Store`]
///
/// Enforces the same unique and foreign-key constraints as the PostgreSQL
/// schema, so services behave identically against either backend. Used by
/// the test suites and for running the API without a database.

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::StoreError;
use super::store::{Repository, Store};
use crate::models::area::Area;
use crate::models::company::Company;
use crate::models::custom_filter::{CustomFilter, FilterEntity};
use crate::models::entity::{Entity, EntityKind};
use crate::models::patch::UpdateSet;
use crate::models::task::Task;
use crate::models::user::User;

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    companies: Vec<Company>,
    areas: Vec<Area>,
    tasks: Vec<Task>,
    filters: Vec<CustomFilter>,
}

impl Tables {
    fn contains(&self, kind: EntityKind, id: Uuid) -> bool {
        match kind {
            EntityKind::User => self.users.iter().any(|r| r.id == id),
            EntityKind::Company => self.companies.iter().any(|r| r.id == id),
            EntityKind::Area => self.areas.iter().any(|r| r.id == id),
            EntityKind::Task => self.tasks.iter().any(|r| r.id == id),
            EntityKind::CustomFilter => self.filters.iter().any(|r| r.id == id),
        }
    }

    /// First foreign key still pointing at `(kind, id)`
    fn referencing_constraint(&self, kind: EntityKind, id: Uuid) -> Option<String> {
        self.tasks
            .iter()
            .flat_map(|task| task.references())
            .find(|r| r.kind == kind && r.id == id)
            .map(|r| format!("tasks_{}_fkey", r.column))
    }
}

/// Table access for one record type
trait MemoryTable: Entity {
    fn rows(tables: &Tables) -> &Vec<Self>;
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self>;

    /// Checks unique and foreign keys for `row` against everything else
    fn check(tables: &Tables, row: &Self) -> Result<(), StoreError> {
        for key in row.unique_keys() {
            let clash = Self::rows(tables).iter().filter(|r| r.id() != row.id()).any(|r| {
                r.unique_keys()
                    .iter()
                    .any(|k| k.column == key.column && same_text(&k.value, &key.value))
            });
            if clash {
                return Err(StoreError::UniqueViolation {
                    constraint: format!("{}_{}_key", Self::KIND.table(), key.column),
                });
            }
        }

        for reference in row.references() {
            if !tables.contains(reference.kind, reference.id) {
                return Err(StoreError::ForeignKeyViolation {
                    constraint: format!("{}_{}_fkey", Self::KIND.table(), reference.column),
                });
            }
        }

        Ok(())
    }
}

impl MemoryTable for User {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.users
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.users
    }
}

impl MemoryTable for Company {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.companies
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.companies
    }
}

impl MemoryTable for Area {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.areas
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.areas
    }
}

impl MemoryTable for Task {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.tasks
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.tasks
    }
}

impl MemoryTable for CustomFilter {
    fn rows(tables: &Tables) -> &Vec<Self> {
        &tables.filters
    }
    fn rows_mut(tables: &mut Tables) -> &mut Vec<Self> {
        &mut tables.filters
    }

    fn check(tables: &Tables, row: &Self) -> Result<(), StoreError> {
        let clash = tables
            .filters
            .iter()
            .any(|f| f.id != row.id && f.name == row.name && f.entity == row.entity);
        if clash {
            return Err(StoreError::UniqueViolation {
                constraint: "custom_filters_name_entity_key".to_string(),
            });
        }
        Ok(())
    }
}

/// Store holding every table behind one lock
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Rows are appended in creation order; listings return newest first
fn newest_first<E: Clone>(rows: &[E]) -> Vec<E> {
    rows.iter().rev().cloned().collect()
}

/// Case-insensitive comparison matching Postgres `lower()`
fn same_text(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

#[async_trait]
impl<E: MemoryTable> Repository<E> for MemoryStore {
    async fn list(&self) -> Result<Vec<E>, StoreError> {
        let tables = self.tables.read().await;
        Ok(newest_first(E::rows(&tables)))
    }

    async fn find(&self, id: Uuid) -> Result<Option<E>, StoreError> {
        let tables = self.tables.read().await;
        Ok(E::rows(&tables).iter().find(|r| r.id() == id).cloned())
    }

    async fn insert(&self, row: &E) -> Result<E, StoreError> {
        let mut tables = self.tables.write().await;
        if E::rows(&tables).iter().any(|r| r.id() == row.id()) {
            return Err(StoreError::UniqueViolation {
                constraint: format!("{}_pkey", E::KIND.table()),
            });
        }
        E::check(&tables, row)?;
        E::rows_mut(&mut tables).push(row.clone());
        Ok(row.clone())
    }

    async fn update(&self, row: &E, changes: &UpdateSet) -> Result<E, StoreError> {
        let _ = changes;
        let mut tables = self.tables.write().await;
        E::check(&tables, row)?;

        let slot = E::rows_mut(&mut tables)
            .iter_mut()
            .find(|r| r.id() == row.id())
            .ok_or(StoreError::NotFound)?;
        *slot = row.clone();
        Ok(row.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        if let Some(constraint) = tables.referencing_constraint(E::KIND, id) {
            return Err(StoreError::ForeignKeyViolation { constraint });
        }

        let rows = E::rows_mut(&mut tables);
        let before = rows.len();
        rows.retain(|r| r.id() != id);
        if rows.len() == before {
            Err(StoreError::NotFound)
        } else {
            Ok(())
        }
    }
}

fn taken<E: Entity>(rows: &[E], column: &str, value: &str, exclude: Option<Uuid>) -> bool {
    rows.iter()
        .filter(|r| Some(r.id()) != exclude)
        .flat_map(|r| r.unique_keys())
        .any(|k| k.column == column && same_text(k.value.trim(), value.trim()))
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn exists(&self, kind: EntityKind, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.tables.read().await.contains(kind, id))
    }

    async fn value_taken(
        &self,
        kind: EntityKind,
        column: &'static str,
        value: &str,
        exclude: Option<Uuid>,
    ) -> Result<bool, StoreError> {
        let tables = self.tables.read().await;
        Ok(match kind {
            EntityKind::User => taken(&tables.users, column, value, exclude),
            EntityKind::Company => taken(&tables.companies, column, value, exclude),
            EntityKind::Area => taken(&tables.areas, column, value, exclude),
            EntityKind::Task => taken(&tables.tasks, column, value, exclude),
            EntityKind::CustomFilter => taken(&tables.filters, column, value, exclude),
        })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .iter()
            .find(|u| same_text(&u.email, email.trim()))
            .cloned())
    }

    async fn list_tasks_for_user(&self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let tables = self.tables.read().await;
        let mut tasks: Vec<Task> = tables
            .tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| t.due_date);
        Ok(tasks)
    }

    async fn find_filter(
        &self,
        name: &str,
        entity: FilterEntity,
    ) -> Result<Option<CustomFilter>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .filters
            .iter()
            .find(|f| f.name == name && f.entity == entity.as_str())
            .cloned())
    }

    async fn list_filters(
        &self,
        entity: Option<FilterEntity>,
    ) -> Result<Vec<CustomFilter>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .filters
            .iter()
            .rev()
            .filter(|f| entity.map_or(true, |e| f.entity == e.as_str()))
            .cloned()
            .collect())
    }
}

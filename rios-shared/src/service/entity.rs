/// Generic CRUD engine
///
/// One [`EntityService`] serves every record type. The [`Entity`] descriptor
/// supplies what differs between them: required fields, foreign keys, unique
/// values, the protected-row predicate and the merge.
///
/// # Pipeline
///
/// ```text
/// create:  build → unique pre-check → reference pre-check → insert
/// update:  find → protected? → merge → validate → pre-checks → stamp → update
/// delete:  find → protected? → delete (referenced → Conflict)
/// ```
///
/// Pre-checks give clean errors; the store constraints still catch races,
/// and those failures are mapped the same way.

use std::marker::PhantomData;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ConflictCode, ServiceError};
use crate::db::{Repository, Store, StoreError};
use crate::models::entity::{Entity, EntityKind, Reference, UniqueKey};

/// CRUD over one record type
pub struct EntityService<E> {
    store: Arc<dyn Store>,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for EntityService<E> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _entity: PhantomData,
        }
    }
}

pub(crate) fn not_found(kind: EntityKind) -> ServiceError {
    let message = match kind {
        EntityKind::User => "Usuario no encontrado",
        EntityKind::Company => "Empresa no encontrada",
        EntityKind::Area => "Área no encontrada",
        EntityKind::Task => "Tarea no encontrada",
        EntityKind::CustomFilter => "Filtro no encontrado",
    };
    ServiceError::NotFound(message.to_string())
}

fn missing_reference(reference: &Reference) -> ServiceError {
    ServiceError::NotFound(format!(
        "Referencia inválida: {} {} no existe ({})",
        reference.kind.label().to_lowercase(),
        reference.id,
        reference.column
    ))
}

fn duplicate(kind: EntityKind, key: &UniqueKey) -> ServiceError {
    ServiceError::Conflict {
        message: format!(
            "{}: ya existe un registro con {} '{}'",
            kind.label(),
            key.column,
            key.value
        ),
        code: ConflictCode::Duplicate,
    }
}

/// Maps a failed insert or update; a foreign key failure there means a
/// referenced row vanished after the pre-check
fn write_error(kind: EntityKind, err: StoreError) -> ServiceError {
    match err {
        StoreError::NotFound => not_found(kind),
        StoreError::ForeignKeyViolation { constraint } => ServiceError::NotFound(format!(
            "{}: registro referenciado no existe ({})",
            kind.label(),
            constraint
        )),
        other => other.into(),
    }
}

fn delete_error(kind: EntityKind, err: StoreError) -> ServiceError {
    match err {
        StoreError::NotFound => not_found(kind),
        StoreError::ForeignKeyViolation { .. } => ServiceError::Conflict {
            message: format!(
                "No se puede eliminar: {} tiene registros asociados",
                kind.label()
            ),
            code: ConflictCode::HasReferences,
        },
        other => other.into(),
    }
}

impl<E: Entity> EntityService<E>
where
    dyn Store: Repository<E>,
{
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            _entity: PhantomData,
        }
    }

    pub(crate) fn store(&self) -> &(dyn Store + 'static) {
        self.store.as_ref()
    }

    /// All rows, newest first
    pub async fn list(&self) -> Result<Vec<E>, ServiceError> {
        Ok(Repository::<E>::list(self.store()).await?)
    }

    /// Row by ID
    ///
    /// # Errors
    ///
    /// `NotFound` if there is no such row
    pub async fn get(&self, id: Uuid) -> Result<E, ServiceError> {
        Repository::<E>::find(self.store(), id)
            .await?
            .ok_or_else(|| not_found(E::KIND))
    }

    /// Validates and inserts a new row
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` for missing or invalid fields
    /// - `Conflict` (`duplicate`) if a unique value is taken
    /// - `NotFound` if a referenced row does not exist
    pub async fn create(&self, input: E::Create) -> Result<E, ServiceError> {
        let row = E::build(input, Uuid::new_v4(), Utc::now())?;

        self.check_unique(&row, |_| true).await?;
        self.check_references(&row, |_| true).await?;

        let created = Repository::<E>::insert(self.store(), &row)
            .await
            .map_err(|e| write_error(E::KIND, e))?;

        info!(kind = ?E::KIND, id = %created.id(), "Record created");
        Ok(created)
    }

    /// Merges a partial update into an existing row
    ///
    /// Only supplied fields change; `updated_at` is always stamped.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the row (or a newly referenced row) does not exist
    /// - `Forbidden` if the row is protected
    /// - `InvalidArgument` if the merged row is invalid
    /// - `Conflict` (`duplicate`) if a changed unique value is taken
    pub async fn update(&self, id: Uuid, patch: E::Patch) -> Result<E, ServiceError> {
        let mut row = self.get(id).await?;
        if row.is_protected() {
            return Err(protected(E::KIND, "modificada"));
        }

        let changes = row.merge(patch)?;
        row.validate()?;

        self.check_unique(&row, |column| changes.contains(column))
            .await?;
        self.check_references(&row, |column| changes.contains(column))
            .await?;

        row.touch(Utc::now());
        debug!(kind = ?E::KIND, %id, columns = ?changes.columns(), "Applying update");

        let updated = Repository::<E>::update(self.store(), &row, &changes)
            .await
            .map_err(|e| write_error(E::KIND, e))?;

        info!(kind = ?E::KIND, %id, "Record updated");
        Ok(updated)
    }

    /// Deletes a row
    ///
    /// # Errors
    ///
    /// - `NotFound` if the row does not exist
    /// - `Forbidden` if the row is protected
    /// - `Conflict` (`has_references`) if other rows point at it
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let row = self.get(id).await?;
        if row.is_protected() {
            return Err(protected(E::KIND, "eliminada"));
        }

        Repository::<E>::delete(self.store(), id)
            .await
            .map_err(|e| delete_error(E::KIND, e))?;

        info!(kind = ?E::KIND, %id, "Record deleted");
        Ok(())
    }

    async fn check_unique(
        &self,
        row: &E,
        selected: impl Fn(&str) -> bool,
    ) -> Result<(), ServiceError> {
        for key in row.unique_keys().into_iter().filter(|k| selected(k.column)) {
            let taken = self
                .store()
                .value_taken(E::KIND, key.column, &key.value, Some(row.id()))
                .await?;
            if taken {
                return Err(duplicate(E::KIND, &key));
            }
        }
        Ok(())
    }

    async fn check_references(
        &self,
        row: &E,
        selected: impl Fn(&str) -> bool,
    ) -> Result<(), ServiceError> {
        for reference in row.references().iter().filter(|r| selected(r.column)) {
            if !self.store().exists(reference.kind, reference.id).await? {
                return Err(missing_reference(reference));
            }
        }
        Ok(())
    }
}

fn protected(kind: EntityKind, verb: &str) -> ServiceError {
    ServiceError::Forbidden(format!(
        "{} protegida del sistema: no puede ser {}",
        kind.label(),
        verb
    ))
}

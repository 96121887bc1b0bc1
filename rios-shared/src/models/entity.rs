/// Entity descriptors
///
/// Every persisted record type implements [`Entity`], which tells the generic
/// entity service how to validate input, which foreign keys and unique keys
/// to pre-check, which rows are protected, and how to merge a partial update.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::patch::UpdateSet;

/// Kinds of persisted records
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    User,
    Company,
    Area,
    Task,
    CustomFilter,
}

impl EntityKind {
    /// Table backing this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Company => "companies",
            EntityKind::Area => "areas",
            EntityKind::Task => "tasks",
            EntityKind::CustomFilter => "custom_filters",
        }
    }

    /// Human-readable name used in error messages
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::User => "Usuario",
            EntityKind::Company => "Empresa",
            EntityKind::Area => "Área",
            EntityKind::Task => "Tarea",
            EntityKind::CustomFilter => "Filtro",
        }
    }
}

/// A foreign key held by a row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reference {
    /// Column holding the key (e.g. `company_id`)
    pub column: &'static str,

    /// Referenced kind
    pub kind: EntityKind,

    /// Referenced row
    pub id: Uuid,
}

/// A value that must be unique across a table (compared case-insensitively)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniqueKey {
    /// Column holding the value
    pub column: &'static str,

    /// Value to check
    pub value: String,
}

/// Input rejected by an entity descriptor
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Required fields missing or blank
    #[error("Campos requeridos faltantes: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    /// A field carries a value outside its domain
    #[error("Valor inválido para {field}: {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

/// Collects required fields that are absent or blank
///
/// # Example
///
/// ```
/// use rios_shared::models::entity::missing_fields;
///
/// let name = Some("Acme".to_string());
/// let nit: Option<String> = Some("   ".to_string());
/// assert_eq!(missing_fields(&[("name", &name), ("nit", &nit)]), vec!["nit"]);
/// ```
pub fn missing_fields(fields: &[(&'static str, &Option<String>)]) -> Vec<&'static str> {
    fields
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| *name)
        .collect()
}

/// Fails with `MissingFields` if any listed value is absent or blank
pub fn require_fields(fields: &[(&'static str, &Option<String>)]) -> Result<(), ModelError> {
    let missing = missing_fields(fields);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ModelError::MissingFields(missing))
    }
}

/// Schema descriptor for a persisted record type
pub trait Entity: Clone + Serialize + Send + Sync + 'static {
    /// Kind of record
    const KIND: EntityKind;

    /// Creation input
    type Create: Send + 'static;

    /// Partial-update input
    type Patch: Send + 'static;

    /// Row ID
    fn id(&self) -> Uuid;

    /// Builds a new row from creation input, validating required fields
    fn build(input: Self::Create, id: Uuid, now: DateTime<Utc>) -> Result<Self, ModelError>;

    /// Merges a patch into the row, returning the columns it supplied
    fn merge(&mut self, patch: Self::Patch) -> Result<UpdateSet, ModelError>;

    /// Re-checks invariants after a merge
    fn validate(&self) -> Result<(), ModelError> {
        Ok(())
    }

    /// Stamps the last-modified time
    fn touch(&mut self, now: DateTime<Utc>);

    /// Foreign keys that must point at existing rows
    fn references(&self) -> Vec<Reference> {
        Vec::new()
    }

    /// Values that must be unique across the table
    fn unique_keys(&self) -> Vec<UniqueKey> {
        Vec::new()
    }

    /// Protected rows can be neither edited nor deleted
    fn is_protected(&self) -> bool {
        false
    }
}

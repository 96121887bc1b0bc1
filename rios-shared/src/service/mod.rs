/// Entity services
///
/// Services sit between the HTTP edge and the store. They validate input,
/// pre-check references and unique values, guard protected rows, and map
/// every storage failure onto [`ServiceError`] so no driver error reaches a
/// client.
///
/// # Modules
///
/// - `entity`: Generic CRUD engine shared by every record type
/// - `company`, `task`, `user`, `custom_filter`: Record-specific operations
/// - `auth`: Login

use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::auth::authorization::AuthzError;
use crate::auth::middleware::AuthError;
use crate::auth::password::PasswordError;
use crate::db::StoreError;
use crate::models::entity::ModelError;

pub mod auth;
pub mod company;
pub mod custom_filter;
pub mod entity;
pub mod task;
pub mod user;

pub use auth::{AuthService, SessionSettings};
pub use entity::EntityService;

/// Stable discriminator for conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictCode {
    /// A unique value is already taken
    Duplicate,

    /// Other rows still reference the target
    HasReferences,
}

impl ConflictCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConflictCode::Duplicate => "duplicate",
            ConflictCode::HasReferences => "has_references",
        }
    }
}

/// Domain error returned by every service
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Forbidden(String),

    /// Missing, blank or out-of-domain input
    #[error("{message}")]
    InvalidArgument {
        message: String,
        fields: Vec<&'static str>,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{message}")]
    Conflict { message: String, code: ConflictCode },

    /// Storage or other unexpected failure; the message is safe to show
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ServiceError::InvalidArgument {
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Stable error code for clients
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::Forbidden(_) => "forbidden",
            ServiceError::InvalidArgument { .. } => "invalid_argument",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::Conflict { code, .. } => code.as_str(),
            ServiceError::Internal(_) => "internal",
        }
    }
}

impl From<ModelError> for ServiceError {
    fn from(err: ModelError) -> Self {
        let fields = match &err {
            ModelError::MissingFields(fields) => fields.clone(),
            ModelError::InvalidValue { field, .. } => vec![*field],
        };
        ServiceError::InvalidArgument {
            message: err.to_string(),
            fields,
        }
    }
}

impl From<AuthError> for ServiceError {
    fn from(err: AuthError) -> Self {
        ServiceError::Unauthenticated(err.to_string())
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        ServiceError::Forbidden(err.to_string())
    }
}

impl From<PasswordError> for ServiceError {
    fn from(err: PasswordError) -> Self {
        error!(error = %err, "Password hashing failed");
        ServiceError::Internal("Error interno del servidor".to_string())
    }
}

/// Context-free mapping; write paths refine foreign-key failures themselves
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ServiceError::NotFound("Registro no encontrado".to_string()),
            StoreError::UniqueViolation { constraint } => ServiceError::Conflict {
                message: format!("Ya existe un registro con ese valor ({})", constraint),
                code: ConflictCode::Duplicate,
            },
            StoreError::ForeignKeyViolation { .. } => ServiceError::Conflict {
                message: "No se puede completar la operación: tiene registros asociados"
                    .to_string(),
                code: ConflictCode::HasReferences,
            },
            StoreError::Backend(message) => {
                error!(error = %message, "Storage failure");
                ServiceError::Internal("Error interno del servidor".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_become_invalid_argument() {
        let err: ServiceError = ModelError::MissingFields(vec!["usuario", "contraseña"]).into();

        match &err {
            ServiceError::InvalidArgument { fields, message } => {
                assert_eq!(fields, &vec!["usuario", "contraseña"]);
                assert!(message.contains("usuario, contraseña"));
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(err.code(), "invalid_argument");
    }

    #[test]
    fn test_store_errors_map_to_taxonomy() {
        let dup: ServiceError = StoreError::UniqueViolation {
            constraint: "companies_nit_key".to_string(),
        }
        .into();
        assert_eq!(dup.code(), "duplicate");

        let refs: ServiceError = StoreError::ForeignKeyViolation {
            constraint: "tasks_area_id_fkey".to_string(),
        }
        .into();
        assert_eq!(refs.code(), "has_references");

        let internal: ServiceError = StoreError::Backend("connection reset".to_string()).into();
        assert_eq!(internal, ServiceError::Internal("Error interno del servidor".to_string()));
    }
}

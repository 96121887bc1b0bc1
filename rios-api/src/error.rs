/// Error handling for the API server
///
/// Every handler returns `ApiResult<T>`. Lower-layer errors convert into
/// [`ApiError`] through `?`, and each variant maps to one status code and one
/// stable `code` string in the JSON envelope:
///
/// ```json
/// { "error": "Empresa no encontrada", "code": "not_found" }
/// ```
///
/// # Example
///
/// ```no_run
/// use rios_api::error::ApiResult;
/// use axum::Json;
/// use serde_json::{json, Value};
///
/// async fn handler() -> ApiResult<Json<Value>> {
///     Ok(Json(json!({ "ok": true })))
/// }
/// ```

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rios_shared::auth::{authorization::AuthzError, middleware::AuthError};
use rios_shared::service::{ConflictCode, ServiceError};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{error, warn};
use validator::ValidationErrors;

/// API result type alias
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type
#[derive(Debug)]
pub enum ApiError {
    /// Bad request (400)
    BadRequest(String),

    /// Unauthorized (401)
    Unauthorized(String),

    /// Forbidden (403)
    Forbidden(String),

    /// Not found (404)
    NotFound(String),

    /// Conflict (409), duplicate value or row still referenced
    Conflict { message: String, code: ConflictCode },

    /// Bad request (400) with per-field details
    ValidationError {
        message: String,
        details: Vec<ValidationErrorDetail>,
    },

    /// Internal server error (500)
    InternalError(String),
}

/// Validation error detail
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationErrorDetail {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable message (Spanish)
    pub error: String,

    /// Stable code for client-side branching
    pub code: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<ValidationErrorDetail>>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) | ApiError::ValidationError { .. } => "invalid_argument",
            ApiError::Unauthorized(_) => "unauthenticated",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound(_) => "not_found",
            ApiError::Conflict { code, .. } => code.as_str(),
            ApiError::InternalError(_) => "internal",
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::InternalError(msg) => write!(f, "{}", msg),
            ApiError::Conflict { message, .. } => write!(f, "{}", message),
            ApiError::ValidationError { message, details } => {
                write!(f, "{} ({} campos)", message, details.len())
            }
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let (message, details) = match self {
            ApiError::InternalError(msg) => {
                // Details stay in the log
                error!(error = %msg, "Internal error");
                ("Error interno del servidor".to_string(), None)
            }
            ApiError::ValidationError { message, details } => {
                warn!(status = status.as_u16(), code, error = %message, "Request rejected");
                (message, Some(details))
            }
            ApiError::Conflict { message, .. }
            | ApiError::BadRequest(message)
            | ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::NotFound(message) => {
                warn!(status = status.as_u16(), code, error = %message, "Request rejected");
                (message, None)
            }
        };

        let body = Json(ErrorResponse {
            error: message,
            code: code.to_string(),
            details,
        });

        (status, body).into_response()
    }
}

/// Convert service errors to API errors
impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unauthenticated(msg) => ApiError::Unauthorized(msg),
            ServiceError::Forbidden(msg) => ApiError::Forbidden(msg),
            ServiceError::InvalidArgument { message, fields } if fields.is_empty() => {
                ApiError::BadRequest(message)
            }
            ServiceError::InvalidArgument { message, fields } => {
                let details = fields
                    .into_iter()
                    .map(|field| ValidationErrorDetail {
                        field: field.to_string(),
                        message: message.clone(),
                    })
                    .collect();
                ApiError::ValidationError { message, details }
            }
            ServiceError::NotFound(msg) => ApiError::NotFound(msg),
            ServiceError::Conflict { message, code } => ApiError::Conflict { message, code },
            ServiceError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

/// Convert auth errors to API errors
impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

/// Convert authorization errors to API errors
impl From<AuthzError> for ApiError {
    fn from(err: AuthzError) -> Self {
        ApiError::Forbidden(err.to_string())
    }
}

/// Convert validator errors to API errors
impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<ValidationErrorDetail> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| ValidationErrorDetail {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Valor inválido".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));

        ApiError::ValidationError {
            message: "Datos de entrada inválidos".to_string(),
            details,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(format!("Cuerpo JSON inválido: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(format!("Parámetros inválidos: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(format!("Identificador inválido: {}", rejection.body_text()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_status_mapping() {
        let cases = [
            (ServiceError::Unauthenticated("x".into()), StatusCode::UNAUTHORIZED),
            (ServiceError::Forbidden("x".into()), StatusCode::FORBIDDEN),
            (ServiceError::invalid("x"), StatusCode::BAD_REQUEST),
            (ServiceError::NotFound("x".into()), StatusCode::NOT_FOUND),
            (
                ServiceError::Conflict {
                    message: "x".into(),
                    code: ConflictCode::HasReferences,
                },
                StatusCode::CONFLICT,
            ),
            (ServiceError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, status) in cases {
            let code = err.code();
            let api: ApiError = err.into();
            assert_eq!(api.status(), status);
            assert_eq!(api.code(), code);
        }
    }

    #[test]
    fn test_missing_fields_become_details() {
        let err: ApiError = ServiceError::InvalidArgument {
            message: "Campos requeridos faltantes: usuario, contraseña".to_string(),
            fields: vec!["usuario", "contraseña"],
        }
        .into();

        match &err {
            ApiError::ValidationError { details, .. } => {
                let fields: Vec<_> = details.iter().map(|d| d.field.as_str()).collect();
                assert_eq!(fields, vec!["usuario", "contraseña"]);
            }
            other => panic!("expected validation error, got {:?}", other),
        }
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_internal_error_hides_details() {
        let response = ApiError::InternalError("connection refused".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: ErrorResponse = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body.error, "Error interno del servidor");
        assert_eq!(body.code, "internal");
        assert!(body.details.is_none());
    }

    #[test]
    fn test_conflict_code_is_stable() {
        let err = ApiError::Conflict {
            message: "Ya existe una empresa con ese NIT".to_string(),
            code: ConflictCode::Duplicate,
        };
        assert_eq!(err.code(), "duplicate");
        assert_eq!(err.to_string(), "Ya existe una empresa con ese NIT");
    }
}

/// Saved filter endpoints
///
/// Listing and saving are public; deleting needs an admin or superadmin.
/// Saving is idempotent on `(name, entity)`: `201` for a new filter, `200`
/// with the existing row otherwise.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery},
    routes::DeleteResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use rios_shared::{
    auth::{
        authorization::{authorize, Action},
        middleware::AuthContext,
    },
    models::custom_filter::{CreateCustomFilter, CustomFilter, FilterEntity},
    service::ServiceError,
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub entity: Option<String>,
}

/// List filters
///
/// # Endpoint
///
/// ```text
/// GET /admin/custom-filters?entity=task
/// ```
pub async fn list_filters(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<FilterQuery>,
) -> ApiResult<Json<Vec<CustomFilter>>> {
    let entity = query
        .entity
        .filter(|e| !e.trim().is_empty())
        .map(|e| e.parse::<FilterEntity>())
        .transpose()
        .map_err(ServiceError::from)?;

    Ok(Json(state.custom_filters().list_for(entity).await?))
}

/// Save a filter
///
/// # Endpoint
///
/// ```text
/// POST /admin/custom-filters
/// Content-Type: application/json
///
/// { "name": "Vencidas", "field": "status", "value": "pendiente", "entity": "task" }
/// ```
pub async fn create_filter(
    State(state): State<AppState>,
    ApiJson(input): ApiJson<CreateCustomFilter>,
) -> ApiResult<(StatusCode, Json<CustomFilter>)> {
    let (filter, created) = state.custom_filters().create_or_get(input).await?;

    let status = if created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(filter)))
}

pub async fn delete_filter(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    authorize(&auth, Action::DeleteCustomFilter)?;

    state.custom_filters().delete(id).await?;
    Ok(Json(DeleteResponse::new("Filtro eliminado", id)))
}

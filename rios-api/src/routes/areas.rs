/// Area endpoints
///
/// - `GET /admin/areas`, `POST /admin/areas` (admin)
/// - `PUT /admin/areas/:id`, `DELETE /admin/areas/:id` (admin, superadmin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, StateFlag},
    routes::DeleteResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use rios_shared::{
    auth::{
        authorization::{authorize, Action},
        middleware::AuthContext,
    },
    models::{
        area::{Area, AreaPatch, CreateArea},
        patch::Patch,
    },
};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct CreateAreaRequest {
    #[serde(default)]
    pub state: Option<StateFlag>,

    #[serde(flatten)]
    pub area: CreateArea,
}

#[derive(Debug, Deserialize)]
pub struct UpdateAreaRequest {
    #[serde(default)]
    pub state: Patch<StateFlag>,

    #[serde(flatten)]
    pub area: AreaPatch,
}

pub async fn list_areas(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Area>>> {
    authorize(&auth, Action::ListAreas)?;
    Ok(Json(state.areas().list().await?))
}

pub async fn create_area(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateAreaRequest>,
) -> ApiResult<(StatusCode, Json<Area>)> {
    authorize(&auth, Action::CreateArea)?;

    let mut input = req.area;
    input.active = req.state.map(bool::from);

    let area = state.areas().create(input).await?;
    Ok((StatusCode::CREATED, Json(area)))
}

pub async fn update_area(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateAreaRequest>,
) -> ApiResult<Json<Area>> {
    authorize(&auth, Action::UpdateArea)?;

    let mut patch = req.area;
    patch.active = req.state.map(bool::from);

    Ok(Json(state.areas().update(id, patch).await?))
}

/// Delete an area
///
/// # Errors
///
/// - `409 Conflict`: Tasks still reference the area; the row is kept
pub async fn delete_area(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    authorize(&auth, Action::DeleteArea)?;

    state.areas().delete(id).await?;
    Ok(Json(DeleteResponse::new("Área eliminada", id)))
}

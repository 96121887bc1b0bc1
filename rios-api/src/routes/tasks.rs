/// Task endpoints
///
/// # Endpoints
///
/// - `GET /admin/tasks`, `POST /admin/tasks` (admin)
/// - `PUT /admin/tasks/:id`, `DELETE /admin/tasks/:id` (admin, superadmin)
/// - `GET /tasks/my-tasks` - Tasks assigned to the caller
/// - `PUT /tasks/:id/status` - Close a task (assignee or admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath},
    routes::DeleteResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use rios_shared::{
    auth::{
        authorization::{authorize, Action},
        middleware::AuthContext,
    },
    models::task::{CreateTask, Task, TaskPatch},
};
use serde::Deserialize;
use uuid::Uuid;

/// Status change request
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: Option<String>,
}

pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    authorize(&auth, Action::ListTasks)?;
    Ok(Json(state.tasks().list().await?))
}

/// Create a task
///
/// # Endpoint
///
/// ```text
/// POST /admin/tasks
/// Content-Type: application/json
///
/// {
///   "name": "Declaración de renta",
///   "description": "Preparar y presentar",
///   "companyId": "uuid",
///   "areaId": "uuid",
///   "userId": "uuid",
///   "dueDate": "2025-04-30",
///   "status": "pendiente"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Any of the seven fields missing, bad date or status
/// - `404 Not Found`: Company, area or user does not exist
pub async fn create_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<CreateTask>,
) -> ApiResult<(StatusCode, Json<Task>)> {
    authorize(&auth, Action::CreateTask)?;

    let task = state.tasks().create(input).await?;
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<TaskPatch>,
) -> ApiResult<Json<Task>> {
    authorize(&auth, Action::UpdateTask)?;
    Ok(Json(state.tasks().update(id, patch).await?))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    authorize(&auth, Action::DeleteTask)?;

    state.tasks().delete(id).await?;
    Ok(Json(DeleteResponse::new("Tarea eliminada", id)))
}

/// Tasks assigned to the caller, earliest due first
pub async fn my_tasks(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Task>>> {
    authorize(&auth, Action::ListMyTasks)?;
    Ok(Json(state.tasks().list_for_user(auth.user_id).await?))
}

/// Close a task
///
/// # Endpoint
///
/// ```text
/// PUT /tasks/:id/status
/// Content-Type: application/json
///
/// { "status": "terminada" }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Status other than `terminada`
/// - `403 Forbidden`: A `user` closing someone else's task
/// - `404 Not Found`: No such task
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> ApiResult<Json<Task>> {
    authorize(&auth, Action::UpdateTaskStatus)?;

    let status = req.status.unwrap_or_default();
    Ok(Json(state.tasks().update_status(&auth, id, &status).await?))
}

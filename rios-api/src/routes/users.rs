/// User endpoints
///
/// - `GET /admin/users`, `POST /admin/users` (admin)
/// - `DELETE /admin/users/:id` (admin, superadmin; never one's own account)

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
    models::user::User,
    service::user::CreateAccount,
};
use uuid::Uuid;

pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<User>>> {
    authorize(&auth, Action::ListUsers)?;
    Ok(Json(state.users().list().await?))
}

/// Create a user
///
/// # Endpoint
///
/// ```text
/// POST /admin/users
/// Content-Type: application/json
///
/// { "name": "Ana", "email": "ana@rios.com", "password": "secreto", "role": "user" }
/// ```
///
/// `role` defaults to `user`. The password hash is never returned.
///
/// # Errors
///
/// - `400 Bad Request`: Email or password missing, unknown role
/// - `409 Conflict`: Email already registered
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(input): ApiJson<CreateAccount>,
) -> ApiResult<(StatusCode, Json<User>)> {
    authorize(&auth, Action::CreateUser)?;

    let user = state.users().create_account(input).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Delete a user
///
/// # Errors
///
/// - `400 Bad Request`: Deleting one's own account
/// - `404 Not Found`: No such user
/// - `409 Conflict`: Tasks are still assigned to the user
pub async fn delete_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    authorize(&auth, Action::DeleteUser)?;

    state.users().delete_account(&auth, id).await?;
    Ok(Json(DeleteResponse::new("Usuario eliminado", id)))
}

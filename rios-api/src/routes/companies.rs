/// Company endpoints
///
/// # Endpoints
///
/// - `GET /admin/companies` - List companies (admin)
/// - `POST /admin/companies` - Create a company (admin)
/// - `GET /admin/companies/check-nit?nit=&excludeId=` - NIT availability (public)
/// - `PUT /admin/companies/:id` - Partial update (admin, superadmin)
/// - `DELETE /admin/companies/:id` - Delete (admin, superadmin)
///
/// The system company ("Empresa Principal") cannot be updated or deleted.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiJson, ApiPath, ApiQuery, StateFlag},
    routes::DeleteResponse,
};
use axum::{extract::State, http::StatusCode, Extension, Json};
use rios_shared::{
    auth::{
        authorization::{authorize, Action},
        middleware::AuthContext,
    },
    models::{
        company::{Company, CompanyPatch, CreateCompany},
        patch::Patch,
    },
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Create request: company fields plus the active flag
#[derive(Debug, Deserialize)]
pub struct CreateCompanyRequest {
    #[serde(default)]
    pub state: Option<StateFlag>,

    #[serde(flatten)]
    pub company: CreateCompany,
}

/// Update request; absent keys are left untouched
#[derive(Debug, Deserialize)]
pub struct UpdateCompanyRequest {
    #[serde(default)]
    pub state: Patch<StateFlag>,

    #[serde(flatten)]
    pub company: CompanyPatch,
}

/// NIT availability query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckNitQuery {
    pub nit: Option<String>,

    /// Company being edited, ignored by the check
    pub exclude_id: Option<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct CheckNitResponse {
    pub exists: bool,
}

pub async fn list_companies(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<Company>>> {
    authorize(&auth, Action::ListCompanies)?;
    Ok(Json(state.companies().list().await?))
}

/// Create a company
///
/// # Endpoint
///
/// ```text
/// POST /admin/companies
/// Content-Type: application/json
///
/// {
///   "name": "Acme",
///   "nit": "900.1-1",
///   "email": "a@acme.com",
///   "usuario": "acme",
///   "contraseña": "secreto",
///   "servidorCorreo": "mail.acme.com",
///   "state": "activo"
/// }
/// ```
///
/// # Errors
///
/// - `400 Bad Request`: Required fields missing (all are listed)
/// - `409 Conflict`: NIT or email already registered
pub async fn create_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiJson(req): ApiJson<CreateCompanyRequest>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    authorize(&auth, Action::CreateCompany)?;

    let mut input = req.company;
    input.active = req.state.map(bool::from);

    let company = state.companies().create(input).await?;
    Ok((StatusCode::CREATED, Json(company)))
}

/// Check whether a NIT is taken
///
/// # Endpoint
///
/// ```text
/// GET /admin/companies/check-nit?nit=900.1-1&excludeId=<uuid>
/// ```
///
/// # Response
///
/// ```json
/// { "exists": true }
/// ```
pub async fn check_nit(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<CheckNitQuery>,
) -> ApiResult<Json<CheckNitResponse>> {
    let exists = state
        .companies()
        .nit_exists(query.nit.as_deref().unwrap_or_default(), query.exclude_id)
        .await?;

    Ok(Json(CheckNitResponse { exists }))
}

/// Update a company
///
/// Only the keys present in the body change; `null` clears an optional field.
///
/// # Errors
///
/// - `403 Forbidden`: Role not allowed, or the system company
/// - `404 Not Found`: No such company
/// - `409 Conflict`: New NIT or email already registered
pub async fn update_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(req): ApiJson<UpdateCompanyRequest>,
) -> ApiResult<Json<Company>> {
    authorize(&auth, Action::UpdateCompany)?;

    let mut patch = req.company;
    patch.active = req.state.map(bool::from);

    Ok(Json(state.companies().update(id, patch).await?))
}

/// Delete a company
///
/// # Errors
///
/// - `403 Forbidden`: Role not allowed, or the system company
/// - `404 Not Found`: No such company
/// - `409 Conflict`: Tasks still reference the company
pub async fn delete_company(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    ApiPath(id): ApiPath<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    authorize(&auth, Action::DeleteCompany)?;

    state.companies().delete(id).await?;
    Ok(Json(DeleteResponse::new("Empresa eliminada", id)))
}

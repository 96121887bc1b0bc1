/// Authentication endpoints
///
/// # Endpoints
///
/// - `POST /auth/login` - Check credentials and set the session cookie
/// - `POST /auth/logout` - Clear the session cookie
/// - `GET /auth/me` - Identity of the current session

use crate::{app::AppState, error::ApiResult, extract::ApiJson};
use axum::{extract::State, Extension, Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rios_shared::{
    auth::{
        authorization::{authorize, Action},
        middleware::{AuthContext, LEGACY_SESSION_COOKIE, SESSION_COOKIE},
    },
    models::user::Role,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Login request
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "El email es requerido"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, message = "La contraseña es requerida"))]
    pub password: String,
}

/// Login response; the token itself travels only in the cookie
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub role: Role,
}

/// Logout response
#[derive(Debug, Serialize)]
pub struct LogoutResponse {
    pub message: String,
}

/// Cookie removal matching the attributes the session cookie is set with
fn expired(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Log in
///
/// # Endpoint
///
/// ```text
/// POST /auth/login
/// Content-Type: application/json
///
/// { "email": "admin@rios.com", "password": "admin123" }
/// ```
///
/// # Response
///
/// ```json
/// { "id": "uuid", "name": "Administrador", "email": "admin@rios.com", "role": "admin" }
/// ```
///
/// Sets `auth-token` (httpOnly, SameSite=Lax, path `/`) and removes the
/// legacy `token` cookie.
///
/// # Errors
///
/// - `400 Bad Request`: Email or password missing
/// - `404 Not Found`: No user with this email
/// - `401 Unauthorized`: Wrong password
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<LoginRequest>,
) -> ApiResult<(CookieJar, Json<LoginResponse>)> {
    req.validate()?;

    let (user, token) = state.auth().login(&req.email, &req.password).await?;

    let session = Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.config.api.production)
        .path("/")
        .max_age(time::Duration::days(state.config.session.cookie_max_age_days))
        .build();

    let jar = jar.remove(expired(LEGACY_SESSION_COOKIE)).add(session);

    Ok((
        jar,
        Json(LoginResponse {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
        }),
    ))
}

/// Log out
///
/// # Endpoint
///
/// ```text
/// POST /auth/logout
/// ```
///
/// Always succeeds; clears both the current and the legacy cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<LogoutResponse>) {
    let jar = jar
        .remove(expired(SESSION_COOKIE))
        .remove(expired(LEGACY_SESSION_COOKIE));

    (
        jar,
        Json(LogoutResponse {
            message: "Sesión cerrada".to_string(),
        }),
    )
}

/// Current session
///
/// # Endpoint
///
/// ```text
/// GET /auth/me
/// Cookie: auth-token=<jwt>
/// ```
///
/// # Response
///
/// ```json
/// { "id": "uuid", "email": "admin@rios.com", "role": "admin", "name": "Administrador" }
/// ```
pub async fn me(Extension(auth): Extension<AuthContext>) -> ApiResult<Json<AuthContext>> {
    authorize(&auth, Action::ViewSession)?;
    Ok(Json(auth))
}

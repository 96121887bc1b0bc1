/// Session authentication
///
/// Reads the session token from the request cookies, verifies it and turns
/// the claims into an [`AuthContext`] that handlers receive through request
/// extensions.
///
/// # Cookies
///
/// - `auth-token`: issued by login
/// - `token`: legacy name, still accepted and preferred when both are sent
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use rios_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("{} ({})", auth.email, auth.role)
/// }
/// ```

use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use uuid::Uuid;

use super::jwt::{validate_token, Claims, JwtError};
use crate::models::user::Role;

/// Cookie set on login
pub const SESSION_COOKIE: &str = "auth-token";

/// Cookie name used by earlier clients
pub const LEGACY_SESSION_COOKIE: &str = "token";

/// Identity of the caller, decoded from a verified token
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthContext {
    #[serde(rename = "id")]
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl AuthContext {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.id,
            email: claims.email,
            role: claims.role,
            name: claims.name,
        }
    }
}

/// Why a request could not be authenticated
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("No autenticado: falta el token de sesión")]
    MissingToken,

    /// Bad signature or a token that does not decode
    #[error("Token inválido")]
    InvalidSignature,

    #[error("La sesión ha expirado")]
    Expired,
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::Expired,
            _ => AuthError::InvalidSignature,
        }
    }
}

/// Returns the session token, preferring the legacy cookie name
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    [LEGACY_SESSION_COOKIE, SESSION_COOKIE]
        .iter()
        .filter_map(|name| jar.get(name))
        .map(|cookie| cookie.value())
        .find(|value| !value.is_empty())
}

/// Verifies the session cookie and decodes the caller's identity
///
/// # Errors
///
/// - `MissingToken` when neither cookie is present
/// - `InvalidSignature` when the token is forged or garbled
/// - `Expired` once the claims' expiry has passed
pub fn authenticate(jar: &CookieJar, secret: &str) -> Result<AuthContext, AuthError> {
    let token = session_token(jar).ok_or(AuthError::MissingToken)?;
    let claims = validate_token(token, secret)?;
    Ok(AuthContext::from_claims(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::create_token;
    use axum::http::{header, HeaderMap, HeaderValue};
    use axum_extra::extract::cookie::Cookie;
    use chrono::Duration;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn token_for(email: &str, ttl: Duration) -> String {
        let claims = Claims::new(Uuid::new_v4(), email.to_string(), Role::Admin, None, ttl);
        create_token(&claims, SECRET).unwrap()
    }

    #[test]
    fn test_missing_cookie() {
        let jar = CookieJar::new();
        assert_eq!(authenticate(&jar, SECRET), Err(AuthError::MissingToken));
    }

    #[test]
    fn test_session_cookie_accepted() {
        let jar = CookieJar::new().add(Cookie::new(
            SESSION_COOKIE,
            token_for("admin@rios.com", Duration::hours(1)),
        ));

        let ctx = authenticate(&jar, SECRET).unwrap();
        assert_eq!(ctx.email, "admin@rios.com");
        assert_eq!(ctx.role, Role::Admin);
    }

    #[test]
    fn test_legacy_cookie_preferred() {
        let mut headers = HeaderMap::new();
        let cookies = format!(
            "{}={}; {}={}",
            SESSION_COOKIE,
            token_for("new@rios.com", Duration::hours(1)),
            LEGACY_SESSION_COOKIE,
            token_for("legacy@rios.com", Duration::hours(1)),
        );
        headers.insert(header::COOKIE, HeaderValue::from_str(&cookies).unwrap());

        let jar = CookieJar::from_headers(&headers);
        assert_eq!(authenticate(&jar, SECRET).unwrap().email, "legacy@rios.com");
    }

    #[test]
    fn test_expired_and_forged_tokens() {
        let expired = CookieJar::new().add(Cookie::new(
            SESSION_COOKIE,
            token_for("a@rios.com", Duration::hours(-2)),
        ));
        assert_eq!(authenticate(&expired, SECRET), Err(AuthError::Expired));

        let forged = CookieJar::new().add(Cookie::new(SESSION_COOKIE, "abc.def.ghi"));
        assert_eq!(authenticate(&forged, SECRET), Err(AuthError::InvalidSignature));
    }
}

/// Session tokens
///
/// Sessions are HS256-signed JWTs carrying the user's identity and role, so
/// requests can be authorized without a database round trip. The role in the
/// token is authoritative until the token expires.
///
/// # Example
///
/// ```
/// use rios_shared::auth::jwt::{create_token, validate_token, Claims};
/// use rios_shared::models::user::Role;
/// use chrono::Duration;
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let secret = "a-secret-of-at-least-thirty-two-bytes!";
/// let claims = Claims::new(
///     Uuid::new_v4(),
///     "admin@rios.co".to_string(),
///     Role::Admin,
///     None,
///     Duration::hours(24),
/// );
///
/// let token = create_token(&claims, secret)?;
/// assert_eq!(validate_token(&token, secret)?.email, "admin@rios.co");
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::{Role, User};

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Token signature is invalid")]
    InvalidSignature,

    /// Not a JWT, or the claims do not decode
    #[error("Malformed token: {0}")]
    Malformed(String),
}

/// Claims carried by a session token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub id: Uuid,

    pub email: String,

    pub role: Role,

    /// Display name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims valid for `ttl` from now
    pub fn new(id: Uuid, email: String, role: Role, name: Option<String>, ttl: Duration) -> Self {
        let now = Utc::now();

        Self {
            id,
            email,
            role,
            name,
            iat: now.timestamp(),
            exp: (now + ttl).timestamp(),
        }
    }

    /// Claims for a stored user
    pub fn for_user(user: &User, ttl: Duration) -> Self {
        Self::new(user.id, user.email.clone(), user.role, user.name.clone(), ttl)
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs claims with HS256
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| JwtError::CreateError(e.to_string()))
}

/// Verifies signature and expiry, returning the claims
///
/// # Errors
///
/// - `Expired` once `exp` has passed
/// - `InvalidSignature` if the token was signed with another secret
/// - `Malformed` for anything else
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = true;
    validation.leeway = 0;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => JwtError::Expired,
            ErrorKind::InvalidSignature => JwtError::InvalidSignature,
            _ => JwtError::Malformed(e.to_string()),
        })
}

/// Login

use std::sync::Arc;

use chrono::Duration;
use tracing::{error, info, warn};

use super::ServiceError;
use crate::auth::jwt::{create_token, Claims};
use crate::auth::password::verify_password;
use crate::db::Store;
use crate::models::user::User;

/// Token signing settings, built once from configuration
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub secret: String,

    /// Lifetime written into the claims
    pub token_ttl: Duration,
}

/// Issues session tokens
#[derive(Clone)]
pub struct AuthService {
    store: Arc<dyn Store>,
    settings: SessionSettings,
}

impl AuthService {
    pub fn new(store: Arc<dyn Store>, settings: SessionSettings) -> Self {
        Self { store, settings }
    }

    /// Checks credentials and returns the user with a signed token
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if email or password is blank
    /// - `NotFound` if no user has this email
    /// - `Unauthenticated` if the password does not match
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), ServiceError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(ServiceError::InvalidArgument {
                message: "Email y contraseña son requeridos".to_string(),
                fields: vec!["email", "password"],
            });
        }

        let user = self
            .store
            .find_user_by_email(email.trim())
            .await?
            .ok_or_else(|| ServiceError::NotFound("Usuario no encontrado".to_string()))?;

        if !verify_password(password, &user.password_hash)? {
            warn!(user_id = %user.id, "Login rejected: wrong password");
            return Err(ServiceError::Unauthenticated(
                "Credenciales inválidas".to_string(),
            ));
        }

        let claims = Claims::for_user(&user, self.settings.token_ttl);
        let token = create_token(&claims, &self.settings.secret).map_err(|e| {
            error!(error = %e, "Token signing failed");
            ServiceError::Internal("Error interno del servidor".to_string())
        })?;

        info!(user_id = %user.id, role = %user.role, "User logged in");
        Ok((user, token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::validate_token;
    use crate::db::MemoryStore;
    use crate::models::user::Role;
    use crate::service::user::{CreateAccount, UserService};

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    async fn setup() -> AuthService {
        let store: Arc<dyn Store> = Arc::new(MemoryStore::new());
        UserService::new(store.clone())
            .create_account(CreateAccount {
                name: Some("Admin".to_string()),
                email: Some("admin@rios.com".to_string()),
                password: Some("admin123".to_string()),
                role: Some("admin".to_string()),
            })
            .await
            .unwrap();

        AuthService::new(
            store,
            SessionSettings {
                secret: SECRET.to_string(),
                token_ttl: Duration::hours(24),
            },
        )
    }

    #[tokio::test]
    async fn test_login_issues_token() {
        let auth = setup().await;
        let (user, token) = auth.login("ADMIN@rios.com", "admin123").await.unwrap();

        assert_eq!(user.role, Role::Admin);
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.exp - claims.iat, 24 * 3600);
    }

    #[tokio::test]
    async fn test_login_failures() {
        let auth = setup().await;

        assert!(matches!(
            auth.login("nobody@rios.com", "admin123").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            auth.login("admin@rios.com", "wrong").await,
            Err(ServiceError::Unauthenticated(_))
        ));
        assert!(matches!(
            auth.login("", "").await,
            Err(ServiceError::InvalidArgument { .. })
        ));
    }
}

/// Account management

use serde::Deserialize;
use uuid::Uuid;

use super::entity::EntityService;
use super::ServiceError;
use crate::auth::middleware::AuthContext;
use crate::auth::password::hash_password;
use crate::models::entity::require_fields;
use crate::models::user::{CreateUser, Role, User};

pub type UserService = EntityService<User>;

/// Account creation input, password in plaintext
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateAccount {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,

    /// Defaults to `user`
    pub role: Option<String>,
}

impl EntityService<User> {
    /// Creates an account, hashing its password
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if email or password is missing, or the role is unknown
    /// - `Conflict` (`duplicate`) if the email is taken
    pub async fn create_account(&self, input: CreateAccount) -> Result<User, ServiceError> {
        require_fields(&[("email", &input.email), ("password", &input.password)])?;

        let role = match input.role.as_deref().map(str::trim) {
            None | Some("") => Role::User,
            Some(role) => role.parse()?,
        };
        let password_hash = hash_password(input.password.as_deref().unwrap_or_default())?;

        self.create(CreateUser {
            name: input.name,
            email: input.email,
            password_hash,
            role,
        })
        .await
    }

    /// Deletes an account other than the requester's own
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` when `id` is the requester
    /// - `NotFound` if the account does not exist
    /// - `Conflict` (`has_references`) while tasks are assigned to it
    pub async fn delete_account(
        &self,
        requester: &AuthContext,
        id: Uuid,
    ) -> Result<(), ServiceError> {
        if requester.user_id == id {
            return Err(ServiceError::InvalidArgument {
                message: "No puede eliminar su propio usuario".to_string(),
                fields: vec!["id"],
            });
        }

        self.delete(id).await
    }
}

/// User model and database operations
///
/// Users are the people operating the back office. Administrators manage every
/// record; regular users only see and close out the tasks assigned to them.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin', 'superadmin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name VARCHAR(255),
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// CREATE UNIQUE INDEX users_email_key ON users (lower(email));
/// ```

use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::entity::{require_fields, Entity, EntityKind, ModelError, UniqueKey};
use super::patch::UpdateSet;

/// User role
///
/// Roles are not ordered: every protected operation lists the roles it
/// accepts (see `auth::authorization`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Regular user, works their own tasks
    User,

    /// Administrator
    Admin,

    /// Super administrator
    Superadmin,
}

impl Role {
    /// Converts role to its wire form
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Superadmin => "superadmin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            "superadmin" => Ok(Role::Superadmin),
            other => Err(ModelError::InvalidValue {
                field: "role",
                message: format!("rol desconocido '{}'", other),
            }),
        }
    }
}

/// User account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Unique user ID
    pub id: Uuid,

    /// Display name
    pub name: Option<String>,

    /// Login email, unique case-insensitively
    pub email: String,

    /// Argon2id password hash, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Role
    pub role: Role,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user
///
/// Carries the password hash, not the plaintext password.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: String,
    pub role: Role,
}

impl Entity for User {
    const KIND: EntityKind = EntityKind::User;
    type Create = CreateUser;
    type Patch = Infallible;

    fn id(&self) -> Uuid {
        self.id
    }

    fn build(input: CreateUser, id: Uuid, now: DateTime<Utc>) -> Result<Self, ModelError> {
        require_fields(&[("email", &input.email)])?;

        Ok(Self {
            id,
            name: input.name.filter(|n| !n.trim().is_empty()),
            email: input.email.unwrap_or_default().trim().to_string(),
            password_hash: input.password_hash,
            role: input.role,
            created_at: now,
            updated_at: now,
        })
    }

    fn merge(&mut self, patch: Infallible) -> Result<UpdateSet, ModelError> {
        match patch {}
    }

    fn touch(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }

    fn unique_keys(&self) -> Vec<UniqueKey> {
        vec![UniqueKey {
            column: "email",
            value: self.email.clone(),
        }]
    }
}

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

impl User {
    /// Inserts a fully built user row
    pub async fn insert(pool: &PgPool, user: &User) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(pool)
        .await
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a user by email address (case-insensitive)
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email.trim())
        .fetch_optional(pool)
        .await
    }

    /// Lists all users, newest first
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(pool)
        .await
    }

    /// Deletes a user by ID
    ///
    /// Fails with a foreign key violation while tasks are assigned to the user.
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(email: Option<&str>) -> CreateUser {
        CreateUser {
            name: Some("Ana".to_string()),
            email: email.map(String::from),
            password_hash: "$argon2id$hash".to_string(),
            role: Role::User,
        }
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("superadmin".parse::<Role>().unwrap(), Role::Superadmin);
        assert!("root".parse::<Role>().is_err());
        assert_eq!(Role::User.to_string(), "user");
    }

    #[test]
    fn test_build_requires_email() {
        let err = User::build(input(None), Uuid::new_v4(), Utc::now()).unwrap_err();
        assert_eq!(err, ModelError::MissingFields(vec!["email"]));

        let user = User::build(input(Some(" ana@rios.com ")), Uuid::new_v4(), Utc::now()).unwrap();
        assert_eq!(user.email, "ana@rios.com");
        assert_eq!(user.created_at, user.updated_at);
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let user = User::build(input(Some("ana@rios.com")), Uuid::new_v4(), Utc::now()).unwrap();
        let json = serde_json::to_value(&user).unwrap();

        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "user");
        assert!(json["createdAt"].is_string());
    }
}

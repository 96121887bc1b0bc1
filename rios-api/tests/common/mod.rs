//! Common test utilities for integration tests
//!
//! Builds the full router over a `MemoryStore` seeded the way a fresh
//! deployment is (admin account and system company), plus a superadmin and
//! two regular users. Sessions are minted directly as signed tokens.

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use chrono::Duration;
use rios_api::app::{build_router, AppState};
use rios_api::config::{ApiConfig, Config, CorsConfig, DatabaseConfig, SeedConfig, SessionConfig};
use rios_shared::auth::jwt::{create_token, Claims};
use rios_shared::db::{MemoryStore, Repository, Store};
use rios_shared::models::company::Company;
use rios_shared::models::entity::Entity;
use rios_shared::models::user::{CreateUser, Role, User};
use rios_shared::seed::ensure_seed_data;
use rios_shared::service::EntityService;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const ADMIN_EMAIL: &str = "admin@rios.com";
pub const ADMIN_PASSWORD: &str = "admin123";

/// Response parts tests look at
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// All `Set-Cookie` header values
    pub fn set_cookies(&self) -> Vec<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .map(str::to_string)
            .collect()
    }
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: Router,
    pub config: Config,
    pub admin: User,
    pub superadmin: User,
    pub user: User,
    pub other_user: User,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            production: false,
        },
        database: DatabaseConfig {
            url: "memory://".to_string(),
            max_connections: 1,
        },
        session: SessionConfig {
            secret: SECRET.to_string(),
            token_ttl_hours: 24,
            cookie_max_age_days: 7,
        },
        cors: CorsConfig::default(),
        seed: SeedConfig {
            admin_email: ADMIN_EMAIL.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
            admin_name: "Administrador".to_string(),
        },
    }
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let dyn_store: Arc<dyn Store> = store.clone();

        ensure_seed_data(dyn_store.clone(), &config.seed_admin()).await?;
        let admin = dyn_store
            .find_user_by_email(ADMIN_EMAIL)
            .await?
            .ok_or_else(|| anyhow::anyhow!("seed admin missing"))?;

        // Hashing is only exercised by the seed admin; the others never log in
        let users = EntityService::<User>::new(dyn_store.clone());
        let superadmin = create_user(&users, "super", Role::Superadmin).await?;
        let user = create_user(&users, "ana", Role::User).await?;
        let other_user = create_user(&users, "luis", Role::User).await?;

        let app = build_router(AppState::new(dyn_store, config.clone()));

        Ok(TestContext {
            store,
            app,
            config,
            admin,
            superadmin,
            user,
            other_user,
        })
    }

    /// `Cookie` header value carrying a valid session for `user`
    pub fn cookie_for(&self, user: &User) -> String {
        let claims = Claims::for_user(user, Duration::hours(24));
        format!("auth-token={}", create_token(&claims, SECRET).unwrap())
    }

    pub fn admin_cookie(&self) -> String {
        self.cookie_for(&self.admin)
    }

    /// The company created by seeding
    pub async fn system_company(&self) -> Company {
        Repository::<Company>::list(self.store.as_ref())
            .await
            .unwrap()
            .into_iter()
            .find(|c| c.is_protected())
            .expect("seeded system company")
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, cookie, None).await
    }

    pub async fn post(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::POST, uri, cookie, Some(body)).await
    }

    pub async fn put(&self, uri: &str, cookie: Option<&str>, body: Value) -> TestResponse {
        self.send(Method::PUT, uri, cookie, Some(body)).await
    }

    pub async fn delete(&self, uri: &str, cookie: Option<&str>) -> TestResponse {
        self.send(Method::DELETE, uri, cookie, None).await
    }
}

async fn create_user(
    users: &EntityService<User>,
    name: &str,
    role: Role,
) -> Result<User, rios_shared::service::ServiceError> {
    users
        .create(CreateUser {
            name: Some(name.to_string()),
            email: Some(format!("{}@rios.com", name)),
            password_hash: "not-a-real-hash".to_string(),
            role,
        })
        .await
}

/// A complete company body; `suffix` keeps NIT and email unique
pub fn company_body(suffix: &str) -> Value {
    serde_json::json!({
        "name": format!("Empresa {}", suffix),
        "tipo": "B",
        "nit": format!("900.{}-1", suffix),
        "email": format!("contacto{}@empresa.com", suffix),
        "usuario": "contador",
        "contraseña": "secreto",
        "servidorCorreo": "mail.empresa.com",
        "cedula": "12345",
    })
}

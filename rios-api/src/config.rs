/// Configuration management for the API server
///
/// Configuration is read once at startup and handed to the router through
/// `AppState`; handlers never read the environment.
///
/// # Environment Variables
///
/// - `API_HOST`, `API_PORT`: Bind address (default `0.0.0.0:8080`)
/// - `PRODUCTION`: `true` marks cookies `Secure` and enables HSTS
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default 10)
/// - `JWT_SECRET`: Session signing secret, at least 32 characters (required)
/// - `SESSION_TTL_HOURS`: Token lifetime (default 24)
/// - `SESSION_COOKIE_MAX_AGE_DAYS`: Cookie lifetime (default 7)
/// - `CORS_ORIGINS`: Comma-separated allowed origins
/// - `CORS_ALLOW_CREDENTIALS`: default `true`; `*` origins require it off
/// - `SEED_ADMIN_EMAIL`, `SEED_ADMIN_PASSWORD`, `SEED_ADMIN_NAME`: Seed account
/// - `LOG_FORMAT`: `json` for structured logs (read in `main`)
///
/// # Example
///
/// ```no_run
/// use rios_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::env;

use anyhow::Context;
use chrono::Duration;
use rios_shared::seed::SeedAdmin;
use rios_shared::service::SessionSettings;
use serde::{Deserialize, Serialize};

const DEFAULT_TOKEN_TTL_HOURS: i64 = 24;

/// Ten years; keeps the cookie `Max-Age` well inside `time::Duration`
const MAX_COOKIE_AGE_DAYS: i64 = 3650;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub session: SessionConfig,
    pub cors: CorsConfig,
    pub seed: SeedConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Running behind HTTPS
    pub production: bool,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Session token and cookie configuration
///
/// The token expiry is authoritative; the cookie may outlive it, in which
/// case the client gets a 401 and logs in again.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// HS256 secret
    ///
    /// Must be at least 32 bytes. Generate with: `openssl rand -hex 32`
    #[serde(skip_serializing)]
    pub secret: String,

    pub token_ttl_hours: i64,

    pub cookie_max_age_days: i64,
}

/// Cross-origin policy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Allowed origins; `*` mirrors the request origin
    pub allowed_origins: Vec<String>,

    pub allow_credentials: bool,

    pub allowed_methods: Vec<String>,

    pub allowed_headers: Vec<String>,

    pub max_age_seconds: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["http://localhost:3000".to_string()],
            allow_credentials: true,
            allowed_methods: ["GET", "POST", "PUT", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| m.to_string())
                .collect(),
            allowed_headers: vec!["content-type".to_string()],
            max_age_seconds: 3600,
        }
    }
}

/// Account created on first start
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    pub admin_email: String,

    #[serde(skip_serializing)]
    pub admin_password: String,

    pub admin_name: String,
}

fn list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

fn flag(value: &str) -> bool {
    matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes")
}

impl Config {
    /// Loads configuration from environment variables (and `.env`)
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing or a value does
    /// not parse.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let port = var("API_PORT", "8080")
            .parse::<u16>()
            .context("API_PORT must be a port number")?;

        let database_url = get("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;
        let max_connections = var("DATABASE_MAX_CONNECTIONS", "10")
            .parse::<u32>()
            .context("DATABASE_MAX_CONNECTIONS must be a number")?;

        let secret = get("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;
        if secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let token_ttl_hours = var("SESSION_TTL_HOURS", "24")
            .parse::<i64>()
            .context("SESSION_TTL_HOURS must be a number")?;
        let cookie_max_age_days = var("SESSION_COOKIE_MAX_AGE_DAYS", "7")
            .parse::<i64>()
            .context("SESSION_COOKIE_MAX_AGE_DAYS must be a number")?;
        if token_ttl_hours <= 0 || cookie_max_age_days <= 0 {
            anyhow::bail!("Session lifetimes must be positive");
        }
        if Duration::try_hours(token_ttl_hours).is_none() {
            anyhow::bail!("SESSION_TTL_HOURS is out of range");
        }
        if cookie_max_age_days > MAX_COOKIE_AGE_DAYS {
            anyhow::bail!("SESSION_COOKIE_MAX_AGE_DAYS must be at most {MAX_COOKIE_AGE_DAYS}");
        }

        let mut cors = CorsConfig::default();
        if let Some(origins) = get("CORS_ORIGINS") {
            cors.allowed_origins = list(&origins);
        }
        if let Some(credentials) = get("CORS_ALLOW_CREDENTIALS") {
            cors.allow_credentials = flag(&credentials);
        }
        if cors.allow_credentials && cors.allowed_origins.iter().any(|o| o == "*") {
            anyhow::bail!("CORS_ORIGINS cannot contain '*' while CORS_ALLOW_CREDENTIALS is enabled");
        }

        Ok(Self {
            api: ApiConfig {
                host: var("API_HOST", "0.0.0.0"),
                port,
                production: get("PRODUCTION").map(|v| flag(&v)).unwrap_or(false),
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            session: SessionConfig {
                secret,
                token_ttl_hours,
                cookie_max_age_days,
            },
            cors,
            seed: SeedConfig {
                admin_email: var("SEED_ADMIN_EMAIL", "admin@rios.com"),
                admin_password: var("SEED_ADMIN_PASSWORD", "admin123"),
                admin_name: var("SEED_ADMIN_NAME", "Administrador"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            secret: self.session.secret.clone(),
            token_ttl: Duration::try_hours(self.session.token_ttl_hours)
                .unwrap_or_else(|| Duration::hours(DEFAULT_TOKEN_TTL_HOURS)),
        }
    }

    pub fn seed_admin(&self) -> SeedAdmin {
        SeedAdmin {
            email: self.seed.admin_email.clone(),
            password: self.seed.admin_password.clone(),
            name: self.seed.admin_name.clone(),
        }
    }
}

//! Configuration management for the API server
//!
//! Loads configuration from environment variables (with `.env` support in
//! development) into a typed struct.
//!
//! # Environment Variables
//!
//! - `API_HOST`: host to bind to (default: 0.0.0.0)
//! - `API_PORT`: port to bind to (default: 8080)
//! - `JWT_SECRET`: secret key for JWT signing (required, ≥ 32 chars)
//! - `STORAGE_BACKEND`: `postgres` or `memory`; defaults to `postgres`
//!   when `DATABASE_URL` is set, `memory` otherwise
//! - `DATABASE_URL`: PostgreSQL connection string (required for postgres)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
//! - `CORS_ORIGINS`: comma-separated allowed origins (default: `*`)
//! - `PRODUCTION`: `true` enables HSTS and strict CORS

use serde::{Deserialize, Serialize};
use std::env;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Storage backend configuration
    pub storage: StorageConfig,

    /// JWT configuration
    pub jwt: JwtConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `["*"]` means permissive (development)
    pub cors_origins: Vec<String>,

    /// Production mode: HSTS on, CORS restricted to the listed origins
    pub production: bool,
}

/// Which storage backend the server runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// sqlx over PostgreSQL
    Postgres,

    /// In-memory per-tenant maps with demo seed data
    Memory,
}

/// Storage backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Selected backend; a static startup choice, never per-request
    pub backend: StorageBackend,

    /// PostgreSQL connection URL (postgres backend only)
    pub database_url: Option<String>,

    /// Maximum number of pooled connections
    pub max_connections: u32,
}

/// JWT configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// Must stay secret and be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,
}

impl Config {
    /// Loads configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("API_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins: Vec<String> = env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = env::var("PRODUCTION")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let database_url = env::var("DATABASE_URL").ok();

        let backend = resolve_backend(
            env::var("STORAGE_BACKEND").ok().as_deref(),
            database_url.is_some(),
        )?;

        if backend == StorageBackend::Postgres && database_url.is_none() {
            anyhow::bail!("DATABASE_URL is required when STORAGE_BACKEND=postgres");
        }

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            storage: StorageConfig {
                backend,
                database_url,
                max_connections,
            },
            jwt: JwtConfig { secret: jwt_secret },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

/// Resolves the backend choice from the environment
///
/// An explicit `STORAGE_BACKEND` wins; otherwise the presence of
/// `DATABASE_URL` selects postgres, and a bare environment gets the
/// in-memory demo store.
fn resolve_backend(
    explicit: Option<&str>,
    has_database_url: bool,
) -> anyhow::Result<StorageBackend> {
    match explicit {
        Some("postgres") => Ok(StorageBackend::Postgres),
        Some("memory") => Ok(StorageBackend::Memory),
        Some(other) => anyhow::bail!("Unknown STORAGE_BACKEND: {other} (expected postgres or memory)"),
        None if has_database_url => Ok(StorageBackend::Postgres),
        None => Ok(StorageBackend::Memory),
    }
}

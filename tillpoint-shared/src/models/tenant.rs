//! Tenant model and database operations
//!
//! A tenant is a single shop. It is the root of all per-tenant data and is
//! referenced by foreign key from every other entity. Tenants are looked up
//! by subdomain at login ("shop id" on the login form) and by id everywhere
//! else.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE tenants (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     name VARCHAR(255) NOT NULL,
//!     subdomain VARCHAR(100) NOT NULL UNIQUE,
//!     address TEXT,
//!     phone VARCHAR(20),
//!     email VARCHAR(255),
//!     logo_url VARCHAR(500),
//!     primary_color VARCHAR(7) NOT NULL DEFAULT '#1976D2',
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Tenant model representing a shop
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Tenant {
    /// Unique tenant ID (UUID v4)
    pub id: Uuid,

    /// Shop display name
    pub name: String,

    /// Subdomain used as the shop identifier at login
    ///
    /// Unique across all tenants
    pub subdomain: String,

    /// Optional street address
    pub address: Option<String>,

    /// Optional contact phone number
    pub phone: Option<String>,

    /// Optional contact email
    pub email: Option<String>,

    /// Optional logo image URL
    pub logo_url: Option<String>,

    /// Theme color as a hex string, e.g. `#1976D2`
    pub primary_color: String,

    /// Whether the shop is active; inactive shops cannot log in
    pub is_active: bool,

    /// When the tenant was created
    pub created_at: DateTime<Utc>,

    /// When the tenant was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTenant {
    /// Shop display name
    pub name: String,

    /// Subdomain (must be unique)
    pub subdomain: String,

    /// Optional street address
    pub address: Option<String>,

    /// Optional contact phone number
    pub phone: Option<String>,

    /// Optional contact email
    pub email: Option<String>,

    /// Optional logo image URL
    pub logo_url: Option<String>,

    /// Theme color; defaults to `#1976D2` when absent
    pub primary_color: Option<String>,
}

impl Tenant {
    /// Creates a new tenant in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the subdomain already exists (unique constraint)
    /// or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateTenant) -> Result<Self, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants (name, subdomain, address, phone, email, logo_url, primary_color)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, '#1976D2'))
            RETURNING id, name, subdomain, address, phone, email, logo_url, primary_color,
                      is_active, created_at, updated_at
            "#,
        )
        .bind(data.name)
        .bind(data.subdomain)
        .bind(data.address)
        .bind(data.phone)
        .bind(data.email)
        .bind(data.logo_url)
        .bind(data.primary_color)
        .fetch_one(pool)
        .await?;

        Ok(tenant)
    }

    /// Finds a tenant by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, subdomain, address, phone, email, logo_url, primary_color,
                   is_active, created_at, updated_at
            FROM tenants
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }

    /// Finds a tenant by its subdomain (the shop id presented at login)
    pub async fn find_by_subdomain(
        pool: &PgPool,
        subdomain: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let tenant = sqlx::query_as::<_, Tenant>(
            r#"
            SELECT id, name, subdomain, address, phone, email, logo_url, primary_color,
                   is_active, created_at, updated_at
            FROM tenants
            WHERE subdomain = $1
            "#,
        )
        .bind(subdomain)
        .fetch_optional(pool)
        .await?;

        Ok(tenant)
    }
}

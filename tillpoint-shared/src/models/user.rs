//! User model and database operations
//!
//! Users are staff accounts. Each user belongs to exactly one tenant and
//! carries a role from a fixed set; usernames are unique within a tenant,
//! not globally. Passwords are stored as Argon2id hashes, never plaintext,
//! and the hash is excluded from serialization so it can never leak through
//! an API response.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE user_role AS ENUM ('admin', 'cashier', 'sales_attendant', 'staff');
//!
//! CREATE TABLE users (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     tenant_id UUID NOT NULL REFERENCES tenants(id),
//!     username VARCHAR(100) NOT NULL,
//!     email VARCHAR(255),
//!     password_hash TEXT NOT NULL,
//!     first_name VARCHAR(100),
//!     last_name VARCHAR(100),
//!     role user_role NOT NULL DEFAULT 'staff',
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     UNIQUE (tenant_id, username)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Staff roles
///
/// Role checks are flat set-membership tests: each endpoint declares the
/// roles allowed to call it. There is no hierarchy between roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Shop administrator: catalog, users, and everything cashiers can do
    Admin,

    /// Till operator: checkout, returns, cash handovers
    Cashier,

    /// Floor staff credited on sales they assisted
    SalesAttendant,

    /// Default role with read-only access
    Staff,
}

impl UserRole {
    /// Converts role to its wire string
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Cashier => "cashier",
            UserRole::SalesAttendant => "sales_attendant",
            UserRole::Staff => "staff",
        }
    }

    /// Parses a role from its wire string
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(UserRole::Admin),
            "cashier" => Some(UserRole::Cashier),
            "sales_attendant" => Some(UserRole::SalesAttendant),
            "staff" => Some(UserRole::Staff),
            _ => None,
        }
    }
}

/// User model representing a staff account
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Tenant this user belongs to
    pub tenant_id: Uuid,

    /// Login name, unique within the tenant
    pub username: String,

    /// Optional email address
    pub email: Option<String>,

    /// Argon2id password hash
    ///
    /// Never serialized into API responses.
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Optional first name
    pub first_name: Option<String>,

    /// Optional last name
    pub last_name: Option<String>,

    /// Role within the shop
    pub role: UserRole,

    /// Whether the account can log in
    pub is_active: bool,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new user
#[derive(Debug, Clone)]
pub struct CreateUser {
    /// Tenant the account belongs to
    pub tenant_id: Uuid,

    /// Login name (unique within the tenant)
    pub username: String,

    /// Optional email address
    pub email: Option<String>,

    /// Argon2id password hash (NOT a plaintext password)
    pub password_hash: String,

    /// Optional first name
    pub first_name: Option<String>,

    /// Optional last name
    pub last_name: Option<String>,

    /// Role; defaults to `staff` when absent
    pub role: Option<UserRole>,
}

impl User {
    /// Creates a new user in the database
    ///
    /// # Errors
    ///
    /// Returns an error if the username already exists within the tenant
    /// (unique constraint) or the database connection fails.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (tenant_id, username, email, password_hash, first_name, last_name, role)
            VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, 'staff'::user_role))
            RETURNING id, tenant_id, username, email, password_hash, first_name, last_name,
                      role, is_active, created_at, updated_at
            "#,
        )
        .bind(data.tenant_id)
        .bind(data.username)
        .bind(data.email)
        .bind(data.password_hash)
        .bind(data.first_name)
        .bind(data.last_name)
        .bind(data.role)
        .fetch_one(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by ID
    ///
    /// This lookup is global (no tenant filter) because it resolves the
    /// subject of a bearer token; the tenant comes from the row itself.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, username, email, password_hash, first_name, last_name,
                   role, is_active, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Finds a user by username within a tenant
    pub async fn find_by_username(
        pool: &PgPool,
        tenant_id: Uuid,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, username, email, password_hash, first_name, last_name,
                   role, is_active, created_at, updated_at
            FROM users
            WHERE tenant_id = $1 AND username = $2
            "#,
        )
        .bind(tenant_id)
        .bind(username)
        .fetch_optional(pool)
        .await?;

        Ok(user)
    }

    /// Lists all users of a tenant, newest first
    pub async fn list_by_tenant(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, tenant_id, username, email, password_hash, first_name, last_name,
                   role, is_active, created_at, updated_at
            FROM users
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(users)
    }
}

//! Return model and database operations
//!
//! A return reverses all or part of a sale. It references the original
//! transaction and the user who processed it, and mirrors the transaction's
//! item structure so the refunded lines are auditable. Creating a return is
//! a multi-row write (return + items + restock + status flip) owned by the
//! storage layer, so the insert helpers accept any executor.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE returns (
//!     id UUID PRIMARY KEY,
//!     tenant_id UUID NOT NULL REFERENCES tenants(id),
//!     transaction_id UUID NOT NULL REFERENCES transactions(id),
//!     processed_by_id UUID NOT NULL REFERENCES users(id),
//!     reason VARCHAR(255) NOT NULL,
//!     refund_amount_cents BIGINT NOT NULL,
//!     refund_method payment_method NOT NULL,
//!     notes TEXT,
//!     created_at TIMESTAMPTZ NOT NULL
//! );
//!
//! CREATE TABLE return_items (
//!     id UUID PRIMARY KEY,
//!     return_id UUID NOT NULL REFERENCES returns(id),
//!     product_id UUID NOT NULL REFERENCES products(id),
//!     quantity INTEGER NOT NULL,
//!     unit_price_cents BIGINT NOT NULL,
//!     total_cents BIGINT NOT NULL
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use super::transaction::PaymentMethod;

/// Return model representing a reversed sale
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Return {
    /// Unique return ID (UUID v4)
    pub id: Uuid,

    /// Tenant the return belongs to
    pub tenant_id: Uuid,

    /// The sale being reversed
    pub transaction_id: Uuid,

    /// User who processed the return
    pub processed_by_id: Uuid,

    /// Stated reason for the return
    pub reason: String,

    /// Amount refunded to the customer, in cents
    pub refund_amount_cents: i64,

    /// How the refund was paid out
    pub refund_method: PaymentMethod,

    /// Optional free-form notes
    pub notes: Option<String>,

    /// When the return was processed
    pub created_at: DateTime<Utc>,
}

/// One refunded line, mirroring the original transaction item snapshot
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ReturnItem {
    /// Unique item ID (UUID v4)
    pub id: Uuid,

    /// Return this line belongs to
    pub return_id: Uuid,

    /// Product being returned
    pub product_id: Uuid,

    /// Units returned
    pub quantity: i32,

    /// Unit price from the original sale, in cents
    pub unit_price_cents: i64,

    /// quantity × unit price, in cents
    pub total_cents: i64,
}

impl Return {
    /// Inserts a fully-formed return row
    pub async fn insert<'e>(executor: impl PgExecutor<'e>, r: &Return) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO returns
                (id, tenant_id, transaction_id, processed_by_id, reason,
                 refund_amount_cents, refund_method, notes, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(r.id)
        .bind(r.tenant_id)
        .bind(r.transaction_id)
        .bind(r.processed_by_id)
        .bind(r.reason.as_str())
        .bind(r.refund_amount_cents)
        .bind(r.refund_method)
        .bind(r.notes.as_deref())
        .bind(r.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Lists a tenant's returns, newest first
    pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let returns = sqlx::query_as::<_, Return>(
            r#"
            SELECT id, tenant_id, transaction_id, processed_by_id, reason,
                   refund_amount_cents, refund_method, notes, created_at
            FROM returns
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(returns)
    }
}

impl ReturnItem {
    /// Inserts one refunded line
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        item: &ReturnItem,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO return_items
                (id, return_id, product_id, quantity, unit_price_cents, total_cents)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(item.return_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_cents)
        .execute(executor)
        .await?;

        Ok(())
    }
}

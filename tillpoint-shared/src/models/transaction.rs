//! Transaction model and database operations
//!
//! A transaction is one completed sale: totals, payment method, the cashier
//! who rang it up, and one item row per cart line. Item rows snapshot the
//! unit price at the time of sale, so later catalog edits never rewrite
//! history.
//!
//! Multi-row writes (the checkout sequence, refund flips) run inside a
//! database transaction owned by the storage layer; the insert helpers here
//! therefore accept any executor instead of a pool.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE transaction_status AS ENUM ('pending', 'completed', 'refunded', 'cancelled');
//! CREATE TYPE payment_method AS ENUM ('cash', 'card', 'mobile_money');
//!
//! CREATE TABLE transactions (
//!     id UUID PRIMARY KEY,
//!     tenant_id UUID NOT NULL REFERENCES tenants(id),
//!     cashier_id UUID NOT NULL REFERENCES users(id),
//!     attendant_id UUID REFERENCES users(id),
//!     customer_name VARCHAR(255),
//!     subtotal_cents BIGINT NOT NULL,
//!     tax_cents BIGINT NOT NULL DEFAULT 0,
//!     discount_cents BIGINT NOT NULL DEFAULT 0,
//!     total_cents BIGINT NOT NULL,
//!     status transaction_status NOT NULL DEFAULT 'pending',
//!     payment_method payment_method NOT NULL,
//!     receipt_number VARCHAR(50) NOT NULL,
//!     idempotency_key VARCHAR(100),
//!     notes TEXT,
//!     created_at TIMESTAMPTZ NOT NULL,
//!     updated_at TIMESTAMPTZ NOT NULL,
//!     UNIQUE (tenant_id, idempotency_key)
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Sale lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Refunded,
    Cancelled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Refunded => "refunded",
            TransactionStatus::Cancelled => "cancelled",
        }
    }
}

/// Accepted payment methods
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileMoney,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileMoney => "mobile_money",
        }
    }
}

/// Transaction model representing one sale
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    /// Unique transaction ID (UUID v4)
    pub id: Uuid,

    /// Tenant the sale belongs to
    pub tenant_id: Uuid,

    /// Cashier who rang up the sale
    pub cashier_id: Uuid,

    /// Optional floor attendant credited on the sale
    pub attendant_id: Option<Uuid>,

    /// Optional customer name for the receipt
    pub customer_name: Option<String>,

    /// Sum of line totals in cents
    pub subtotal_cents: i64,

    /// Tax in cents
    pub tax_cents: i64,

    /// Discount in cents
    pub discount_cents: i64,

    /// Amount charged: subtotal + tax - discount
    pub total_cents: i64,

    /// Lifecycle state
    pub status: TransactionStatus,

    /// How the customer paid
    pub payment_method: PaymentMethod,

    /// Human-readable receipt number, e.g. `RCP-1706686800000`
    pub receipt_number: String,

    /// Optional client-supplied key that makes checkout submission
    /// idempotent; unique per tenant
    pub idempotency_key: Option<String>,

    /// Optional free-form notes
    pub notes: Option<String>,

    /// When the sale was created
    pub created_at: DateTime<Utc>,

    /// When the sale was last updated
    pub updated_at: DateTime<Utc>,
}

/// One cart line of a transaction
///
/// `unit_price_cents` and `total_cents` are value snapshots taken at the
/// time of sale, not live references into the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TransactionItem {
    /// Unique item ID (UUID v4)
    pub id: Uuid,

    /// Transaction this line belongs to
    pub transaction_id: Uuid,

    /// Product sold
    pub product_id: Uuid,

    /// Units sold
    pub quantity: i32,

    /// Unit price at time of sale, in cents
    pub unit_price_cents: i64,

    /// quantity × unit price, in cents
    pub total_cents: i64,

    /// When the line was recorded
    pub created_at: DateTime<Utc>,
}

/// Generates a receipt number from the current timestamp
///
/// Format: `RCP-<unix milliseconds>`, matching the numbers printed on
/// customer receipts.
pub fn generate_receipt_number() -> String {
    format!("RCP-{}", Utc::now().timestamp_millis())
}

const TRANSACTION_COLUMNS: &str = "id, tenant_id, cashier_id, attendant_id, customer_name, \
     subtotal_cents, tax_cents, discount_cents, total_cents, status, payment_method, \
     receipt_number, idempotency_key, notes, created_at, updated_at";

impl Transaction {
    /// Inserts a fully-formed transaction row
    ///
    /// Accepts any executor so the storage layer can run this inside the
    /// checkout database transaction.
    pub async fn insert<'e>(executor: impl PgExecutor<'e>, t: &Transaction) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO transactions
                (id, tenant_id, cashier_id, attendant_id, customer_name,
                 subtotal_cents, tax_cents, discount_cents, total_cents,
                 status, payment_method, receipt_number, idempotency_key, notes,
                 created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
            "#,
        )
        .bind(t.id)
        .bind(t.tenant_id)
        .bind(t.cashier_id)
        .bind(t.attendant_id)
        .bind(t.customer_name.as_deref())
        .bind(t.subtotal_cents)
        .bind(t.tax_cents)
        .bind(t.discount_cents)
        .bind(t.total_cents)
        .bind(t.status)
        .bind(t.payment_method)
        .bind(t.receipt_number.as_str())
        .bind(t.idempotency_key.as_deref())
        .bind(t.notes.as_deref())
        .bind(t.created_at)
        .bind(t.updated_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Finds a transaction by ID within a tenant
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE id = $1 AND tenant_id = $2
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        Ok(transaction)
    }

    /// Finds the transaction previously created with an idempotency key
    pub async fn find_by_idempotency_key<'e>(
        executor: impl PgExecutor<'e>,
        tenant_id: Uuid,
        key: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let transaction = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE tenant_id = $1 AND idempotency_key = $2
            "#
        ))
        .bind(tenant_id)
        .bind(key)
        .fetch_optional(executor)
        .await?;

        Ok(transaction)
    }

    /// Lists a tenant's transactions, newest first
    pub async fn list(
        pool: &PgPool,
        tenant_id: Uuid,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let transactions = sqlx::query_as::<_, Transaction>(&format!(
            r#"
            SELECT {TRANSACTION_COLUMNS}
            FROM transactions
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            LIMIT $2
            "#
        ))
        .bind(tenant_id)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(transactions)
    }

    /// Marks a transaction refunded
    pub async fn mark_refunded<'e>(
        executor: impl PgExecutor<'e>,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE transactions
            SET status = 'refunded', updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2 AND status = 'completed'
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}

impl TransactionItem {
    /// Inserts one line item; executor-generic for the same reason as
    /// [`Transaction::insert`]
    pub async fn insert<'e>(
        executor: impl PgExecutor<'e>,
        item: &TransactionItem,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO transaction_items
                (id, transaction_id, product_id, quantity, unit_price_cents, total_cents, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(item.id)
        .bind(item.transaction_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.total_cents)
        .bind(item.created_at)
        .execute(executor)
        .await?;

        Ok(())
    }

    /// Lists the items of a transaction, oldest first
    ///
    /// Joins through the transaction so callers cannot read another
    /// tenant's line items.
    pub async fn list_for_transaction(
        pool: &PgPool,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let items = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT ti.id, ti.transaction_id, ti.product_id, ti.quantity,
                   ti.unit_price_cents, ti.total_cents, ti.created_at
            FROM transaction_items ti
            JOIN transactions t ON t.id = ti.transaction_id
            WHERE ti.transaction_id = $1 AND t.tenant_id = $2
            ORDER BY ti.created_at
            "#,
        )
        .bind(transaction_id)
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(items)
    }
}

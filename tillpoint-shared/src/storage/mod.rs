//! The storage facade
//!
//! All route handlers talk to a single [`Storage`] trait; the concrete
//! backend is a static configuration choice made once at startup:
//!
//! - [`postgres::PgStorage`]: sqlx over PostgreSQL, used in production
//! - [`memory::MemStorage`]: per-tenant locked maps with demo seed data,
//!   used for local operation and the test suites
//!
//! Both implementations enforce the same contract:
//!
//! - every operation is scoped to a tenant id, including cross-entity
//!   references (a sale can only touch products and users of its tenant)
//! - checkout is atomic: stock preconditions are checked before any
//!   decrement, and a failure leaves nothing behind
//! - stock never goes negative
//! - an idempotency key resubmitted to checkout returns the original sale

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::handover::{CashHandover, CreateHandover, UpdateHandover};
use crate::models::product::{CreateProduct, Product, UpdateProduct};
use crate::models::returns::Return;
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::transaction::{PaymentMethod, Transaction, TransactionItem};
use crate::models::user::{CreateUser, User};

pub mod memory;
pub mod postgres;

/// Storage result type alias
pub type StorageResult<T> = Result<T, StorageError>;

/// Error type shared by all storage backends
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A referenced row does not exist (in this tenant)
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A checkout line asked for more units than are on hand
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: Uuid,
        requested: i32,
        available: i32,
    },

    /// A line quantity was zero or negative
    #[error("invalid quantity {0}")]
    InvalidQuantity(i32),

    /// A sale was submitted with no lines
    #[error("a sale needs at least one line")]
    EmptySale,

    /// A return referenced lines that were not part of the original sale,
    /// or asked to return more than was sold
    #[error("invalid return: {0}")]
    InvalidReturn(String),

    /// The transaction has already been refunded
    #[error("transaction has already been refunded")]
    AlreadyRefunded,

    /// A uniqueness rule was violated (subdomain, username, ...)
    #[error("{0}")]
    Conflict(String),

    /// Underlying database failure
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// One cart line submitted at checkout
///
/// Only the product and quantity come from the client; the unit price is
/// snapshotted server-side from the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SaleLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Everything needed to ring up a sale
#[derive(Debug, Clone)]
pub struct SaleDraft {
    pub customer_name: Option<String>,
    pub attendant_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    pub discount_cents: i64,
    /// Optional client key making the submission idempotent
    pub idempotency_key: Option<String>,
    pub notes: Option<String>,
    pub lines: Vec<SaleLine>,
}

/// The outcome of a checkout: the stored transaction and its lines
#[derive(Debug, Clone, Serialize)]
pub struct SaleReceipt {
    pub transaction: Transaction,
    pub items: Vec<TransactionItem>,
}

/// One line of a return request
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReturnLine {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Everything needed to process a return
#[derive(Debug, Clone)]
pub struct ReturnDraft {
    pub transaction_id: Uuid,
    pub reason: String,
    /// Defaults to the original payment method when absent
    pub refund_method: Option<PaymentMethod>,
    pub notes: Option<String>,
    /// `None` returns the whole sale; `Some` returns the listed lines
    pub lines: Option<Vec<ReturnLine>>,
}

/// Dashboard headline numbers for one tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardKpis {
    /// Sum of today's completed transaction totals, in cents
    pub today_sales_cents: i64,

    /// Count of today's transactions (all statuses)
    pub today_transactions: i64,

    /// Active products at or below their low-stock threshold
    pub low_stock_items: i64,

    /// Active staff accounts
    pub active_staff: i64,
}

/// One day of the sales report
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SalesReportRow {
    pub date: NaiveDate,
    pub total_cents: i64,
    pub count: i64,
}

/// The data-access facade used by every route handler
///
/// Mirrors the REST resources one-to-one; see the module docs for the
/// contract both backends uphold.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Short backend identifier for health reporting ("postgres", "memory")
    fn backend_name(&self) -> &'static str;

    /// Cheap liveness probe
    async fn ping(&self) -> StorageResult<()>;

    // Tenant operations
    async fn tenant_by_subdomain(&self, subdomain: &str) -> StorageResult<Option<Tenant>>;
    async fn tenant_by_id(&self, id: Uuid) -> StorageResult<Option<Tenant>>;
    async fn create_tenant(&self, data: CreateTenant) -> StorageResult<Tenant>;

    // User operations
    async fn user_by_id(&self, id: Uuid) -> StorageResult<Option<User>>;
    async fn user_by_username(&self, tenant_id: Uuid, username: &str)
        -> StorageResult<Option<User>>;
    async fn create_user(&self, data: CreateUser) -> StorageResult<User>;
    async fn users_by_tenant(&self, tenant_id: Uuid) -> StorageResult<Vec<User>>;

    // Product operations
    async fn products(&self, tenant_id: Uuid) -> StorageResult<Vec<Product>>;
    async fn product_by_id(&self, tenant_id: Uuid, id: Uuid) -> StorageResult<Option<Product>>;
    async fn product_by_barcode(
        &self,
        tenant_id: Uuid,
        barcode: &str,
    ) -> StorageResult<Option<Product>>;
    async fn create_product(&self, data: CreateProduct) -> StorageResult<Product>;
    async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateProduct,
    ) -> StorageResult<Option<Product>>;
    async fn deactivate_product(&self, tenant_id: Uuid, id: Uuid) -> StorageResult<bool>;

    // Sale operations
    async fn create_sale(
        &self,
        tenant_id: Uuid,
        cashier_id: Uuid,
        draft: SaleDraft,
    ) -> StorageResult<SaleReceipt>;
    async fn transaction_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<Transaction>>;
    async fn transactions(&self, tenant_id: Uuid, limit: i64) -> StorageResult<Vec<Transaction>>;
    async fn transaction_items(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> StorageResult<Vec<TransactionItem>>;

    // Return operations
    async fn create_return(
        &self,
        tenant_id: Uuid,
        processed_by_id: Uuid,
        draft: ReturnDraft,
    ) -> StorageResult<Return>;
    async fn returns(&self, tenant_id: Uuid) -> StorageResult<Vec<Return>>;

    // Cash handover operations
    async fn create_handover(&self, data: CreateHandover) -> StorageResult<CashHandover>;
    async fn handovers(&self, tenant_id: Uuid) -> StorageResult<Vec<CashHandover>>;
    async fn update_handover(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateHandover,
    ) -> StorageResult<Option<CashHandover>>;

    // Analytics operations
    async fn dashboard_kpis(&self, tenant_id: Uuid) -> StorageResult<DashboardKpis>;
    async fn sales_report(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<SalesReportRow>>;
}

/// A return request resolved against the original sale
#[derive(Debug, Clone)]
pub(crate) struct ResolvedReturn {
    pub lines: Vec<ResolvedReturnLine>,
    pub refund_amount_cents: i64,
    /// True when the whole sale is reversed; flips the transaction to
    /// `refunded`
    pub full: bool,
}

/// One resolved return line with the unit price from the sale snapshot
#[derive(Debug, Clone)]
pub(crate) struct ResolvedReturnLine {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price_cents: i64,
}

/// Resolves a return request against what the transaction actually sold
///
/// With no explicit lines the whole sale is returned and the refund is the
/// amount the customer paid (total, tax included). With explicit lines each
/// one must match a sold product and stay within the sold quantity; the
/// refund is the merchandise value of the returned lines at their snapshot
/// prices. Shared by both backends so the rules cannot drift.
pub(crate) fn resolve_return(
    transaction: &Transaction,
    sold: &[TransactionItem],
    requested: Option<Vec<ReturnLine>>,
) -> StorageResult<ResolvedReturn> {
    match requested {
        None => {
            let lines = sold
                .iter()
                .map(|item| ResolvedReturnLine {
                    product_id: item.product_id,
                    quantity: item.quantity,
                    unit_price_cents: item.unit_price_cents,
                })
                .collect();

            Ok(ResolvedReturn {
                lines,
                refund_amount_cents: transaction.total_cents,
                full: true,
            })
        }
        Some(requested) => {
            if requested.is_empty() {
                return Err(StorageError::InvalidReturn(
                    "a return needs at least one line".to_string(),
                ));
            }

            // Fold duplicate product lines together before validating
            let mut quantities: std::collections::HashMap<Uuid, i32> =
                std::collections::HashMap::new();
            for line in &requested {
                if line.quantity <= 0 {
                    return Err(StorageError::InvalidQuantity(line.quantity));
                }
                *quantities.entry(line.product_id).or_insert(0) += line.quantity;
            }

            let mut lines = Vec::with_capacity(quantities.len());
            let mut refund_amount_cents = 0i64;

            for item in sold {
                let Some(&quantity) = quantities.get(&item.product_id) else {
                    continue;
                };
                if quantity > item.quantity {
                    return Err(StorageError::InvalidReturn(format!(
                        "cannot return {} units of product {}: only {} were sold",
                        quantity, item.product_id, item.quantity
                    )));
                }
                refund_amount_cents += crate::money::line_total_cents(item.unit_price_cents, quantity);
                lines.push(ResolvedReturnLine {
                    product_id: item.product_id,
                    quantity,
                    unit_price_cents: item.unit_price_cents,
                });
                quantities.remove(&item.product_id);
            }

            if let Some(unknown) = quantities.keys().next() {
                return Err(StorageError::InvalidReturn(format!(
                    "product {} was not part of the sale",
                    unknown
                )));
            }

            Ok(ResolvedReturn {
                lines,
                refund_amount_cents,
                full: refund_amount_cents == transaction.total_cents,
            })
        }
    }
}

/// Rejects drafts no backend should accept: empty carts and non-positive
/// quantities. Called by both implementations before touching any state.
pub(crate) fn validate_sale_draft(draft: &SaleDraft) -> StorageResult<()> {
    if draft.lines.is_empty() {
        return Err(StorageError::EmptySale);
    }
    for line in &draft.lines {
        if line.quantity <= 0 {
            return Err(StorageError::InvalidQuantity(line.quantity));
        }
    }
    Ok(())
}

/// UTC midnight today and tomorrow, the KPI "today" window
pub(crate) fn today_bounds() -> (DateTime<Utc>, DateTime<Utc>) {
    let start = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
    (start, start + chrono::Duration::days(1))
}

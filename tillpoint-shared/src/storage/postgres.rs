//! PostgreSQL storage backend
//!
//! Wraps the connection pool and the model CRUD functions behind the
//! [`Storage`] facade. Simple reads delegate straight to the models;
//! the multi-row flows (checkout, returns) run here inside a single
//! database transaction with `FOR UPDATE` row locks, so a failure at any
//! step rolls the whole operation back and stock can never be decremented
//! past zero.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::db::pool as db_pool;
use crate::models::handover::{CashHandover, CreateHandover, UpdateHandover};
use crate::models::product::{CreateProduct, Product, UpdateProduct};
use crate::models::returns::{Return, ReturnItem};
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::transaction::{
    generate_receipt_number, Transaction, TransactionItem, TransactionStatus,
};
use crate::models::user::{CreateUser, User};
use crate::money;
use crate::storage::{
    resolve_return, today_bounds, validate_sale_draft, DashboardKpis, ReturnDraft, SaleDraft,
    SaleReceipt, SalesReportRow, Storage, StorageError, StorageResult,
};

/// Row snapshot taken while a product row is locked during checkout
#[derive(Debug, sqlx::FromRow)]
struct ProductSnapshot {
    id: Uuid,
    price_cents: i64,
    stock: i32,
    is_active: bool,
}

/// PostgreSQL-backed storage
#[derive(Clone)]
pub struct PgStorage {
    pool: PgPool,
}

impl PgStorage {
    /// Creates a storage facade over an existing pool
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for shutdown handling
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Storage for PgStorage {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn ping(&self) -> StorageResult<()> {
        db_pool::health_check(&self.pool).await?;
        Ok(())
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> StorageResult<Option<Tenant>> {
        Ok(Tenant::find_by_subdomain(&self.pool, subdomain).await?)
    }

    async fn tenant_by_id(&self, id: Uuid) -> StorageResult<Option<Tenant>> {
        Ok(Tenant::find_by_id(&self.pool, id).await?)
    }

    async fn create_tenant(&self, data: CreateTenant) -> StorageResult<Tenant> {
        Ok(Tenant::create(&self.pool, data).await?)
    }

    async fn user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn user_by_username(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>> {
        Ok(User::find_by_username(&self.pool, tenant_id, username).await?)
    }

    async fn create_user(&self, data: CreateUser) -> StorageResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn users_by_tenant(&self, tenant_id: Uuid) -> StorageResult<Vec<User>> {
        Ok(User::list_by_tenant(&self.pool, tenant_id).await?)
    }

    async fn products(&self, tenant_id: Uuid) -> StorageResult<Vec<Product>> {
        Ok(Product::list_active(&self.pool, tenant_id).await?)
    }

    async fn product_by_id(&self, tenant_id: Uuid, id: Uuid) -> StorageResult<Option<Product>> {
        Ok(Product::find_by_id(&self.pool, tenant_id, id).await?)
    }

    async fn product_by_barcode(
        &self,
        tenant_id: Uuid,
        barcode: &str,
    ) -> StorageResult<Option<Product>> {
        Ok(Product::find_by_barcode(&self.pool, tenant_id, barcode).await?)
    }

    async fn create_product(&self, data: CreateProduct) -> StorageResult<Product> {
        Ok(Product::create(&self.pool, data).await?)
    }

    async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateProduct,
    ) -> StorageResult<Option<Product>> {
        Ok(Product::update(&self.pool, tenant_id, id, data).await?)
    }

    async fn deactivate_product(&self, tenant_id: Uuid, id: Uuid) -> StorageResult<bool> {
        Ok(Product::deactivate(&self.pool, tenant_id, id).await?)
    }

    async fn create_sale(
        &self,
        tenant_id: Uuid,
        cashier_id: Uuid,
        draft: SaleDraft,
    ) -> StorageResult<SaleReceipt> {
        validate_sale_draft(&draft)?;

        let mut tx = self.pool.begin().await?;

        // A repeated idempotency key returns the sale created the first time
        if let Some(key) = draft.idempotency_key.as_deref() {
            if let Some(existing) =
                Transaction::find_by_idempotency_key(&mut *tx, tenant_id, key).await?
            {
                drop(tx);
                debug!(transaction_id = %existing.id, "Idempotent checkout replay");
                let items =
                    TransactionItem::list_for_transaction(&self.pool, tenant_id, existing.id)
                        .await?;
                return Ok(SaleReceipt {
                    transaction: existing,
                    items,
                });
            }
        }

        // The attendant, if named, must work in this shop
        if let Some(attendant_id) = draft.attendant_id {
            let known: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM users WHERE id = $1 AND tenant_id = $2",
            )
            .bind(attendant_id)
            .bind(tenant_id)
            .fetch_one(&mut *tx)
            .await?;

            if known == 0 {
                return Err(StorageError::NotFound("attendant"));
            }
        }

        let now = Utc::now();
        let transaction_id = Uuid::new_v4();
        let mut subtotal_cents = 0i64;
        let mut items = Vec::with_capacity(draft.lines.len());

        for line in &draft.lines {
            // Lock the row so concurrent checkouts serialize on the stock check
            let product = sqlx::query_as::<_, ProductSnapshot>(
                r#"
                SELECT id, price_cents, stock, is_active
                FROM products
                WHERE id = $1 AND tenant_id = $2
                FOR UPDATE
                "#,
            )
            .bind(line.product_id)
            .bind(tenant_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StorageError::NotFound("product"))?;

            if !product.is_active {
                return Err(StorageError::NotFound("product"));
            }
            if product.stock < line.quantity {
                return Err(StorageError::InsufficientStock {
                    product_id: product.id,
                    requested: line.quantity,
                    available: product.stock,
                });
            }

            sqlx::query(
                r#"
                UPDATE products
                SET stock = stock - $3, updated_at = NOW()
                WHERE id = $1 AND tenant_id = $2
                "#,
            )
            .bind(line.product_id)
            .bind(tenant_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;

            let total_cents = money::line_total_cents(product.price_cents, line.quantity);
            subtotal_cents += total_cents;

            items.push(TransactionItem {
                id: Uuid::new_v4(),
                transaction_id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: product.price_cents,
                total_cents,
                created_at: now,
            });
        }

        let tax_cents = money::tax_cents(subtotal_cents);
        let total_cents = subtotal_cents + tax_cents - draft.discount_cents;

        let transaction = Transaction {
            id: transaction_id,
            tenant_id,
            cashier_id,
            attendant_id: draft.attendant_id,
            customer_name: draft.customer_name,
            subtotal_cents,
            tax_cents,
            discount_cents: draft.discount_cents,
            total_cents,
            status: TransactionStatus::Completed,
            payment_method: draft.payment_method,
            receipt_number: generate_receipt_number(),
            idempotency_key: draft.idempotency_key,
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        Transaction::insert(&mut *tx, &transaction).await?;
        for item in &items {
            TransactionItem::insert(&mut *tx, item).await?;
        }

        tx.commit().await?;

        debug!(
            transaction_id = %transaction.id,
            receipt = %transaction.receipt_number,
            total = %money::format_cents(transaction.total_cents),
            "Sale completed"
        );

        Ok(SaleReceipt { transaction, items })
    }

    async fn transaction_by_id(
        &self,
        tenant_id: Uuid,
        id: Uuid,
    ) -> StorageResult<Option<Transaction>> {
        Ok(Transaction::find_by_id(&self.pool, tenant_id, id).await?)
    }

    async fn transactions(&self, tenant_id: Uuid, limit: i64) -> StorageResult<Vec<Transaction>> {
        Ok(Transaction::list(&self.pool, tenant_id, limit).await?)
    }

    async fn transaction_items(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> StorageResult<Vec<TransactionItem>> {
        Ok(TransactionItem::list_for_transaction(&self.pool, tenant_id, transaction_id).await?)
    }

    async fn create_return(
        &self,
        tenant_id: Uuid,
        processed_by_id: Uuid,
        draft: ReturnDraft,
    ) -> StorageResult<Return> {
        let mut tx = self.pool.begin().await?;

        let transaction = sqlx::query_as::<_, Transaction>(
            r#"
            SELECT id, tenant_id, cashier_id, attendant_id, customer_name,
                   subtotal_cents, tax_cents, discount_cents, total_cents,
                   status, payment_method, receipt_number, idempotency_key, notes,
                   created_at, updated_at
            FROM transactions
            WHERE id = $1 AND tenant_id = $2
            FOR UPDATE
            "#,
        )
        .bind(draft.transaction_id)
        .bind(tenant_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(StorageError::NotFound("transaction"))?;

        if transaction.status == TransactionStatus::Refunded {
            return Err(StorageError::AlreadyRefunded);
        }

        let sold = sqlx::query_as::<_, TransactionItem>(
            r#"
            SELECT id, transaction_id, product_id, quantity, unit_price_cents,
                   total_cents, created_at
            FROM transaction_items
            WHERE transaction_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(transaction.id)
        .fetch_all(&mut *tx)
        .await?;

        let resolved = resolve_return(&transaction, &sold, draft.lines)?;

        let return_record = Return {
            id: Uuid::new_v4(),
            tenant_id,
            transaction_id: transaction.id,
            processed_by_id,
            reason: draft.reason,
            refund_amount_cents: resolved.refund_amount_cents,
            refund_method: draft.refund_method.unwrap_or(transaction.payment_method),
            notes: draft.notes,
            created_at: Utc::now(),
        };

        Return::insert(&mut *tx, &return_record).await?;

        for line in &resolved.lines {
            ReturnItem::insert(
                &mut *tx,
                &ReturnItem {
                    id: Uuid::new_v4(),
                    return_id: return_record.id,
                    product_id: line.product_id,
                    quantity: line.quantity,
                    unit_price_cents: line.unit_price_cents,
                    total_cents: money::line_total_cents(line.unit_price_cents, line.quantity),
                },
            )
            .await?;

            // Returned units go back on the shelf
            sqlx::query(
                r#"
                UPDATE products
                SET stock = stock + $3, updated_at = NOW()
                WHERE id = $1 AND tenant_id = $2
                "#,
            )
            .bind(line.product_id)
            .bind(tenant_id)
            .bind(line.quantity)
            .execute(&mut *tx)
            .await?;
        }

        if resolved.full {
            Transaction::mark_refunded(&mut *tx, tenant_id, transaction.id).await?;
        }

        tx.commit().await?;

        debug!(
            return_id = %return_record.id,
            transaction_id = %return_record.transaction_id,
            refund = %money::format_cents(return_record.refund_amount_cents),
            "Return processed"
        );

        Ok(return_record)
    }

    async fn returns(&self, tenant_id: Uuid) -> StorageResult<Vec<Return>> {
        Ok(Return::list(&self.pool, tenant_id).await?)
    }

    async fn create_handover(&self, data: CreateHandover) -> StorageResult<CashHandover> {
        Ok(CashHandover::create(&self.pool, data).await?)
    }

    async fn handovers(&self, tenant_id: Uuid) -> StorageResult<Vec<CashHandover>> {
        Ok(CashHandover::list(&self.pool, tenant_id).await?)
    }

    async fn update_handover(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateHandover,
    ) -> StorageResult<Option<CashHandover>> {
        let Some(mut handover) = CashHandover::find_by_id(&self.pool, tenant_id, id).await? else {
            return Ok(None);
        };

        handover.apply_update(data);
        handover.save(&self.pool).await?;

        Ok(Some(handover))
    }

    async fn dashboard_kpis(&self, tenant_id: Uuid) -> StorageResult<DashboardKpis> {
        let (today, tomorrow) = today_bounds();

        let today_sales_cents: i64 = sqlx::query_scalar(
            r#"
            SELECT COALESCE(SUM(total_cents), 0)::BIGINT
            FROM transactions
            WHERE tenant_id = $1 AND status = 'completed'
              AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .bind(tomorrow)
        .fetch_one(&self.pool)
        .await?;

        let today_transactions: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM transactions
            WHERE tenant_id = $1 AND created_at >= $2 AND created_at < $3
            "#,
        )
        .bind(tenant_id)
        .bind(today)
        .bind(tomorrow)
        .fetch_one(&self.pool)
        .await?;

        let low_stock_items: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM products
            WHERE tenant_id = $1 AND is_active = TRUE AND stock <= min_stock
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        let active_staff: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*)
            FROM users
            WHERE tenant_id = $1 AND is_active = TRUE
            "#,
        )
        .bind(tenant_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(DashboardKpis {
            today_sales_cents,
            today_transactions,
            low_stock_items,
            active_staff,
        })
    }

    async fn sales_report(
        &self,
        tenant_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<SalesReportRow>> {
        let rows = sqlx::query_as::<_, SalesReportRow>(
            r#"
            SELECT created_at::DATE AS date,
                   COALESCE(SUM(total_cents), 0)::BIGINT AS total_cents,
                   COUNT(*) AS count
            FROM transactions
            WHERE tenant_id = $1 AND status = 'completed'
              AND created_at >= $2 AND created_at < $3
            GROUP BY created_at::DATE
            ORDER BY created_at::DATE
            "#,
        )
        .bind(tenant_id)
        .bind(start)
        .bind(end)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

//! In-memory storage backend
//!
//! Holds every tenant's data in process-local maps for local operation and
//! the test suites. One RwLock-guarded shard per tenant: requests for
//! different shops never contend, while checkout takes its shard's write
//! lock for the whole sequence, giving the same all-or-nothing behavior as
//! the SQL transaction in the PostgreSQL backend.
//!
//! Ships with demo seed data (shop `demo`, user `admin` / `admin123`, two
//! stocked products) so the server is usable out of the box without a
//! database.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info};
use uuid::Uuid;

use crate::auth::password;
use crate::models::handover::{CashHandover, CreateHandover, UpdateHandover};
use crate::models::product::{CreateProduct, Product, ProductCategory, UpdateProduct};
use crate::models::returns::{Return, ReturnItem};
use crate::models::tenant::{CreateTenant, Tenant};
use crate::models::transaction::{
    generate_receipt_number, Transaction, TransactionItem, TransactionStatus,
};
use crate::models::user::{CreateUser, User, UserRole};
use crate::money;
use crate::storage::{
    resolve_return, today_bounds, validate_sale_draft, DashboardKpis, ReturnDraft, SaleDraft,
    SaleReceipt, SalesReportRow, Storage, StorageError, StorageResult,
};

/// All rows belonging to one tenant
#[derive(Default)]
struct TenantShard {
    users: HashMap<Uuid, User>,
    products: HashMap<Uuid, Product>,
    transactions: HashMap<Uuid, Transaction>,
    /// Line items keyed by transaction id
    transaction_items: HashMap<Uuid, Vec<TransactionItem>>,
    returns: HashMap<Uuid, Return>,
    /// Refunded lines keyed by return id
    return_items: HashMap<Uuid, Vec<ReturnItem>>,
    handovers: HashMap<Uuid, CashHandover>,
    /// Idempotency key → transaction id
    sales_by_key: HashMap<String, Uuid>,
}

/// In-memory storage with per-tenant locking
#[derive(Default)]
pub struct MemStorage {
    tenants: RwLock<HashMap<Uuid, Tenant>>,
    subdomains: RwLock<HashMap<String, Uuid>>,
    /// user id → tenant id, for the global token-subject lookup
    user_index: RwLock<HashMap<Uuid, Uuid>>,
    shards: RwLock<HashMap<Uuid, Arc<RwLock<TenantShard>>>>,
}

impl MemStorage {
    /// Creates an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store seeded with the demo shop
    ///
    /// Demo credentials: shop `demo`, username `admin`, password `admin123`.
    pub async fn with_demo_data() -> anyhow::Result<Self> {
        let storage = Self::new();

        let tenant = storage
            .create_tenant(CreateTenant {
                name: "Demo Shop".to_string(),
                subdomain: "demo".to_string(),
                address: Some("123 Demo Street".to_string()),
                phone: Some("+1234567890".to_string()),
                email: Some("demo@shop.com".to_string()),
                logo_url: None,
                primary_color: None,
            })
            .await?;

        storage
            .create_user(CreateUser {
                tenant_id: tenant.id,
                username: "admin".to_string(),
                email: Some("admin@shop.com".to_string()),
                password_hash: password::hash_password("admin123")?,
                first_name: Some("Admin".to_string()),
                last_name: Some("User".to_string()),
                role: Some(UserRole::Admin),
            })
            .await?;

        storage
            .create_product(CreateProduct {
                tenant_id: tenant.id,
                name: "Coca Cola".to_string(),
                description: Some("Classic Coca Cola 500ml".to_string()),
                sku: "CC-500".to_string(),
                barcode: Some("123456789".to_string()),
                category: Some(ProductCategory::Beverages),
                price_cents: 250,
                cost_cents: Some(150),
                stock: Some(50),
                min_stock: Some(10),
                image_url: None,
            })
            .await?;

        storage
            .create_product(CreateProduct {
                tenant_id: tenant.id,
                name: "Bread".to_string(),
                description: Some("Fresh white bread".to_string()),
                sku: "BR-001".to_string(),
                barcode: Some("987654321".to_string()),
                category: Some(ProductCategory::Household),
                price_cents: 150,
                cost_cents: Some(80),
                stock: Some(25),
                min_stock: Some(5),
                image_url: None,
            })
            .await?;

        info!(tenant_id = %tenant.id, "Seeded in-memory storage with demo shop");

        Ok(storage)
    }

    /// Looks up a tenant's shard
    async fn shard(&self, tenant_id: Uuid) -> StorageResult<Arc<RwLock<TenantShard>>> {
        self.shards
            .read()
            .await
            .get(&tenant_id)
            .cloned()
            .ok_or(StorageError::NotFound("tenant"))
    }
}

#[async_trait]
impl Storage for MemStorage {
    fn backend_name(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> StorageResult<()> {
        Ok(())
    }

    async fn tenant_by_subdomain(&self, subdomain: &str) -> StorageResult<Option<Tenant>> {
        let Some(tenant_id) = self.subdomains.read().await.get(subdomain).copied() else {
            return Ok(None);
        };
        Ok(self.tenants.read().await.get(&tenant_id).cloned())
    }

    async fn tenant_by_id(&self, id: Uuid) -> StorageResult<Option<Tenant>> {
        Ok(self.tenants.read().await.get(&id).cloned())
    }

    async fn create_tenant(&self, data: CreateTenant) -> StorageResult<Tenant> {
        let mut subdomains = self.subdomains.write().await;
        if subdomains.contains_key(&data.subdomain) {
            return Err(StorageError::Conflict(format!(
                "subdomain {} already exists",
                data.subdomain
            )));
        }

        let now = Utc::now();
        let tenant = Tenant {
            id: Uuid::new_v4(),
            name: data.name,
            subdomain: data.subdomain,
            address: data.address,
            phone: data.phone,
            email: data.email,
            logo_url: data.logo_url,
            primary_color: data.primary_color.unwrap_or_else(|| "#1976D2".to_string()),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        subdomains.insert(tenant.subdomain.clone(), tenant.id);
        self.tenants.write().await.insert(tenant.id, tenant.clone());
        self.shards
            .write()
            .await
            .insert(tenant.id, Arc::new(RwLock::new(TenantShard::default())));

        Ok(tenant)
    }

    async fn user_by_id(&self, id: Uuid) -> StorageResult<Option<User>> {
        let Some(tenant_id) = self.user_index.read().await.get(&id).copied() else {
            return Ok(None);
        };
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        Ok(shard.users.get(&id).cloned())
    }

    async fn user_by_username(
        &self,
        tenant_id: Uuid,
        username: &str,
    ) -> StorageResult<Option<User>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        Ok(shard
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn create_user(&self, data: CreateUser) -> StorageResult<User> {
        let shard = self.shard(data.tenant_id).await?;
        let mut shard = shard.write().await;

        if shard.users.values().any(|u| u.username == data.username) {
            return Err(StorageError::Conflict(format!(
                "username {} already exists",
                data.username
            )));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            tenant_id: data.tenant_id,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            first_name: data.first_name,
            last_name: data.last_name,
            role: data.role.unwrap_or(UserRole::Staff),
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        shard.users.insert(user.id, user.clone());
        self.user_index
            .write()
            .await
            .insert(user.id, user.tenant_id);

        Ok(user)
    }

    async fn users_by_tenant(&self, tenant_id: Uuid) -> StorageResult<Vec<User>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        let mut users: Vec<User> = shard.users.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn products(&self, tenant_id: Uuid) -> StorageResult<Vec<Product>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        let mut products: Vec<Product> = shard
            .products
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        products.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(products)
    }

    async fn product_by_id(&self, tenant_id: Uuid, id: Uuid) -> StorageResult<Option<Product>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        Ok(shard.products.get(&id).cloned())
    }

    async fn product_by_barcode(
        &self,
        tenant_id: Uuid,
        barcode: &str,
    ) -> StorageResult<Option<Product>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        Ok(shard
            .products
            .values()
            .find(|p| p.barcode.as_deref() == Some(barcode))
            .cloned())
    }

    async fn create_product(&self, data: CreateProduct) -> StorageResult<Product> {
        let shard = self.shard(data.tenant_id).await?;
        let mut shard = shard.write().await;

        let now = Utc::now();
        let product = Product {
            id: Uuid::new_v4(),
            tenant_id: data.tenant_id,
            name: data.name,
            description: data.description,
            sku: data.sku,
            barcode: data.barcode,
            category: data.category.unwrap_or(ProductCategory::Other),
            price_cents: data.price_cents,
            cost_cents: data.cost_cents,
            stock: data.stock.unwrap_or(0),
            min_stock: data.min_stock.unwrap_or(0),
            image_url: data.image_url,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        shard.products.insert(product.id, product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateProduct,
    ) -> StorageResult<Option<Product>> {
        let shard = self.shard(tenant_id).await?;
        let mut shard = shard.write().await;

        let Some(product) = shard.products.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = data.name {
            product.name = name;
        }
        if let Some(description) = data.description {
            product.description = description;
        }
        if let Some(sku) = data.sku {
            product.sku = sku;
        }
        if let Some(barcode) = data.barcode {
            product.barcode = barcode;
        }
        if let Some(category) = data.category {
            product.category = category;
        }
        if let Some(price_cents) = data.price_cents {
            product.price_cents = price_cents;
        }
        if let Some(cost_cents) = data.cost_cents {
            product.cost_cents = cost_cents;
        }
        if let Some(stock) = data.stock {
            product.stock = stock;
        }
        if let Some(min_stock) = data.min_stock {
            product.min_stock = min_stock;
        }
        if let Some(image_url) = data.image_url {
            product.image_url = image_url;
        }
        if let Some(is_active) = data.is_active {
            product.is_active = is_active;
        }
        product.updated_at = Utc::now();

        Ok(Some(product.clone()))
    }

    async fn deactivate_product(&self, tenant_id: Uuid, id: Uuid) -> StorageResult<bool> {
        let shard = self.shard(tenant_id).await?;
        let mut shard = shard.write().await;

        match shard.products.get_mut(&id) {
            Some(product) => {
                product.is_active = false;
                product.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn create_sale(
        &self,
        tenant_id: Uuid,
        cashier_id: Uuid,
        draft: SaleDraft,
    ) -> StorageResult<SaleReceipt> {
        validate_sale_draft(&draft)?;

        let shard = self.shard(tenant_id).await?;
        // Hold the shard's write lock for the whole sequence so the stock
        // check and decrement are one atomic step
        let mut shard = shard.write().await;

        if let Some(key) = draft.idempotency_key.as_deref() {
            if let Some(&existing_id) = shard.sales_by_key.get(key) {
                debug!(transaction_id = %existing_id, "Idempotent checkout replay");
                let transaction = shard
                    .transactions
                    .get(&existing_id)
                    .cloned()
                    .ok_or(StorageError::NotFound("transaction"))?;
                let items = shard
                    .transaction_items
                    .get(&existing_id)
                    .cloned()
                    .unwrap_or_default();
                return Ok(SaleReceipt { transaction, items });
            }
        }

        if let Some(attendant_id) = draft.attendant_id {
            if !shard.users.contains_key(&attendant_id) {
                return Err(StorageError::NotFound("attendant"));
            }
        }

        // Validate every line against current stock before mutating anything
        let mut required: HashMap<Uuid, i32> = HashMap::new();
        for line in &draft.lines {
            *required.entry(line.product_id).or_insert(0) += line.quantity;
        }
        for (&product_id, &quantity) in &required {
            let product = shard
                .products
                .get(&product_id)
                .filter(|p| p.is_active)
                .ok_or(StorageError::NotFound("product"))?;
            if product.stock < quantity {
                return Err(StorageError::InsufficientStock {
                    product_id,
                    requested: quantity,
                    available: product.stock,
                });
            }
        }

        let now = Utc::now();
        let transaction_id = Uuid::new_v4();
        let mut subtotal_cents = 0i64;
        let mut items = Vec::with_capacity(draft.lines.len());

        for line in &draft.lines {
            let product = shard
                .products
                .get_mut(&line.product_id)
                .ok_or(StorageError::NotFound("product"))?;
            product.stock -= line.quantity;
            product.updated_at = now;

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
            idempotency_key: draft.idempotency_key.clone(),
            notes: draft.notes,
            created_at: now,
            updated_at: now,
        };

        shard
            .transactions
            .insert(transaction.id, transaction.clone());
        shard
            .transaction_items
            .insert(transaction.id, items.clone());
        if let Some(key) = draft.idempotency_key {
            shard.sales_by_key.insert(key, transaction.id);
        }

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
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        Ok(shard.transactions.get(&id).cloned())
    }

    async fn transactions(&self, tenant_id: Uuid, limit: i64) -> StorageResult<Vec<Transaction>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        let mut transactions: Vec<Transaction> = shard.transactions.values().cloned().collect();
        transactions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transactions.truncate(limit.max(0) as usize);
        Ok(transactions)
    }

    async fn transaction_items(
        &self,
        tenant_id: Uuid,
        transaction_id: Uuid,
    ) -> StorageResult<Vec<TransactionItem>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        Ok(shard
            .transaction_items
            .get(&transaction_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn create_return(
        &self,
        tenant_id: Uuid,
        processed_by_id: Uuid,
        draft: ReturnDraft,
    ) -> StorageResult<Return> {
        let shard = self.shard(tenant_id).await?;
        let mut shard = shard.write().await;

        let transaction = shard
            .transactions
            .get(&draft.transaction_id)
            .cloned()
            .ok_or(StorageError::NotFound("transaction"))?;

        if transaction.status == TransactionStatus::Refunded {
            return Err(StorageError::AlreadyRefunded);
        }

        let sold = shard
            .transaction_items
            .get(&transaction.id)
            .cloned()
            .unwrap_or_default();

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

        let return_items: Vec<ReturnItem> = resolved
            .lines
            .iter()
            .map(|line| ReturnItem {
                id: Uuid::new_v4(),
                return_id: return_record.id,
                product_id: line.product_id,
                quantity: line.quantity,
                unit_price_cents: line.unit_price_cents,
                total_cents: money::line_total_cents(line.unit_price_cents, line.quantity),
            })
            .collect();

        // Returned units go back on the shelf
        for line in &resolved.lines {
            if let Some(product) = shard.products.get_mut(&line.product_id) {
                product.stock += line.quantity;
                product.updated_at = Utc::now();
            }
        }

        if resolved.full {
            if let Some(stored) = shard.transactions.get_mut(&transaction.id) {
                stored.status = TransactionStatus::Refunded;
                stored.updated_at = Utc::now();
            }
        }

        shard
            .return_items
            .insert(return_record.id, return_items);
        shard
            .returns
            .insert(return_record.id, return_record.clone());

        Ok(return_record)
    }

    async fn returns(&self, tenant_id: Uuid) -> StorageResult<Vec<Return>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        let mut returns: Vec<Return> = shard.returns.values().cloned().collect();
        returns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(returns)
    }

    async fn create_handover(&self, data: CreateHandover) -> StorageResult<CashHandover> {
        let shard = self.shard(data.tenant_id).await?;
        let mut shard = shard.write().await;

        let handover = CashHandover {
            id: Uuid::new_v4(),
            tenant_id: data.tenant_id,
            cashier_id: data.cashier_id,
            supervisor_id: data.supervisor_id,
            shift_date: data.shift_date,
            expected_cents: data.expected_cents,
            actual_cents: data.actual_cents,
            difference_cents: data.actual_cents - data.expected_cents,
            denominations: data.denominations,
            notes: data.notes,
            is_submitted: data.is_submitted,
            created_at: Utc::now(),
        };

        shard.handovers.insert(handover.id, handover.clone());
        Ok(handover)
    }

    async fn handovers(&self, tenant_id: Uuid) -> StorageResult<Vec<CashHandover>> {
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;
        let mut handovers: Vec<CashHandover> = shard.handovers.values().cloned().collect();
        handovers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(handovers)
    }

    async fn update_handover(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateHandover,
    ) -> StorageResult<Option<CashHandover>> {
        let shard = self.shard(tenant_id).await?;
        let mut shard = shard.write().await;

        let Some(handover) = shard.handovers.get_mut(&id) else {
            return Ok(None);
        };

        handover.apply_update(data);
        Ok(Some(handover.clone()))
    }

    async fn dashboard_kpis(&self, tenant_id: Uuid) -> StorageResult<DashboardKpis> {
        let (today, tomorrow) = today_bounds();

        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;

        let todays: Vec<&Transaction> = shard
            .transactions
            .values()
            .filter(|t| t.created_at >= today && t.created_at < tomorrow)
            .collect();

        let today_sales_cents = todays
            .iter()
            .filter(|t| t.status == TransactionStatus::Completed)
            .map(|t| t.total_cents)
            .sum();

        let low_stock_items = shard
            .products
            .values()
            .filter(|p| p.is_active && p.is_low_stock())
            .count() as i64;

        let active_staff = shard.users.values().filter(|u| u.is_active).count() as i64;

        Ok(DashboardKpis {
            today_sales_cents,
            today_transactions: todays.len() as i64,
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
        let shard = self.shard(tenant_id).await?;
        let shard = shard.read().await;

        let mut by_date: HashMap<chrono::NaiveDate, (i64, i64)> = HashMap::new();
        for t in shard.transactions.values() {
            if t.status != TransactionStatus::Completed
                || t.created_at < start
                || t.created_at >= end
            {
                continue;
            }
            let entry = by_date.entry(t.created_at.date_naive()).or_insert((0, 0));
            entry.0 += t.total_cents;
            entry.1 += 1;
        }

        let mut rows: Vec<SalesReportRow> = by_date
            .into_iter()
            .map(|(date, (total_cents, count))| SalesReportRow {
                date,
                total_cents,
                count,
            })
            .collect();
        rows.sort_by_key(|row| row.date);

        Ok(rows)
    }
}

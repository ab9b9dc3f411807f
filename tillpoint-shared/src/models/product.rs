//! Product model and database operations
//!
//! The catalog, scoped per tenant. Deleting a product only clears its
//! `is_active` flag so historical transaction items keep a valid reference;
//! listings filter inactive rows out.
//!
//! # Schema
//!
//! ```sql
//! CREATE TYPE product_category AS ENUM
//!     ('beverages', 'snacks', 'electronics', 'household', 'other');
//!
//! CREATE TABLE products (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     tenant_id UUID NOT NULL REFERENCES tenants(id),
//!     name VARCHAR(255) NOT NULL,
//!     description TEXT,
//!     sku VARCHAR(100) NOT NULL,
//!     barcode VARCHAR(100),
//!     category product_category NOT NULL DEFAULT 'other',
//!     price_cents BIGINT NOT NULL CHECK (price_cents >= 0),
//!     cost_cents BIGINT,
//!     stock INTEGER NOT NULL DEFAULT 0 CHECK (stock >= 0),
//!     min_stock INTEGER NOT NULL DEFAULT 0,
//!     image_url VARCHAR(500),
//!     is_active BOOLEAN NOT NULL DEFAULT TRUE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
//!     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Product categories shown as catalog filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "product_category", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Beverages,
    Snacks,
    Electronics,
    Household,
    Other,
}

impl ProductCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Beverages => "beverages",
            ProductCategory::Snacks => "snacks",
            ProductCategory::Electronics => "electronics",
            ProductCategory::Household => "household",
            ProductCategory::Other => "other",
        }
    }
}

/// Product model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    /// Unique product ID (UUID v4)
    pub id: Uuid,

    /// Tenant this product belongs to
    pub tenant_id: Uuid,

    /// Display name
    pub name: String,

    /// Optional long description
    pub description: Option<String>,

    /// Stock-keeping unit
    pub sku: String,

    /// Optional scannable barcode
    pub barcode: Option<String>,

    /// Catalog category
    pub category: ProductCategory,

    /// Sale price in cents
    pub price_cents: i64,

    /// Optional purchase cost in cents
    pub cost_cents: Option<i64>,

    /// Units on hand; never negative
    pub stock: i32,

    /// Threshold below which the product counts as low stock
    pub min_stock: i32,

    /// Optional image URL
    pub image_url: Option<String>,

    /// Soft-delete marker; inactive products are hidden from listings
    pub is_active: bool,

    /// When the product was created
    pub created_at: DateTime<Utc>,

    /// When the product was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a new product
#[derive(Debug, Clone)]
pub struct CreateProduct {
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub sku: String,
    pub barcode: Option<String>,
    /// Defaults to `other` when absent
    pub category: Option<ProductCategory>,
    pub price_cents: i64,
    pub cost_cents: Option<i64>,
    /// Defaults to 0 when absent
    pub stock: Option<i32>,
    /// Defaults to 0 when absent
    pub min_stock: Option<i32>,
    pub image_url: Option<String>,
}

/// Input for updating an existing product
///
/// All fields are optional; only present fields are written. Nullable
/// columns use `Option<Option<T>>` so that JSON `null` clears the value
/// while an absent field leaves it untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub description: Option<Option<String>>,
    pub sku: Option<String>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub barcode: Option<Option<String>>,
    pub category: Option<ProductCategory>,
    pub price_cents: Option<i64>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub cost_cents: Option<Option<i64>>,
    pub stock: Option<i32>,
    pub min_stock: Option<i32>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub image_url: Option<Option<String>>,
    pub is_active: Option<bool>,
}

const PRODUCT_COLUMNS: &str = "id, tenant_id, name, description, sku, barcode, category, \
     price_cents, cost_cents, stock, min_stock, image_url, is_active, created_at, updated_at";

impl Product {
    /// Creates a new product
    pub async fn create(pool: &PgPool, data: CreateProduct) -> Result<Self, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products
                (tenant_id, name, description, sku, barcode, category,
                 price_cents, cost_cents, stock, min_stock, image_url)
            VALUES ($1, $2, $3, $4, $5, COALESCE($6, 'other'::product_category),
                    $7, $8, COALESCE($9, 0), COALESCE($10, 0), $11)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(data.tenant_id)
        .bind(data.name)
        .bind(data.description)
        .bind(data.sku)
        .bind(data.barcode)
        .bind(data.category)
        .bind(data.price_cents)
        .bind(data.cost_cents)
        .bind(data.stock)
        .bind(data.min_stock)
        .bind(data.image_url)
        .fetch_one(pool)
        .await?;

        Ok(product)
    }

    /// Lists a tenant's active products, name-ordered
    pub async fn list_active(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let products = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE tenant_id = $1 AND is_active = TRUE
            ORDER BY name
            "#
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(products)
    }

    /// Finds a product by ID within a tenant
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE id = $1 AND tenant_id = $2
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    /// Finds a product by barcode within a tenant
    pub async fn find_by_barcode(
        pool: &PgPool,
        tenant_id: Uuid,
        barcode: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        let product = sqlx::query_as::<_, Product>(&format!(
            r#"
            SELECT {PRODUCT_COLUMNS}
            FROM products
            WHERE tenant_id = $1 AND barcode = $2
            "#
        ))
        .bind(tenant_id)
        .bind(barcode)
        .fetch_optional(pool)
        .await?;

        Ok(product)
    }

    /// Updates a product, writing only the fields present in `data`
    ///
    /// Returns the updated product, or `None` if no product with that id
    /// exists in the tenant.
    pub async fn update(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build the UPDATE dynamically from the present fields
        let mut query = String::from("UPDATE products SET updated_at = NOW()");
        let mut bind_count = 2;

        if data.name.is_some() {
            bind_count += 1;
            query.push_str(&format!(", name = ${}", bind_count));
        }
        if data.description.is_some() {
            bind_count += 1;
            query.push_str(&format!(", description = ${}", bind_count));
        }
        if data.sku.is_some() {
            bind_count += 1;
            query.push_str(&format!(", sku = ${}", bind_count));
        }
        if data.barcode.is_some() {
            bind_count += 1;
            query.push_str(&format!(", barcode = ${}", bind_count));
        }
        if data.category.is_some() {
            bind_count += 1;
            query.push_str(&format!(", category = ${}", bind_count));
        }
        if data.price_cents.is_some() {
            bind_count += 1;
            query.push_str(&format!(", price_cents = ${}", bind_count));
        }
        if data.cost_cents.is_some() {
            bind_count += 1;
            query.push_str(&format!(", cost_cents = ${}", bind_count));
        }
        if data.stock.is_some() {
            bind_count += 1;
            query.push_str(&format!(", stock = ${}", bind_count));
        }
        if data.min_stock.is_some() {
            bind_count += 1;
            query.push_str(&format!(", min_stock = ${}", bind_count));
        }
        if data.image_url.is_some() {
            bind_count += 1;
            query.push_str(&format!(", image_url = ${}", bind_count));
        }
        if data.is_active.is_some() {
            bind_count += 1;
            query.push_str(&format!(", is_active = ${}", bind_count));
        }

        query.push_str(&format!(
            " WHERE id = $1 AND tenant_id = $2 RETURNING {PRODUCT_COLUMNS}"
        ));

        let mut q = sqlx::query_as::<_, Product>(&query).bind(id).bind(tenant_id);

        if let Some(name) = data.name {
            q = q.bind(name);
        }
        if let Some(description) = data.description {
            q = q.bind(description);
        }
        if let Some(sku) = data.sku {
            q = q.bind(sku);
        }
        if let Some(barcode) = data.barcode {
            q = q.bind(barcode);
        }
        if let Some(category) = data.category {
            q = q.bind(category);
        }
        if let Some(price_cents) = data.price_cents {
            q = q.bind(price_cents);
        }
        if let Some(cost_cents) = data.cost_cents {
            q = q.bind(cost_cents);
        }
        if let Some(stock) = data.stock {
            q = q.bind(stock);
        }
        if let Some(min_stock) = data.min_stock {
            q = q.bind(min_stock);
        }
        if let Some(image_url) = data.image_url {
            q = q.bind(image_url);
        }
        if let Some(is_active) = data.is_active {
            q = q.bind(is_active);
        }

        let product = q.fetch_optional(pool).await?;

        Ok(product)
    }

    /// Soft-deletes a product by clearing its active flag
    ///
    /// Returns true if a product was deactivated, false if none matched.
    /// The row is kept so historical transaction items stay resolvable.
    pub async fn deactivate(pool: &PgPool, tenant_id: Uuid, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE products
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// True when the product is at or below its low-stock threshold
    pub fn is_low_stock(&self) -> bool {
        self.stock <= self.min_stock
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_product_default_is_empty() {
        let update = UpdateProduct::default();
        assert!(update.name.is_none());
        assert!(update.price_cents.is_none());
        assert!(update.is_active.is_none());
    }

    #[test]
    fn test_clearing_nullable_field_deserializes_to_some_none() {
        let update: UpdateProduct = serde_json::from_str(r#"{"barcode": null}"#).unwrap();
        assert_eq!(update.barcode, Some(None));

        let untouched: UpdateProduct = serde_json::from_str("{}").unwrap();
        assert_eq!(untouched.barcode, None);
    }

    #[test]
    fn test_low_stock_threshold_is_inclusive() {
        let mut product = sample_product();
        product.stock = 5;
        product.min_stock = 5;
        assert!(product.is_low_stock());

        product.stock = 6;
        assert!(!product.is_low_stock());
    }

    fn sample_product() -> Product {
        Product {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Cola".to_string(),
            description: None,
            sku: "CL-1".to_string(),
            barcode: None,
            category: ProductCategory::Beverages,
            price_cents: 250,
            cost_cents: Some(150),
            stock: 10,
            min_stock: 2,
            image_url: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }
}

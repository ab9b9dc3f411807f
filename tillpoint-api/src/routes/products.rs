//! Product catalog endpoints
//!
//! # Endpoints
//!
//! - `GET /api/products` - active products, name-ordered (any role)
//! - `POST /api/products` - create (admin)
//! - `PUT /api/products/:id` - partial update (admin)
//! - `DELETE /api/products/:id` - soft delete (admin)
//! - `GET /api/products/barcode/:barcode` - scanner lookup (any role)

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tillpoint_shared::auth::session::CurrentUser;
use tillpoint_shared::models::product::{CreateProduct, Product, ProductCategory, UpdateProduct};
use tillpoint_shared::models::user::UserRole;
use uuid::Uuid;
use validator::Validate;

/// Create-product request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(min = 1, max = 100, message = "SKU must be 1-100 characters"))]
    pub sku: String,

    #[validate(length(max = 100, message = "Barcode must be at most 100 characters"))]
    pub barcode: Option<String>,

    pub category: Option<ProductCategory>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: i64,

    #[validate(range(min = 0, message = "Cost cannot be negative"))]
    pub cost_cents: Option<i64>,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,

    #[validate(range(min = 0, message = "Minimum stock cannot be negative"))]
    pub min_stock: Option<i32>,

    pub image_url: Option<String>,
}

/// Soft-delete confirmation
#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Lists the tenant's active products
pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> ApiResult<Json<Vec<Product>>> {
    let products = state.storage.products(current.tenant_id()).await?;
    Ok(Json(products))
}

/// Creates a product (admin only)
pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<Json<Product>> {
    current.require_role(&[UserRole::Admin])?;
    req.validate().map_err(ApiError::from_validation)?;

    let product = state
        .storage
        .create_product(CreateProduct {
            tenant_id: current.tenant_id(),
            name: req.name,
            description: req.description,
            sku: req.sku,
            barcode: req.barcode,
            category: req.category,
            price_cents: req.price_cents,
            cost_cents: req.cost_cents,
            stock: req.stock,
            min_stock: req.min_stock,
            image_url: req.image_url,
        })
        .await?;

    Ok(Json(product))
}

/// Partially updates a product (admin only)
pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProduct>,
) -> ApiResult<Json<Product>> {
    current.require_role(&[UserRole::Admin])?;

    if let Some(price_cents) = req.price_cents {
        if price_cents < 0 {
            return Err(ApiError::BadRequest("Price cannot be negative".to_string()));
        }
    }
    if let Some(stock) = req.stock {
        if stock < 0 {
            return Err(ApiError::BadRequest("Stock cannot be negative".to_string()));
        }
    }

    let product = state
        .storage
        .update_product(current.tenant_id(), id, req)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

/// Soft-deletes a product (admin only)
///
/// The row survives so historical transaction items keep resolving; it
/// just disappears from listings and can no longer be sold.
pub async fn remove(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<DeleteResponse>> {
    current.require_role(&[UserRole::Admin])?;

    let deleted = state
        .storage
        .deactivate_product(current.tenant_id(), id)
        .await?;

    if !deleted {
        return Err(ApiError::NotFound("Product not found".to_string()));
    }

    Ok(Json(DeleteResponse {
        message: "Product deleted successfully".to_string(),
    }))
}

/// Looks a product up by barcode
pub async fn by_barcode(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(barcode): Path<String>,
) -> ApiResult<Json<Product>> {
    let product = state
        .storage
        .product_by_barcode(current.tenant_id(), &barcode)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    Ok(Json(product))
}

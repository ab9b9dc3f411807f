//! Shared test harness for the API integration tests
//!
//! Builds the real router over an in-memory storage backend seeded with a
//! shop, an admin, a cashier, and two stocked products, then drives it
//! with `tower::ServiceExt::oneshot`. No database or network needed.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tillpoint_api::app::{build_router, AppState};
use tillpoint_api::config::{ApiConfig, Config, JwtConfig, StorageBackend, StorageConfig};
use tillpoint_shared::auth::{jwt, password};
use tillpoint_shared::models::product::{CreateProduct, Product, ProductCategory};
use tillpoint_shared::models::tenant::{CreateTenant, Tenant};
use tillpoint_shared::models::user::{CreateUser, User, UserRole};
use tillpoint_shared::storage::memory::MemStorage;
use tillpoint_shared::storage::Storage;
use tower::ServiceExt;

/// JWT secret used by every test
pub const JWT_SECRET: &str = "integration-test-secret-0123456789abcdef";

/// Password shared by the seeded accounts
pub const PASSWORD: &str = "Passw0rd!demo";

pub struct TestContext {
    pub app: Router,
    pub storage: Arc<MemStorage>,
    pub tenant: Tenant,
    pub admin: User,
    pub cashier: User,
    pub cola: Product,
    pub bread: Product,
}

impl TestContext {
    pub async fn new() -> Self {
        let storage = Arc::new(MemStorage::new());

        let tenant = storage
            .create_tenant(CreateTenant {
                name: "Test Shop".to_string(),
                subdomain: "testshop".to_string(),
                address: None,
                phone: None,
                email: None,
                logo_url: None,
                primary_color: None,
            })
            .await
            .unwrap();

        // one Argon2id hash, shared by both accounts, keeps setup fast
        let password_hash = password::hash_password(PASSWORD).unwrap();

        let admin = storage
            .create_user(CreateUser {
                tenant_id: tenant.id,
                username: "admin".to_string(),
                email: Some("admin@testshop.example".to_string()),
                password_hash: password_hash.clone(),
                first_name: Some("Ada".to_string()),
                last_name: Some("Admin".to_string()),
                role: Some(UserRole::Admin),
            })
            .await
            .unwrap();

        let cashier = storage
            .create_user(CreateUser {
                tenant_id: tenant.id,
                username: "cashier".to_string(),
                email: None,
                password_hash,
                first_name: Some("Cas".to_string()),
                last_name: Some("Hier".to_string()),
                role: Some(UserRole::Cashier),
            })
            .await
            .unwrap();

        let cola = storage
            .create_product(CreateProduct {
                tenant_id: tenant.id,
                name: "Cola".to_string(),
                description: None,
                sku: "CL-1".to_string(),
                barcode: Some("4006381333931".to_string()),
                category: Some(ProductCategory::Beverages),
                price_cents: 250,
                cost_cents: Some(150),
                stock: Some(50),
                min_stock: Some(10),
                image_url: None,
            })
            .await
            .unwrap();

        let bread = storage
            .create_product(CreateProduct {
                tenant_id: tenant.id,
                name: "Bread".to_string(),
                description: None,
                sku: "BR-1".to_string(),
                barcode: None,
                category: Some(ProductCategory::Household),
                price_cents: 150,
                cost_cents: Some(80),
                stock: Some(25),
                min_stock: Some(5),
                image_url: None,
            })
            .await
            .unwrap();

        let config = Config {
            api: ApiConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors_origins: vec!["*".to_string()],
                production: false,
            },
            storage: StorageConfig {
                backend: StorageBackend::Memory,
                database_url: None,
                max_connections: 10,
            },
            jwt: JwtConfig {
                secret: JWT_SECRET.to_string(),
            },
        };

        let app = build_router(AppState::new(storage.clone(), config));

        Self {
            app,
            storage,
            tenant,
            admin,
            cashier,
            cola,
            bread,
        }
    }

    /// Mints a bearer token for a seeded user
    pub fn token_for(&self, user: &User) -> String {
        let claims = jwt::Claims::new(user.id, user.tenant_id, user.role);
        jwt::create_token(&claims, JWT_SECRET).unwrap()
    }
}

/// Sends one request through the router and parses the JSON body
pub async fn request(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);

    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };

    (status, json)
}

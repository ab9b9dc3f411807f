//! Application state and router builder
//!
//! Defines the shared application state and assembles the Axum router:
//! routes, the bearer-token auth layer, CORS, tracing, and security
//! headers.
//!
//! # Router layout
//!
//! ```text
//! /
//! ├── /health                          # liveness + storage status (public)
//! └── /api/
//!     ├── POST /auth/login             # public
//!     ├── GET  /auth/me
//!     ├── /products                    # GET; POST/PUT/DELETE admin-only
//!     ├── /products/barcode/:barcode
//!     ├── /transactions                # checkout + listings
//!     ├── /returns
//!     ├── /handovers
//!     ├── /dashboard/kpis
//!     ├── /reports/sales
//!     └── /users                       # admin-only
//! ```
//!
//! Everything under `/api` except login sits behind the auth layer, which
//! resolves the bearer token to a live user row and injects it as a
//! [`CurrentUser`] request extension. Role checks happen per handler.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, post, put},
    Router,
};
use tillpoint_shared::auth::{jwt, session::CurrentUser};
use tillpoint_shared::storage::Storage;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::{config::Config, error::ApiError, middleware::security::SecurityHeadersLayer, routes};

/// Shared application state
///
/// Cloned into each request handler via Axum's `State` extractor; both
/// fields are Arcs, so cloning is cheap.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend everything reads and writes through
    pub storage: Arc<dyn Storage>,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(storage: Arc<dyn Storage>, config: Config) -> Self {
        Self {
            storage,
            config: Arc::new(config),
        }
    }

    /// Gets the JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Login is the only public API route
    let public_api = Router::new().route("/auth/login", post(routes::auth::login));

    // Everything else requires a valid bearer token
    let protected_api = Router::new()
        .route("/auth/me", get(routes::auth::me))
        .route(
            "/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route(
            "/products/barcode/:barcode",
            get(routes::products::by_barcode),
        )
        .route(
            "/products/:id",
            put(routes::products::update).delete(routes::products::remove),
        )
        .route(
            "/transactions",
            get(routes::transactions::list).post(routes::transactions::create),
        )
        .route("/transactions/:id", get(routes::transactions::by_id))
        .route(
            "/returns",
            get(routes::returns::list).post(routes::returns::create),
        )
        .route(
            "/handovers",
            get(routes::handovers::list).post(routes::handovers::create),
        )
        .route("/handovers/:id", put(routes::handovers::update))
        .route("/dashboard/kpis", get(routes::dashboard::kpis))
        .route("/reports/sales", get(routes::reports::sales))
        .route(
            "/users",
            get(routes::users::list).post(routes::users::create),
        )
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_layer,
        ));

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        // Development mode: permissive CORS
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/api", public_api.merge(protected_api))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .layer(SecurityHeadersLayer::new(state.config.api.production))
        .with_state(state)
}

/// Bearer-token authentication layer
///
/// Validates the JWT, loads the user row, and rejects tokens whose user is
/// missing, deactivated, or has moved tenants since the token was minted.
/// On success a [`CurrentUser`] lands in the request extensions.
async fn auth_layer(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_token(token, state.jwt_secret())?;

    let user = state
        .storage
        .user_by_id(claims.sub)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid token".to_string()))?;

    if !user.is_active || user.tenant_id != claims.tenant_id {
        return Err(ApiError::Unauthorized("Invalid token".to_string()));
    }

    req.extensions_mut().insert(CurrentUser::new(user));

    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    // Router assembly is exercised end-to-end by the integration tests,
    // which drive it over the in-memory storage backend.
}

//! API route handlers
//!
//! One module per resource:
//!
//! - `health`: liveness endpoint
//! - `auth`: login and current-session lookup
//! - `products`: catalog CRUD and barcode lookup
//! - `transactions`: checkout and sale history
//! - `returns`: refund processing
//! - `handovers`: end-of-shift cash reconciliation
//! - `dashboard`: KPI aggregates
//! - `reports`: sales report
//! - `users`: staff management

pub mod auth;
pub mod dashboard;
pub mod handovers;
pub mod health;
pub mod products;
pub mod reports;
pub mod returns;
pub mod transactions;
pub mod users;

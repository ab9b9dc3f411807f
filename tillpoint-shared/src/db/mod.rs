//! Database layer for Tillpoint
//!
//! # Modules
//!
//! - `pool`: PostgreSQL connection pool management with health checks
//! - `migrations`: embedded migration runner
//!
//! Models live in the `models` module at the crate root; the storage facade
//! that ties pool + models together lives in `storage`.

pub mod migrations;
pub mod pool;

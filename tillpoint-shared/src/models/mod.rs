//! Database models for Tillpoint
//!
//! This module contains all database models and their CRUD operations.
//! Every row except the tenant itself carries a `tenant_id`, and every
//! query here takes the tenant id so isolation is enforced at the data
//! layer rather than left to callers.
//!
//! # Models
//!
//! - `tenant`: shops, the unit of data isolation
//! - `user`: staff accounts with roles, scoped to one tenant
//! - `product`: the catalog, with stock levels and soft deletion
//! - `transaction`: completed sales and their line items
//! - `returns`: reversed sales referencing the original transaction
//! - `handover`: end-of-shift cash reconciliation records

pub mod handover;
pub mod product;
pub mod returns;
pub mod tenant;
pub mod transaction;
pub mod user;

/// Deserializes `Option<Option<T>>` so a missing field stays `None` while an
/// explicit JSON `null` becomes `Some(None)` (clear the column).
///
/// Plain derive collapses both cases to `None`; partial-update inputs need
/// the distinction. Use together with `#[serde(default)]`.
pub(crate) fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: serde::Deserialize<'de>,
    D: serde::Deserializer<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

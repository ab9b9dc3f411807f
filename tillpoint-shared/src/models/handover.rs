//! Cash handover model and database operations
//!
//! End-of-shift cash reconciliation. The cashier counts the drawer by
//! denomination, the counted total is compared against what the register
//! expects, and the record can later be countersigned by a supervisor and
//! submitted. The denomination counts are stored as an opaque JSONB blob;
//! only the aggregate amounts participate in queries.
//!
//! `difference_cents` is always `actual - expected`, computed here rather
//! than trusted from the client.
//!
//! # Schema
//!
//! ```sql
//! CREATE TABLE cash_handovers (
//!     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
//!     tenant_id UUID NOT NULL REFERENCES tenants(id),
//!     cashier_id UUID NOT NULL REFERENCES users(id),
//!     supervisor_id UUID REFERENCES users(id),
//!     shift_date TIMESTAMPTZ NOT NULL,
//!     expected_cents BIGINT NOT NULL,
//!     actual_cents BIGINT NOT NULL,
//!     difference_cents BIGINT NOT NULL,
//!     denominations JSONB NOT NULL,
//!     notes TEXT,
//!     is_submitted BOOLEAN NOT NULL DEFAULT FALSE,
//!     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
//! );
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::PgPool;
use uuid::Uuid;

/// Cash handover model: one per cashier per shift
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CashHandover {
    /// Unique handover ID (UUID v4)
    pub id: Uuid,

    /// Tenant the handover belongs to
    pub tenant_id: Uuid,

    /// Cashier who counted the drawer
    pub cashier_id: Uuid,

    /// Supervisor who countersigned, if any
    pub supervisor_id: Option<Uuid>,

    /// The shift being reconciled
    pub shift_date: DateTime<Utc>,

    /// Amount the register expects, in cents
    pub expected_cents: i64,

    /// Amount actually counted, in cents
    pub actual_cents: i64,

    /// actual - expected, in cents (negative means a shortfall)
    pub difference_cents: i64,

    /// Denomination → count mapping as an opaque JSON blob
    pub denominations: JsonValue,

    /// Optional free-form notes
    pub notes: Option<String>,

    /// Whether the count has been submitted for review
    pub is_submitted: bool,

    /// When the handover was recorded
    pub created_at: DateTime<Utc>,
}

/// Input for recording a new handover
#[derive(Debug, Clone)]
pub struct CreateHandover {
    pub tenant_id: Uuid,
    pub cashier_id: Uuid,
    pub supervisor_id: Option<Uuid>,
    pub shift_date: DateTime<Utc>,
    pub expected_cents: i64,
    pub actual_cents: i64,
    pub denominations: JsonValue,
    pub notes: Option<String>,
    pub is_submitted: bool,
}

/// Input for updating a handover
///
/// Only present fields are written; `difference_cents` is recomputed when
/// `actual_cents` or `expected_cents` changes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateHandover {
    pub supervisor_id: Option<Uuid>,
    pub expected_cents: Option<i64>,
    pub actual_cents: Option<i64>,
    pub denominations: Option<JsonValue>,
    #[serde(default, deserialize_with = "crate::models::double_option")]
    pub notes: Option<Option<String>>,
    pub is_submitted: Option<bool>,
}

const HANDOVER_COLUMNS: &str = "id, tenant_id, cashier_id, supervisor_id, shift_date, \
     expected_cents, actual_cents, difference_cents, denominations, notes, is_submitted, created_at";

impl CashHandover {
    /// Records a new handover, computing the difference from the amounts
    pub async fn create(pool: &PgPool, data: CreateHandover) -> Result<Self, sqlx::Error> {
        let difference_cents = data.actual_cents - data.expected_cents;

        let handover = sqlx::query_as::<_, CashHandover>(&format!(
            r#"
            INSERT INTO cash_handovers
                (tenant_id, cashier_id, supervisor_id, shift_date,
                 expected_cents, actual_cents, difference_cents,
                 denominations, notes, is_submitted)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {HANDOVER_COLUMNS}
            "#
        ))
        .bind(data.tenant_id)
        .bind(data.cashier_id)
        .bind(data.supervisor_id)
        .bind(data.shift_date)
        .bind(data.expected_cents)
        .bind(data.actual_cents)
        .bind(difference_cents)
        .bind(data.denominations)
        .bind(data.notes)
        .bind(data.is_submitted)
        .fetch_one(pool)
        .await?;

        Ok(handover)
    }

    /// Finds a handover by ID within a tenant
    pub async fn find_by_id(
        pool: &PgPool,
        tenant_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        let handover = sqlx::query_as::<_, CashHandover>(&format!(
            r#"
            SELECT {HANDOVER_COLUMNS}
            FROM cash_handovers
            WHERE id = $1 AND tenant_id = $2
            "#
        ))
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(pool)
        .await?;

        Ok(handover)
    }

    /// Lists a tenant's handovers, newest first
    pub async fn list(pool: &PgPool, tenant_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let handovers = sqlx::query_as::<_, CashHandover>(&format!(
            r#"
            SELECT {HANDOVER_COLUMNS}
            FROM cash_handovers
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id)
        .fetch_all(pool)
        .await?;

        Ok(handovers)
    }

    /// Applies a partial update in memory, recomputing the difference
    ///
    /// Shared by both storage backends so the recompute rule cannot drift.
    pub fn apply_update(&mut self, data: UpdateHandover) {
        if let Some(supervisor_id) = data.supervisor_id {
            self.supervisor_id = Some(supervisor_id);
        }
        if let Some(expected_cents) = data.expected_cents {
            self.expected_cents = expected_cents;
        }
        if let Some(actual_cents) = data.actual_cents {
            self.actual_cents = actual_cents;
        }
        if let Some(denominations) = data.denominations {
            self.denominations = denominations;
        }
        if let Some(notes) = data.notes {
            self.notes = notes;
        }
        if let Some(is_submitted) = data.is_submitted {
            self.is_submitted = is_submitted;
        }
        self.difference_cents = self.actual_cents - self.expected_cents;
    }

    /// Persists the mutable fields of a handover after [`Self::apply_update`]
    pub async fn save(&self, pool: &PgPool) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE cash_handovers
            SET supervisor_id = $3,
                expected_cents = $4,
                actual_cents = $5,
                difference_cents = $6,
                denominations = $7,
                notes = $8,
                is_submitted = $9
            WHERE id = $1 AND tenant_id = $2
            "#,
        )
        .bind(self.id)
        .bind(self.tenant_id)
        .bind(self.supervisor_id)
        .bind(self.expected_cents)
        .bind(self.actual_cents)
        .bind(self.difference_cents)
        .bind(self.denominations.clone())
        .bind(self.notes.as_deref())
        .bind(self.is_submitted)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_handover() -> CashHandover {
        CashHandover {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            cashier_id: Uuid::new_v4(),
            supervisor_id: None,
            shift_date: Utc::now(),
            expected_cents: 50_000,
            actual_cents: 49_500,
            difference_cents: -500,
            denominations: json!({"2000": 20, "500": 19}),
            notes: None,
            is_submitted: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_apply_update_recomputes_difference() {
        let mut handover = sample_handover();

        handover.apply_update(UpdateHandover {
            actual_cents: Some(50_200),
            ..Default::default()
        });

        assert_eq!(handover.actual_cents, 50_200);
        assert_eq!(handover.difference_cents, 200);
    }

    #[test]
    fn test_apply_update_submission() {
        let mut handover = sample_handover();
        let supervisor = Uuid::new_v4();

        handover.apply_update(UpdateHandover {
            supervisor_id: Some(supervisor),
            is_submitted: Some(true),
            ..Default::default()
        });

        assert_eq!(handover.supervisor_id, Some(supervisor));
        assert!(handover.is_submitted);
        // untouched fields stay put
        assert_eq!(handover.difference_cents, -500);
    }

    #[test]
    fn test_apply_update_can_clear_notes() {
        let mut handover = sample_handover();
        handover.notes = Some("short".to_string());

        let update: UpdateHandover = serde_json::from_str(r#"{"notes": null}"#).unwrap();
        handover.apply_update(update);

        assert_eq!(handover.notes, None);
    }
}

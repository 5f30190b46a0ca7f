use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::domain::value_objects::enums::record_statuses::RecordStatus;
use crate::infrastructure::postgres::schema::subscription_records;

/// One paid period, created on every extend or upgrade. A reverted temporary
/// record is deleted outright so readers never mistake it for current state.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_records)]
pub struct SubscriptionRecordEntity {
    pub id: i64,
    pub tenant_id: Uuid,
    pub plan: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub amount_minor: i64,
    pub temporary_upgrade: bool,
    pub previous_plan: Option<String>,
    /// Ledger entry describing this period. Set for temporary boosts.
    pub history_entry_id: Option<i64>,
    /// Ledger entry describing the pre-boost state, captured when the boost
    /// was created. Revert follows this link instead of searching by time.
    pub baseline_history_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionRecordEntity {
    pub fn plan_tier(&self) -> Option<PlanTier> {
        PlanTier::from_str(&self.plan)
    }

    pub fn record_status(&self) -> RecordStatus {
        RecordStatus::from_str(&self.status)
    }

    pub fn is_elapsed(&self, now: DateTime<Utc>) -> bool {
        self.end_date <= now
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_records)]
pub struct InsertSubscriptionRecordEntity {
    pub tenant_id: Uuid,
    pub plan: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: String,
    pub amount_minor: i64,
    pub temporary_upgrade: bool,
    pub previous_plan: Option<String>,
    pub history_entry_id: Option<i64>,
    pub baseline_history_id: Option<i64>,
}

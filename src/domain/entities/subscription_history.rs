use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::domain::value_objects::subscriptions::HistoryEntryDto;
use crate::infrastructure::postgres::schema::subscription_history;

/// Append-only ledger row. Immutable except for the one-way `reverted` flag.
#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = subscription_history)]
pub struct SubscriptionHistoryEntity {
    pub id: i64,
    pub tenant_id: Uuid,
    pub plan: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_minor: i64,
    pub duration_days: i32,
    pub is_temporary: bool,
    pub reverted: bool,
    pub created_at: DateTime<Utc>,
}

impl SubscriptionHistoryEntity {
    pub fn plan_tier(&self) -> Option<PlanTier> {
        PlanTier::from_str(&self.plan)
    }

    pub fn to_dto(&self) -> Option<HistoryEntryDto> {
        Some(HistoryEntryDto {
            id: self.id,
            plan: self.plan_tier()?,
            start_date: self.start_date,
            end_date: self.end_date,
            price_minor: self.price_minor,
            duration_days: self.duration_days,
            is_temporary: self.is_temporary,
            reverted: self.reverted,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = subscription_history)]
pub struct InsertSubscriptionHistoryEntity {
    pub tenant_id: Uuid,
    pub plan: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_minor: i64,
    pub duration_days: i32,
    pub is_temporary: bool,
    pub reverted: bool,
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::infrastructure::postgres::schema::tenants;

#[derive(Debug, Clone, Identifiable, Selectable, Queryable)]
#[diesel(table_name = tenants)]
pub struct TenantEntity {
    pub id: Uuid,
    pub name: String,
    pub plan: String,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
    pub temporary_upgrade: bool,
    pub previous_plan: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TenantEntity {
    pub fn plan_tier(&self) -> Option<PlanTier> {
        PlanTier::from_str(&self.plan)
    }

    pub fn previous_plan_tier(&self) -> Option<PlanTier> {
        self.previous_plan
            .as_deref()
            .and_then(PlanTier::from_str)
    }

    /// `temporary_upgrade` and `previous_plan` must be set together.
    pub fn flags_consistent(&self) -> bool {
        self.temporary_upgrade == self.previous_plan.is_some()
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.subscription_end <= now
    }
}

#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tenants)]
pub struct InsertTenantEntity {
    pub name: String,
    pub plan: String,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
    pub temporary_upgrade: bool,
    pub previous_plan: Option<String>,
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::domain::value_objects::proration::RemainingTime;

#[derive(Debug, Clone, Deserialize)]
pub struct ExtendSubscriptionRequest {
    pub plan: String,
    pub duration_days: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpgradeSubscriptionRequest {
    pub new_plan: String,
    pub upgrade_type: String,
    pub custom_duration_days: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReduceDurationRequest {
    pub days: i64,
}

/// Read-side view of a tenant's subscription. The remaining-time fields are
/// derived from `subscription_end - now` at read time and never negative.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SubscriptionStateDto {
    pub tenant_id: Uuid,
    pub plan: PlanTier,
    pub subscription_start: DateTime<Utc>,
    pub subscription_end: DateTime<Utc>,
    pub temporary_upgrade: bool,
    pub days_remaining: i64,
    pub hours_remaining: i64,
    pub minutes_remaining: i64,
    pub seconds_remaining: i64,
    pub is_expired: bool,
}

impl SubscriptionStateDto {
    pub fn derive(
        tenant_id: Uuid,
        plan: PlanTier,
        subscription_start: DateTime<Utc>,
        subscription_end: DateTime<Utc>,
        temporary_upgrade: bool,
        now: DateTime<Utc>,
    ) -> Self {
        let remaining = RemainingTime::until(subscription_end, now);
        Self {
            tenant_id,
            plan,
            subscription_start,
            subscription_end,
            temporary_upgrade,
            days_remaining: remaining.days,
            hours_remaining: remaining.hours,
            minutes_remaining: remaining.minutes,
            seconds_remaining: remaining.seconds,
            is_expired: remaining.expired,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct HistoryEntryDto {
    pub id: i64,
    pub plan: PlanTier,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_minor: i64,
    pub duration_days: i32,
    pub is_temporary: bool,
    pub reverted: bool,
    pub created_at: DateTime<Utc>,
}

/// What the billing caller gets back after a successful extend or upgrade.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanChangeReceipt {
    pub plan: PlanTier,
    pub new_subscription_end: DateTime<Utc>,
    pub amount_charged_minor: i64,
}

/// Fire-and-forget notification payload for the reward-points collaborator.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PlanChargedEvent {
    pub tenant_id: Uuid,
    pub plan: PlanTier,
    pub amount_minor: i64,
    pub duration_days: i64,
}

/// Snapshot of the tenant fields every mutating operation depends on. The
/// write repository re-reads the row inside its transaction and compares;
/// a mismatch means another writer (usually the sweeper) got there first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TenantStateGuard {
    pub plan: PlanTier,
    pub temporary_upgrade: bool,
    pub previous_plan: Option<PlanTier>,
    pub subscription_end: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The guard no longer matched when the transaction re-read the tenant.
    Conflict,
}

/// New period-record row, built by the engine and persisted by the write
/// repository within the operation's transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodRecordDraft {
    pub plan: PlanTier,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub amount_minor: i64,
    pub temporary_upgrade: bool,
    pub previous_plan: Option<PlanTier>,
}

/// New ledger row. Only the temporary-upgrade path writes these.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntryDraft {
    pub plan: PlanTier,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub price_minor: i64,
    pub duration_days: i32,
    pub is_temporary: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtensionWrite {
    pub tenant_id: Uuid,
    pub guard: TenantStateGuard,
    pub plan: PlanTier,
    pub new_start: DateTime<Utc>,
    pub new_end: DateTime<Utc>,
    pub record: PeriodRecordDraft,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpgradeWrite {
    pub tenant_id: Uuid,
    pub guard: TenantStateGuard,
    pub new_plan: PlanTier,
    pub new_end: DateTime<Utc>,
    pub temporary_upgrade: bool,
    pub previous_plan: Option<PlanTier>,
    pub record: PeriodRecordDraft,
    /// Pre-boost state to anchor in the ledger; the repository reuses an
    /// existing matching entry instead of inserting a duplicate.
    pub baseline_history: Option<HistoryEntryDraft>,
    /// The boost's own ledger entry. Set exactly when `baseline_history` is.
    pub boost_history: Option<HistoryEntryDraft>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RevertWrite {
    pub tenant_id: Uuid,
    pub guard: TenantStateGuard,
    pub restored_plan: PlanTier,
    pub new_end: DateTime<Utc>,
    pub boost_record_id: i64,
    pub boost_history_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReductionWrite {
    pub tenant_id: Uuid,
    pub guard: TenantStateGuard,
    pub new_end: DateTime<Utc>,
    /// Present when the shortened end no longer covers an active boost; the
    /// boost is dismantled in the same transaction.
    pub boost_teardown: Option<BoostTeardown>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoostTeardown {
    pub restored_plan: PlanTier,
    pub boost_record_id: i64,
    pub boost_history_id: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExpiryDowngradeWrite {
    pub tenant_id: Uuid,
    pub guard: TenantStateGuard,
}

/// What `revert` did, so callers and the sweeper can report accurately.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RevertOutcome {
    Reverted {
        restored_plan: PlanTier,
        new_end: DateTime<Utc>,
    },
    /// The tenant was not in a temporary-upgrade state; nothing to do.
    NotBoosted,
}

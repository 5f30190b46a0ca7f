use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::domain::entities::tenants::TenantEntity;
use crate::domain::repositories::{
    plan_features::PlanFeaturesGateway, reward_points::RewardPointsNotifier,
    subscription_history::SubscriptionHistoryRepository,
    subscription_records::SubscriptionRecordRepository,
    subscription_writes::SubscriptionWriteRepository, tenants::TenantRepository,
};
use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::domain::value_objects::enums::upgrade_types::UpgradeType;
use crate::domain::value_objects::plan_catalog::{PlanCatalog, PlanDefinition};
use crate::domain::value_objects::proration::{
    add_months, discount_for_duration, prorated_extension_price, remaining_days, upgrade_quote,
};
use crate::domain::value_objects::subscriptions::{
    BoostTeardown, ExtensionWrite, HistoryEntryDraft, HistoryEntryDto, PeriodRecordDraft,
    PlanChangeReceipt, PlanChargedEvent, ReductionWrite, RevertOutcome, RevertWrite,
    SubscriptionStateDto, TenantStateGuard, UpgradeWrite, WriteOutcome,
};

const DEFAULT_BOOST_DAYS: i64 = 30;

/// Durations come straight from request bodies; anything past a century is a
/// bad request, and unchecked values would overflow chrono's date arithmetic.
const MAX_DURATION_DAYS: i64 = 36_500;

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("tenant not found")]
    TenantNotFound,
    #[error("a temporary upgrade is already active")]
    BoostAlreadyActive,
    #[error("subscription has expired")]
    SubscriptionExpired,
    #[error("reduction would end the subscription in the past")]
    ReductionTooLarge,
    #[error("invalid duration: {0}")]
    InvalidDuration(String),
    #[error("subscription state changed concurrently, retry the operation")]
    Conflict,
    #[error("subscription state is inconsistent: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl LifecycleError {
    pub fn status_code(&self) -> axum::http::StatusCode {
        use axum::http::StatusCode;
        match self {
            LifecycleError::TenantNotFound => StatusCode::NOT_FOUND,
            LifecycleError::BoostAlreadyActive
            | LifecycleError::SubscriptionExpired
            | LifecycleError::ReductionTooLarge
            | LifecycleError::InvalidDuration(_) => StatusCode::BAD_REQUEST,
            LifecycleError::Conflict => StatusCode::CONFLICT,
            LifecycleError::Inconsistent(_) | LifecycleError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

pub type LifecycleResult<T> = std::result::Result<T, LifecycleError>;

/// Orchestrates every mutation of a tenant's subscription: extension,
/// upgrades in their three shapes, reversion of temporary boosts, and admin
/// duration reduction. All writes go through the guarded transactional
/// repository; collaborator calls happen after the commit and never fail the
/// operation.
pub struct LifecycleUseCase<T, R, H, W, F, N>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    tenant_repo: Arc<T>,
    record_repo: Arc<R>,
    history_repo: Arc<H>,
    write_repo: Arc<W>,
    plan_features: Arc<F>,
    reward_points: Arc<N>,
    catalog: Arc<PlanCatalog>,
}

impl<T, R, H, W, F, N> LifecycleUseCase<T, R, H, W, F, N>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    pub fn new(
        tenant_repo: Arc<T>,
        record_repo: Arc<R>,
        history_repo: Arc<H>,
        write_repo: Arc<W>,
        plan_features: Arc<F>,
        reward_points: Arc<N>,
        catalog: Arc<PlanCatalog>,
    ) -> Self {
        Self {
            tenant_repo,
            record_repo,
            history_repo,
            write_repo,
            plan_features,
            reward_points,
            catalog,
        }
    }

    pub fn list_plans(&self) -> Vec<PlanDefinition> {
        self.catalog.list().to_vec()
    }

    pub async fn subscription_state(&self, tenant_id: Uuid) -> LifecycleResult<SubscriptionStateDto> {
        let tenant = self.load_tenant(tenant_id).await?;
        let plan = tenant.plan_tier().ok_or_else(|| {
            LifecycleError::Inconsistent(format!("tenant has unknown plan {:?}", tenant.plan))
        })?;

        Ok(SubscriptionStateDto::derive(
            tenant.id,
            plan,
            tenant.subscription_start,
            tenant.subscription_end,
            tenant.temporary_upgrade,
            Utc::now(),
        ))
    }

    pub async fn plan_history(&self, tenant_id: Uuid) -> LifecycleResult<Vec<HistoryEntryDto>> {
        self.load_tenant(tenant_id).await?;

        let entries = self
            .history_repo
            .list_by_tenant(tenant_id)
            .await
            .map_err(|err| {
                error!(%tenant_id, db_error = ?err, "lifecycle: failed to load history");
                LifecycleError::Internal(err)
            })?;

        Ok(entries.iter().filter_map(|entry| entry.to_dto()).collect())
    }

    pub async fn extend(
        &self,
        tenant_id: Uuid,
        plan: PlanTier,
        duration_days: i64,
    ) -> LifecycleResult<PlanChangeReceipt> {
        info!(%tenant_id, %plan, duration_days, "lifecycle: extend requested");

        let duration_days = validated_duration(duration_days)?;

        let now = Utc::now();
        let tenant = self.load_tenant(tenant_id).await?;
        let tenant = self.settle_elapsed_boost(tenant, now).await?;
        let guard = guard_for(&tenant)?;

        // Unexpired remaining time is banked: the extension starts where the
        // current period ends.
        let new_start = if tenant.subscription_end > now {
            tenant.subscription_end
        } else {
            now
        };
        let mut new_end = new_start + Duration::days(duration_days);
        if new_end <= now {
            new_end = now + Duration::days(duration_days);
        }

        let amount_minor = prorated_extension_price(self.monthly_price(plan)?, duration_days);

        let write = ExtensionWrite {
            tenant_id,
            guard,
            plan,
            new_start,
            new_end,
            record: PeriodRecordDraft {
                plan,
                start_date: new_start,
                end_date: new_end,
                amount_minor,
                temporary_upgrade: false,
                previous_plan: None,
            },
        };

        self.apply(self.write_repo.apply_extension(write), tenant_id, "extension")
            .await?;

        info!(
            %tenant_id,
            %plan,
            amount_minor,
            new_end = %new_end,
            "lifecycle: extension applied"
        );

        if let Err(err) = self.plan_features.reactivate_staff(tenant_id).await {
            warn!(%tenant_id, error = ?err, "lifecycle: staff reactivation failed; continuing");
        }
        self.notify_charge(tenant_id, plan, amount_minor, duration_days)
            .await;

        Ok(PlanChangeReceipt {
            plan,
            new_subscription_end: new_end,
            amount_charged_minor: amount_minor,
        })
    }

    pub async fn upgrade(
        &self,
        tenant_id: Uuid,
        new_plan: PlanTier,
        upgrade_type: UpgradeType,
        custom_duration_days: Option<i64>,
    ) -> LifecycleResult<PlanChangeReceipt> {
        info!(
            %tenant_id,
            %new_plan,
            upgrade_type = %upgrade_type,
            custom_duration_days,
            "lifecycle: upgrade requested"
        );

        let now = Utc::now();
        let tenant = self.load_tenant(tenant_id).await?;
        let tenant = self.settle_elapsed_boost(tenant, now).await?;

        if tenant.is_expired(now) {
            return Err(LifecycleError::SubscriptionExpired);
        }

        let guard = guard_for(&tenant)?;
        let current_plan = guard.plan;
        let current_price = self.monthly_price(current_plan)?;
        let new_price = self.monthly_price(new_plan)?;

        let write = match upgrade_type {
            UpgradeType::Temporary => {
                let days = validated_duration(custom_duration_days.unwrap_or(DEFAULT_BOOST_DAYS))?;
                let boost_end = now + Duration::days(days);
                let quote = upgrade_quote(
                    current_price,
                    new_price,
                    tenant.subscription_end,
                    days as f64 / 30.0,
                    now,
                );

                UpgradeWrite {
                    tenant_id,
                    guard,
                    new_plan,
                    new_end: boost_end,
                    temporary_upgrade: true,
                    previous_plan: Some(current_plan),
                    record: PeriodRecordDraft {
                        plan: new_plan,
                        start_date: now,
                        end_date: boost_end,
                        amount_minor: quote.upgrade_cost_minor,
                        temporary_upgrade: true,
                        previous_plan: Some(current_plan),
                    },
                    // The baseline entry anchors the pre-boost end date so the
                    // revert can rebuild the banked remaining time.
                    baseline_history: Some(HistoryEntryDraft {
                        plan: current_plan,
                        start_date: tenant.subscription_start,
                        end_date: tenant.subscription_end,
                        price_minor: current_price,
                        duration_days: quote.remaining_days as i32,
                        is_temporary: false,
                    }),
                    boost_history: Some(HistoryEntryDraft {
                        plan: new_plan,
                        start_date: now,
                        end_date: boost_end,
                        price_minor: quote.upgrade_cost_minor,
                        duration_days: days as i32,
                        is_temporary: true,
                    }),
                }
            }
            UpgradeType::UntilEnd => {
                let days_left = remaining_days(tenant.subscription_end, now);
                let quote = upgrade_quote(
                    current_price,
                    new_price,
                    tenant.subscription_end,
                    days_left as f64 / 30.0,
                    now,
                );

                UpgradeWrite {
                    tenant_id,
                    guard,
                    new_plan,
                    new_end: tenant.subscription_end,
                    temporary_upgrade: false,
                    previous_plan: None,
                    record: PeriodRecordDraft {
                        plan: new_plan,
                        start_date: now,
                        end_date: tenant.subscription_end,
                        amount_minor: quote.upgrade_cost_minor,
                        temporary_upgrade: false,
                        previous_plan: None,
                    },
                    baseline_history: None,
                    boost_history: None,
                }
            }
            UpgradeType::Custom => {
                let days = validated_duration(custom_duration_days.unwrap_or(DEFAULT_BOOST_DAYS))?;
                let months = ((days as f64 / 30.0).round() as u32).max(1);
                let candidate_end = add_months(now, months)?;
                // The purchased window can reach past the paid period; when it
                // does, the subscription itself is extended to the new date.
                let new_end = candidate_end.max(tenant.subscription_end);

                let quote = upgrade_quote(
                    current_price,
                    new_price,
                    tenant.subscription_end,
                    months as f64,
                    now,
                );
                let discount = discount_for_duration(days);
                let amount_minor =
                    (quote.upgrade_cost_minor as f64 * (1.0 - discount)).round() as i64;

                UpgradeWrite {
                    tenant_id,
                    guard,
                    new_plan,
                    new_end,
                    temporary_upgrade: false,
                    previous_plan: None,
                    record: PeriodRecordDraft {
                        plan: new_plan,
                        start_date: now,
                        end_date: new_end,
                        amount_minor,
                        temporary_upgrade: false,
                        previous_plan: None,
                    },
                    baseline_history: None,
                    boost_history: None,
                }
            }
        };

        let new_end = write.new_end;
        let amount_minor = write.record.amount_minor;
        let charged_days = match upgrade_type {
            UpgradeType::UntilEnd => remaining_days(tenant.subscription_end, now),
            _ => custom_duration_days.unwrap_or(DEFAULT_BOOST_DAYS),
        };

        self.apply(self.write_repo.apply_upgrade(write), tenant_id, "upgrade")
            .await?;

        info!(
            %tenant_id,
            %new_plan,
            upgrade_type = %upgrade_type,
            amount_minor,
            new_end = %new_end,
            "lifecycle: upgrade applied"
        );

        if let Err(err) = self.plan_features.apply_plan_limits(tenant_id, new_plan).await {
            warn!(%tenant_id, error = ?err, "lifecycle: plan limit application failed; continuing");
        }
        self.notify_charge(tenant_id, new_plan, amount_minor, charged_days)
            .await;

        Ok(PlanChangeReceipt {
            plan: new_plan,
            new_subscription_end: new_end,
            amount_charged_minor: amount_minor,
        })
    }

    /// Restores the pre-boost plan and its recomputed remaining time. Safe to
    /// call on a tenant without an active boost; that case is a no-op.
    pub async fn revert(&self, tenant_id: Uuid) -> LifecycleResult<RevertOutcome> {
        let now = Utc::now();
        let tenant = self.load_tenant(tenant_id).await?;

        if !tenant.temporary_upgrade {
            return Ok(RevertOutcome::NotBoosted);
        }

        let guard = guard_for(&tenant)?;
        let restored_plan = guard.previous_plan.ok_or_else(|| {
            LifecycleError::Inconsistent("temporary upgrade flagged without a previous plan".into())
        })?;

        let boost = self
            .record_repo
            .find_temporary_by_tenant(tenant_id)
            .await
            .map_err(|err| {
                error!(%tenant_id, db_error = ?err, "lifecycle: failed to load boost record");
                LifecycleError::Internal(err)
            })?
            .ok_or_else(|| {
                LifecycleError::Inconsistent(
                    "temporary upgrade flagged but no boost record exists".into(),
                )
            })?;

        let baseline_id = boost.baseline_history_id.ok_or_else(|| {
            LifecycleError::Inconsistent("boost record is missing its baseline history link".into())
        })?;
        let boost_history_id = boost.history_entry_id.ok_or_else(|| {
            LifecycleError::Inconsistent("boost record is missing its own history link".into())
        })?;

        let baseline = self
            .history_repo
            .find_by_id(baseline_id)
            .await
            .map_err(|err| {
                error!(%tenant_id, db_error = ?err, "lifecycle: failed to load baseline entry");
                LifecycleError::Internal(err)
            })?
            .ok_or_else(|| {
                LifecycleError::Inconsistent(format!(
                    "baseline history entry {baseline_id} does not exist"
                ))
            })?;

        // The boost consumed base-plan time 1:1 for its full booked window,
        // used or not. Whatever the baseline had left beyond that survives.
        let upgrade_duration = boost.end_date - boost.start_date;
        let remaining_from_original = baseline.end_date - boost.start_date;
        let new_remaining = (remaining_from_original - upgrade_duration).max(Duration::zero());
        let new_end = now + new_remaining;

        let write = RevertWrite {
            tenant_id,
            guard,
            restored_plan,
            new_end,
            boost_record_id: boost.id,
            boost_history_id,
        };

        self.apply(self.write_repo.apply_revert(write), tenant_id, "revert")
            .await?;

        info!(
            %tenant_id,
            restored_plan = %restored_plan,
            new_end = %new_end,
            "lifecycle: temporary upgrade reverted"
        );

        if let Err(err) = self
            .plan_features
            .apply_plan_limits(tenant_id, restored_plan)
            .await
        {
            warn!(%tenant_id, error = ?err, "lifecycle: plan limit application failed; continuing");
        }

        Ok(RevertOutcome::Reverted {
            restored_plan,
            new_end,
        })
    }

    pub async fn reduce_duration(
        &self,
        tenant_id: Uuid,
        days: i64,
    ) -> LifecycleResult<SubscriptionStateDto> {
        info!(%tenant_id, days, "lifecycle: duration reduction requested");

        let days = validated_duration(days)?;

        let now = Utc::now();
        let tenant = self.load_tenant(tenant_id).await?;
        let guard = guard_for(&tenant)?;

        let new_end = tenant.subscription_end - Duration::days(days);
        if new_end <= now {
            return Err(LifecycleError::ReductionTooLarge);
        }

        // A boost cannot outlive a manually shortened subscription. When the
        // new end cuts into the boost window the boost is dismantled in the
        // same transaction; the admin's end date wins over any recompute.
        let mut plan_after = guard.plan;
        let mut boost_teardown = None;
        if tenant.temporary_upgrade {
            let restored_plan = guard.previous_plan.ok_or_else(|| {
                LifecycleError::Inconsistent(
                    "temporary upgrade flagged without a previous plan".into(),
                )
            })?;
            let boost = self
                .record_repo
                .find_temporary_by_tenant(tenant_id)
                .await
                .map_err(|err| {
                    error!(%tenant_id, db_error = ?err, "lifecycle: failed to load boost record");
                    LifecycleError::Internal(err)
                })?
                .ok_or_else(|| {
                    LifecycleError::Inconsistent(
                        "temporary upgrade flagged but no boost record exists".into(),
                    )
                })?;

            if new_end <= boost.end_date {
                let boost_history_id = boost.history_entry_id.ok_or_else(|| {
                    LifecycleError::Inconsistent(
                        "boost record is missing its own history link".into(),
                    )
                })?;
                plan_after = restored_plan;
                boost_teardown = Some(BoostTeardown {
                    restored_plan,
                    boost_record_id: boost.id,
                    boost_history_id,
                });
            }
        }

        let torn_down = boost_teardown.is_some();
        let write = ReductionWrite {
            tenant_id,
            guard,
            new_end,
            boost_teardown,
        };

        self.apply(self.write_repo.apply_reduction(write), tenant_id, "reduction")
            .await?;

        info!(
            %tenant_id,
            new_end = %new_end,
            boost_torn_down = torn_down,
            "lifecycle: duration reduced"
        );

        if torn_down {
            if let Err(err) = self
                .plan_features
                .apply_plan_limits(tenant_id, plan_after)
                .await
            {
                warn!(%tenant_id, error = ?err, "lifecycle: plan limit application failed; continuing");
            }
        }

        Ok(SubscriptionStateDto::derive(
            tenant_id,
            plan_after,
            tenant.subscription_start,
            new_end,
            false,
            now,
        ))
    }

    async fn load_tenant(&self, tenant_id: Uuid) -> LifecycleResult<TenantEntity> {
        self.tenant_repo
            .find_by_id(tenant_id)
            .await
            .map_err(|err| {
                error!(%tenant_id, db_error = ?err, "lifecycle: failed to load tenant");
                LifecycleError::Internal(err)
            })?
            .ok_or(LifecycleError::TenantNotFound)
    }

    /// Mutating operations must not build on top of stale boost state. An
    /// active boost rejects the operation; an elapsed one is reverted first
    /// and the operation proceeds from the restored tenant.
    async fn settle_elapsed_boost(
        &self,
        tenant: TenantEntity,
        now: DateTime<Utc>,
    ) -> LifecycleResult<TenantEntity> {
        if !tenant.temporary_upgrade {
            return Ok(tenant);
        }
        if !tenant.is_expired(now) {
            return Err(LifecycleError::BoostAlreadyActive);
        }

        info!(tenant_id = %tenant.id, "lifecycle: reverting elapsed boost before proceeding");
        self.revert(tenant.id).await?;
        self.load_tenant(tenant.id).await
    }

    async fn apply(
        &self,
        write: impl std::future::Future<Output = anyhow::Result<WriteOutcome>>,
        tenant_id: Uuid,
        operation: &'static str,
    ) -> LifecycleResult<()> {
        match write.await.map_err(|err| {
            error!(%tenant_id, operation, db_error = ?err, "lifecycle: write failed");
            LifecycleError::Internal(err)
        })? {
            WriteOutcome::Applied => Ok(()),
            WriteOutcome::Conflict => {
                warn!(%tenant_id, operation, "lifecycle: guard mismatch, concurrent writer won");
                Err(LifecycleError::Conflict)
            }
        }
    }

    fn monthly_price(&self, tier: PlanTier) -> LifecycleResult<i64> {
        self.catalog
            .monthly_price_minor(tier)
            .ok_or_else(|| LifecycleError::Inconsistent(format!("plan {tier} missing from catalog")))
    }

    async fn notify_charge(
        &self,
        tenant_id: Uuid,
        plan: PlanTier,
        amount_minor: i64,
        duration_days: i64,
    ) {
        if amount_minor <= 0 {
            return;
        }
        let event = PlanChargedEvent {
            tenant_id,
            plan,
            amount_minor,
            duration_days,
        };
        if let Err(err) = self.reward_points.notify_charge(event).await {
            warn!(%tenant_id, error = ?err, "lifecycle: reward points notification failed; continuing");
        }
    }
}

fn guard_for(tenant: &TenantEntity) -> LifecycleResult<TenantStateGuard> {
    let plan = tenant.plan_tier().ok_or_else(|| {
        LifecycleError::Inconsistent(format!("tenant has unknown plan {:?}", tenant.plan))
    })?;

    if !tenant.flags_consistent() {
        return Err(LifecycleError::Inconsistent(
            "temporary_upgrade and previous_plan are out of sync".into(),
        ));
    }

    let previous_plan = tenant.previous_plan_tier();
    if tenant.temporary_upgrade && previous_plan.is_none() {
        return Err(LifecycleError::Inconsistent(format!(
            "unparseable previous plan {:?}",
            tenant.previous_plan
        )));
    }

    Ok(TenantStateGuard {
        plan,
        temporary_upgrade: tenant.temporary_upgrade,
        previous_plan,
        subscription_end: tenant.subscription_end,
    })
}

fn validated_duration(days: i64) -> LifecycleResult<i64> {
    if days < 1 {
        return Err(LifecycleError::InvalidDuration(format!(
            "duration must be at least 1 day, got {days}"
        )));
    }
    if days > MAX_DURATION_DAYS {
        return Err(LifecycleError::InvalidDuration(format!(
            "duration must be at most {MAX_DURATION_DAYS} days, got {days}"
        )));
    }
    Ok(days)
}

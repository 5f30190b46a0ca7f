use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use chrono::Utc;
use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::application::usecases::lifecycle::{LifecycleError, LifecycleUseCase};
use crate::domain::entities::tenants::TenantEntity;
use crate::domain::repositories::{
    plan_features::PlanFeaturesGateway, reward_points::RewardPointsNotifier,
    subscription_history::SubscriptionHistoryRepository,
    subscription_records::SubscriptionRecordRepository,
    subscription_writes::SubscriptionWriteRepository, tenants::TenantRepository,
};
use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::domain::value_objects::subscriptions::{
    ExpiryDowngradeWrite, RevertOutcome, TenantStateGuard, WriteOutcome,
};

#[derive(Debug, Clone, Serialize)]
pub struct SweepError {
    pub tenant_id: Uuid,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub reverted: usize,
    pub downgraded: usize,
    pub failed: usize,
    pub errors: Vec<SweepError>,
}

/// Periodic reconciliation over the whole tenant population: pass 1 reverts
/// elapsed temporary boosts, pass 2 downgrades expired paid plans to the
/// basic tier. Each tenant is processed independently so one failure never
/// stalls the batch.
pub struct SweeperUseCase<T, R, H, W, F, N>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    engine: Arc<LifecycleUseCase<T, R, H, W, F, N>>,
    tenant_repo: Arc<T>,
    record_repo: Arc<R>,
    write_repo: Arc<W>,
    plan_features: Arc<F>,
}

impl<T, R, H, W, F, N> SweeperUseCase<T, R, H, W, F, N>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    pub fn new(
        engine: Arc<LifecycleUseCase<T, R, H, W, F, N>>,
        tenant_repo: Arc<T>,
        record_repo: Arc<R>,
        write_repo: Arc<W>,
        plan_features: Arc<F>,
    ) -> Self {
        Self {
            engine,
            tenant_repo,
            record_repo,
            write_repo,
            plan_features,
        }
    }

    pub async fn run_sweep(&self) -> Result<SweepReport> {
        let now = Utc::now();
        let mut report = SweepReport::default();

        let expired_boosts = self.record_repo.list_expired_temporary(now).await?;
        info!(count = expired_boosts.len(), "sweep: expired boosts found");

        for record in expired_boosts {
            match self.engine.revert(record.tenant_id).await {
                Ok(RevertOutcome::Reverted { restored_plan, .. }) => {
                    info!(
                        tenant_id = %record.tenant_id,
                        restored_plan = %restored_plan,
                        "sweep: boost reverted"
                    );
                    report.reverted += 1;
                }
                Ok(RevertOutcome::NotBoosted) => {
                    // Someone reverted synchronously between the scan and
                    // this call; nothing left to do.
                    info!(tenant_id = %record.tenant_id, "sweep: boost already reverted");
                }
                Err(LifecycleError::Conflict) => {
                    info!(
                        tenant_id = %record.tenant_id,
                        "sweep: tenant changed mid-sweep, skipping revert"
                    );
                }
                Err(err) => {
                    error!(tenant_id = %record.tenant_id, error = ?err, "sweep: revert failed");
                    report.failed += 1;
                    report.errors.push(SweepError {
                        tenant_id: record.tenant_id,
                        message: err.to_string(),
                    });
                }
            }
        }

        let expired_paid = self.tenant_repo.list_expired_paid(now).await?;
        info!(count = expired_paid.len(), "sweep: expired paid plans found");

        for tenant in expired_paid {
            match self.downgrade_expired(&tenant).await {
                Ok(true) => report.downgraded += 1,
                Ok(false) => {}
                Err(err) => {
                    error!(tenant_id = %tenant.id, error = ?err, "sweep: downgrade failed");
                    report.failed += 1;
                    report.errors.push(SweepError {
                        tenant_id: tenant.id,
                        message: err.to_string(),
                    });
                }
            }
        }

        info!(
            reverted = report.reverted,
            downgraded = report.downgraded,
            failed = report.failed,
            "sweep: completed"
        );

        Ok(report)
    }

    /// Expired paid plans drop to basic with no time refund; the end date
    /// stays where it lapsed.
    async fn downgrade_expired(&self, tenant: &TenantEntity) -> Result<bool> {
        let Some(plan) = tenant.plan_tier() else {
            anyhow::bail!("tenant has unknown plan {:?}", tenant.plan);
        };

        let write = ExpiryDowngradeWrite {
            tenant_id: tenant.id,
            guard: TenantStateGuard {
                plan,
                temporary_upgrade: tenant.temporary_upgrade,
                previous_plan: tenant.previous_plan_tier(),
                subscription_end: tenant.subscription_end,
            },
        };

        match self.write_repo.apply_expiry_downgrade(write).await? {
            WriteOutcome::Applied => {}
            WriteOutcome::Conflict => {
                // The tenant extended or upgraded between the scan and the
                // write; their new state is the correct one.
                info!(tenant_id = %tenant.id, "sweep: tenant changed mid-sweep, skipping downgrade");
                return Ok(false);
            }
        }

        info!(tenant_id = %tenant.id, "sweep: expired plan downgraded to basic");

        if let Err(err) = self
            .plan_features
            .apply_plan_limits(tenant.id, PlanTier::Basic)
            .await
        {
            warn!(tenant_id = %tenant.id, error = ?err, "sweep: plan limit application failed; continuing");
        }

        Ok(true)
    }
}

pub async fn run_loop<T, R, H, W, F, N>(
    sweeper: Arc<SweeperUseCase<T, R, H, W, F, N>>,
    interval_secs: u64,
) -> Result<()>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    loop {
        if let Err(err) = sweeper.run_sweep().await {
            error!(error = ?err, "sweep: run failed");
        }

        tokio::time::sleep(Duration::from_secs(interval_secs)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::subscription_history::SubscriptionHistoryEntity;
    use crate::domain::entities::subscription_records::SubscriptionRecordEntity;
    use crate::domain::entities::tenants::TenantEntity;
    use crate::domain::repositories::{
        plan_features::MockPlanFeaturesGateway, reward_points::MockRewardPointsNotifier,
        subscription_history::MockSubscriptionHistoryRepository,
        subscription_records::MockSubscriptionRecordRepository,
        subscription_writes::MockSubscriptionWriteRepository, tenants::MockTenantRepository,
    };
    use crate::domain::value_objects::enums::record_statuses::RecordStatus;
    use crate::domain::value_objects::plan_catalog::PlanCatalog;
    use chrono::{DateTime, Duration as ChronoDuration, Utc};
    use mockall::predicate::eq;

    type TestSweeper = SweeperUseCase<
        MockTenantRepository,
        MockSubscriptionRecordRepository,
        MockSubscriptionHistoryRepository,
        MockSubscriptionWriteRepository,
        MockPlanFeaturesGateway,
        MockRewardPointsNotifier,
    >;

    struct Mocks {
        tenant_repo: MockTenantRepository,
        record_repo: MockSubscriptionRecordRepository,
        history_repo: MockSubscriptionHistoryRepository,
        write_repo: MockSubscriptionWriteRepository,
        plan_features: MockPlanFeaturesGateway,
        reward_points: MockRewardPointsNotifier,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                tenant_repo: MockTenantRepository::new(),
                record_repo: MockSubscriptionRecordRepository::new(),
                history_repo: MockSubscriptionHistoryRepository::new(),
                write_repo: MockSubscriptionWriteRepository::new(),
                plan_features: MockPlanFeaturesGateway::new(),
                reward_points: MockRewardPointsNotifier::new(),
            }
        }

        fn into_sweeper(self) -> TestSweeper {
            let tenant_repo = Arc::new(self.tenant_repo);
            let record_repo = Arc::new(self.record_repo);
            let write_repo = Arc::new(self.write_repo);
            let plan_features = Arc::new(self.plan_features);

            let engine = Arc::new(LifecycleUseCase::new(
                Arc::clone(&tenant_repo),
                Arc::clone(&record_repo),
                Arc::new(self.history_repo),
                Arc::clone(&write_repo),
                Arc::clone(&plan_features),
                Arc::new(self.reward_points),
                Arc::new(PlanCatalog::default()),
            ));

            SweeperUseCase::new(engine, tenant_repo, record_repo, write_repo, plan_features)
        }
    }

    fn boosted_tenant(tenant_id: Uuid, end: DateTime<Utc>) -> TenantEntity {
        let now = Utc::now();
        TenantEntity {
            id: tenant_id,
            name: "Corner Store".to_string(),
            plan: PlanTier::Pro.as_str().to_string(),
            subscription_start: now - ChronoDuration::days(10),
            subscription_end: end,
            temporary_upgrade: true,
            previous_plan: Some(PlanTier::Basic.as_str().to_string()),
            created_at: now - ChronoDuration::days(40),
            updated_at: now,
        }
    }

    fn expired_paid_tenant(plan: PlanTier, expired_for: ChronoDuration) -> TenantEntity {
        let now = Utc::now();
        TenantEntity {
            id: Uuid::new_v4(),
            name: "Lapsed Store".to_string(),
            plan: plan.as_str().to_string(),
            subscription_start: now - ChronoDuration::days(32),
            subscription_end: now - expired_for,
            temporary_upgrade: false,
            previous_plan: None,
            created_at: now - ChronoDuration::days(60),
            updated_at: now,
        }
    }

    fn elapsed_boost(tenant_id: Uuid, id: i64, boost_days: i64) -> SubscriptionRecordEntity {
        let now = Utc::now();
        SubscriptionRecordEntity {
            id,
            tenant_id,
            plan: PlanTier::Pro.as_str().to_string(),
            start_date: now - ChronoDuration::days(boost_days),
            end_date: now,
            status: RecordStatus::Active.as_str().to_string(),
            amount_minor: 4_900,
            temporary_upgrade: true,
            previous_plan: Some(PlanTier::Basic.as_str().to_string()),
            history_entry_id: Some(id * 10),
            baseline_history_id: Some(id * 10 + 1),
            created_at: now - ChronoDuration::days(boost_days),
        }
    }

    fn baseline_for(boost: &SubscriptionRecordEntity, days_banked: i64) -> SubscriptionHistoryEntity {
        SubscriptionHistoryEntity {
            id: boost.baseline_history_id.unwrap(),
            tenant_id: boost.tenant_id,
            plan: PlanTier::Basic.as_str().to_string(),
            start_date: boost.start_date - ChronoDuration::days(5),
            end_date: boost.start_date + ChronoDuration::days(days_banked),
            price_minor: 9_900,
            duration_days: days_banked as i32,
            is_temporary: false,
            reverted: false,
            created_at: boost.start_date,
        }
    }

    fn no_expired_paid(mocks: &mut Mocks) {
        mocks
            .tenant_repo
            .expect_list_expired_paid()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
    }

    fn no_expired_boosts(mocks: &mut Mocks) {
        mocks
            .record_repo
            .expect_list_expired_temporary()
            .returning(|_| Box::pin(async { Ok(vec![]) }));
    }

    #[tokio::test]
    async fn sweep_reverts_an_elapsed_boost() {
        let mut mocks = Mocks::new();
        no_expired_paid(&mut mocks);

        // Scenario: 5-day boost over a baseline with 25 banked days. After
        // the sweep the tenant is basic again with 20 days left.
        let tenant_id = Uuid::new_v4();
        let boost = elapsed_boost(tenant_id, 7, 5);
        let baseline = baseline_for(&boost, 25);
        let tenant = boosted_tenant(tenant_id, boost.end_date);

        let scan_boost = boost.clone();
        mocks
            .record_repo
            .expect_list_expired_temporary()
            .returning(move |_| {
                let boost = scan_boost.clone();
                Box::pin(async move { Ok(vec![boost]) })
            });
        mocks
            .tenant_repo
            .expect_find_by_id()
            .with(eq(tenant_id))
            .returning(move |_| {
                let tenant = tenant.clone();
                Box::pin(async move { Ok(Some(tenant)) })
            });
        mocks
            .record_repo
            .expect_find_temporary_by_tenant()
            .returning(move |_| {
                let boost = boost.clone();
                Box::pin(async move { Ok(Some(boost)) })
            });
        mocks
            .history_repo
            .expect_find_by_id()
            .with(eq(71))
            .returning(move |_| {
                let baseline = baseline.clone();
                Box::pin(async move { Ok(Some(baseline)) })
            });

        let before = Utc::now();
        mocks
            .write_repo
            .expect_apply_revert()
            .withf(move |write| {
                write.restored_plan == PlanTier::Basic
                    && write.new_end >= before + ChronoDuration::days(20)
                    && write.new_end <= Utc::now() + ChronoDuration::days(20)
            })
            .returning(|_| Box::pin(async { Ok(WriteOutcome::Applied) }));
        mocks
            .plan_features
            .expect_apply_plan_limits()
            .with(eq(tenant_id), eq(PlanTier::Basic))
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let sweeper = mocks.into_sweeper();
        let report = sweeper.run_sweep().await.unwrap();

        assert_eq!(report.reverted, 1);
        assert_eq!(report.failed, 0);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn sweep_downgrades_expired_paid_plans_without_touching_the_end() {
        let mut mocks = Mocks::new();
        no_expired_boosts(&mut mocks);

        let tenant = expired_paid_tenant(PlanTier::Pro, ChronoDuration::days(2));
        let tenant_id = tenant.id;
        let lapsed_end = tenant.subscription_end;

        let scan_tenant = tenant.clone();
        mocks
            .tenant_repo
            .expect_list_expired_paid()
            .returning(move |_| {
                let tenant = scan_tenant.clone();
                Box::pin(async move { Ok(vec![tenant]) })
            });
        mocks
            .write_repo
            .expect_apply_expiry_downgrade()
            .withf(move |write| {
                // The guard pins the lapsed end date; the write never moves it.
                write.tenant_id == tenant_id && write.guard.subscription_end == lapsed_end
            })
            .returning(|_| Box::pin(async { Ok(WriteOutcome::Applied) }));
        mocks
            .plan_features
            .expect_apply_plan_limits()
            .with(eq(tenant_id), eq(PlanTier::Basic))
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let sweeper = mocks.into_sweeper();
        let report = sweeper.run_sweep().await.unwrap();

        assert_eq!(report.downgraded, 1);
        assert_eq!(report.failed, 0);
    }

    #[tokio::test]
    async fn sweep_isolates_per_tenant_failures() {
        let mut mocks = Mocks::new();
        no_expired_paid(&mut mocks);

        let failing_id = Uuid::new_v4();
        let healthy_id = Uuid::new_v4();
        let failing_boost = elapsed_boost(failing_id, 1, 5);
        let healthy_boost = elapsed_boost(healthy_id, 2, 5);
        let baseline = baseline_for(&healthy_boost, 25);
        let healthy_tenant = boosted_tenant(healthy_id, healthy_boost.end_date);

        let scan: Vec<SubscriptionRecordEntity> =
            vec![failing_boost.clone(), healthy_boost.clone()];
        mocks
            .record_repo
            .expect_list_expired_temporary()
            .returning(move |_| {
                let scan = scan.clone();
                Box::pin(async move { Ok(scan) })
            });

        mocks
            .tenant_repo
            .expect_find_by_id()
            .with(eq(failing_id))
            .returning(|_| Box::pin(async { Err(anyhow::anyhow!("connection reset")) }));
        mocks
            .tenant_repo
            .expect_find_by_id()
            .with(eq(healthy_id))
            .returning(move |_| {
                let tenant = healthy_tenant.clone();
                Box::pin(async move { Ok(Some(tenant)) })
            });
        mocks
            .record_repo
            .expect_find_temporary_by_tenant()
            .with(eq(healthy_id))
            .returning(move |_| {
                let boost = healthy_boost.clone();
                Box::pin(async move { Ok(Some(boost)) })
            });
        mocks
            .history_repo
            .expect_find_by_id()
            .returning(move |_| {
                let baseline = baseline.clone();
                Box::pin(async move { Ok(Some(baseline)) })
            });
        mocks
            .write_repo
            .expect_apply_revert()
            .returning(|_| Box::pin(async { Ok(WriteOutcome::Applied) }));
        mocks
            .plan_features
            .expect_apply_plan_limits()
            .returning(|_, _| Box::pin(async { Ok(()) }));

        let sweeper = mocks.into_sweeper();
        let report = sweeper.run_sweep().await.unwrap();

        assert_eq!(report.reverted, 1);
        assert_eq!(report.failed, 1);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].tenant_id, failing_id);
    }

    #[tokio::test]
    async fn sweep_skips_tenants_that_changed_mid_sweep() {
        let mut mocks = Mocks::new();
        no_expired_boosts(&mut mocks);

        let tenant = expired_paid_tenant(PlanTier::Enterprise, ChronoDuration::days(1));

        let scan_tenant = tenant.clone();
        mocks
            .tenant_repo
            .expect_list_expired_paid()
            .returning(move |_| {
                let tenant = scan_tenant.clone();
                Box::pin(async move { Ok(vec![tenant]) })
            });
        // The tenant extended between the scan and the write: benign skip.
        mocks
            .write_repo
            .expect_apply_expiry_downgrade()
            .returning(|_| Box::pin(async { Ok(WriteOutcome::Conflict) }));

        let sweeper = mocks.into_sweeper();
        let report = sweeper.run_sweep().await.unwrap();

        assert_eq!(report.downgraded, 0);
        assert_eq!(report.failed, 0);
        assert!(report.errors.is_empty());
    }

    #[tokio::test]
    async fn sweep_counts_already_reverted_boosts_as_nothing() {
        let mut mocks = Mocks::new();
        no_expired_paid(&mut mocks);

        let tenant_id = Uuid::new_v4();
        let boost = elapsed_boost(tenant_id, 3, 5);

        // By the time the sweeper gets to it the flag is already cleared.
        let mut reverted = boosted_tenant(tenant_id, boost.end_date);
        reverted.plan = PlanTier::Basic.as_str().to_string();
        reverted.temporary_upgrade = false;
        reverted.previous_plan = None;

        mocks
            .record_repo
            .expect_list_expired_temporary()
            .returning(move |_| {
                let boost = boost.clone();
                Box::pin(async move { Ok(vec![boost]) })
            });
        mocks
            .tenant_repo
            .expect_find_by_id()
            .returning(move |_| {
                let tenant = reverted.clone();
                Box::pin(async move { Ok(Some(tenant)) })
            });

        let sweeper = mocks.into_sweeper();
        let report = sweeper.run_sweep().await.unwrap();

        assert_eq!(report.reverted, 0);
        assert_eq!(report.failed, 0);
    }
}

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::subscription_history::InsertSubscriptionHistoryEntity;
use crate::domain::entities::subscription_records::InsertSubscriptionRecordEntity;
use crate::domain::entities::tenants::TenantEntity;
use crate::domain::repositories::subscription_writes::SubscriptionWriteRepository;
use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::domain::value_objects::enums::record_statuses::RecordStatus;
use crate::domain::value_objects::subscriptions::{
    ExpiryDowngradeWrite, ExtensionWrite, HistoryEntryDraft, PeriodRecordDraft, ReductionWrite,
    RevertWrite, TenantStateGuard, UpgradeWrite, WriteOutcome,
};
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::{
    subscription_history, subscription_records, tenant_addons, tenants,
};

pub struct SubscriptionWritePostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionWritePostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

/// Re-reads the tenant row under `FOR UPDATE` and verifies the fields the
/// caller based its decision on. A `None` means the row disappeared; both
/// cases surface as a conflict so the caller can retry from fresh state.
fn lock_and_verify(
    conn: &mut PgConnection,
    tenant_id: Uuid,
    guard: &TenantStateGuard,
) -> Result<Option<TenantEntity>, diesel::result::Error> {
    let tenant = tenants::table
        .find(tenant_id)
        .select(TenantEntity::as_select())
        .for_update()
        .first::<TenantEntity>(conn)
        .optional()?;

    let Some(tenant) = tenant else {
        return Ok(None);
    };

    let matches = tenant.plan == guard.plan.as_str()
        && tenant.temporary_upgrade == guard.temporary_upgrade
        && tenant.previous_plan.as_deref() == guard.previous_plan.map(|plan| plan.as_str())
        && tenant.subscription_end == guard.subscription_end;

    Ok(matches.then_some(tenant))
}

fn record_row(
    tenant_id: Uuid,
    draft: &PeriodRecordDraft,
    history_entry_id: Option<i64>,
    baseline_history_id: Option<i64>,
) -> InsertSubscriptionRecordEntity {
    InsertSubscriptionRecordEntity {
        tenant_id,
        plan: draft.plan.as_str().to_string(),
        start_date: draft.start_date,
        end_date: draft.end_date,
        status: RecordStatus::Active.as_str().to_string(),
        amount_minor: draft.amount_minor,
        temporary_upgrade: draft.temporary_upgrade,
        previous_plan: draft.previous_plan.map(|plan| plan.as_str().to_string()),
        history_entry_id,
        baseline_history_id,
    }
}

fn history_row(tenant_id: Uuid, draft: &HistoryEntryDraft) -> InsertSubscriptionHistoryEntity {
    InsertSubscriptionHistoryEntity {
        tenant_id,
        plan: draft.plan.as_str().to_string(),
        start_date: draft.start_date,
        end_date: draft.end_date,
        price_minor: draft.price_minor,
        duration_days: draft.duration_days,
        is_temporary: draft.is_temporary,
        reverted: false,
    }
}

#[async_trait]
impl SubscriptionWriteRepository for SubscriptionWritePostgres {
    async fn apply_extension(&self, write: ExtensionWrite) -> Result<WriteOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<WriteOutcome, diesel::result::Error, _>(|conn| {
            if lock_and_verify(conn, write.tenant_id, &write.guard)?.is_none() {
                return Ok(WriteOutcome::Conflict);
            }

            diesel::update(tenants::table.find(write.tenant_id))
                .set((
                    tenants::plan.eq(write.plan.as_str()),
                    tenants::subscription_start.eq(write.new_start),
                    tenants::subscription_end.eq(write.new_end),
                    tenants::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            diesel::insert_into(subscription_records::table)
                .values(record_row(write.tenant_id, &write.record, None, None))
                .execute(conn)?;

            // Add-ons ride on the subscription; any active one reaching past
            // the new end is clipped, except flat-duration purchases.
            diesel::update(
                tenant_addons::table
                    .filter(tenant_addons::tenant_id.eq(write.tenant_id))
                    .filter(tenant_addons::active.eq(true))
                    .filter(tenant_addons::flat_duration.eq(false))
                    .filter(tenant_addons::expires_at.gt(write.new_end)),
            )
            .set(tenant_addons::expires_at.eq(write.new_end))
            .execute(conn)?;

            Ok(WriteOutcome::Applied)
        })?;

        Ok(outcome)
    }

    async fn apply_upgrade(&self, write: UpgradeWrite) -> Result<WriteOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<WriteOutcome, diesel::result::Error, _>(|conn| {
            if lock_and_verify(conn, write.tenant_id, &write.guard)?.is_none() {
                return Ok(WriteOutcome::Conflict);
            }

            diesel::update(tenants::table.find(write.tenant_id))
                .set((
                    tenants::plan.eq(write.new_plan.as_str()),
                    tenants::subscription_end.eq(write.new_end),
                    tenants::temporary_upgrade.eq(write.temporary_upgrade),
                    tenants::previous_plan
                        .eq(write.previous_plan.map(|plan| plan.as_str().to_string())),
                    tenants::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            let mut baseline_id = None;
            let mut boost_id = None;

            if let Some(baseline) = &write.baseline_history {
                // The pre-boost baseline must exist before the boost entry so
                // revert always has something to anchor on. Reuse a matching
                // entry rather than duplicating it on repeated boosts.
                let existing = subscription_history::table
                    .filter(subscription_history::tenant_id.eq(write.tenant_id))
                    .filter(subscription_history::is_temporary.eq(false))
                    .filter(subscription_history::reverted.eq(false))
                    .filter(subscription_history::plan.eq(baseline.plan.as_str()))
                    .filter(subscription_history::end_date.eq(baseline.end_date))
                    .order(subscription_history::created_at.desc())
                    .select(subscription_history::id)
                    .first::<i64>(conn)
                    .optional()?;

                let id = match existing {
                    Some(id) => id,
                    None => diesel::insert_into(subscription_history::table)
                        .values(history_row(write.tenant_id, baseline))
                        .returning(subscription_history::id)
                        .get_result::<i64>(conn)?,
                };
                baseline_id = Some(id);
            }

            if let Some(boost) = &write.boost_history {
                let id = diesel::insert_into(subscription_history::table)
                    .values(history_row(write.tenant_id, boost))
                    .returning(subscription_history::id)
                    .get_result::<i64>(conn)?;
                boost_id = Some(id);
            }

            diesel::insert_into(subscription_records::table)
                .values(record_row(write.tenant_id, &write.record, boost_id, baseline_id))
                .execute(conn)?;

            Ok(WriteOutcome::Applied)
        })?;

        Ok(outcome)
    }

    async fn apply_revert(&self, write: RevertWrite) -> Result<WriteOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<WriteOutcome, diesel::result::Error, _>(|conn| {
            if lock_and_verify(conn, write.tenant_id, &write.guard)?.is_none() {
                return Ok(WriteOutcome::Conflict);
            }

            // A stale temporary record must never be re-read as current
            // state, so the row is removed rather than archived.
            let deleted =
                diesel::delete(subscription_records::table.find(write.boost_record_id))
                    .execute(conn)?;
            if deleted == 0 {
                return Err(diesel::result::Error::NotFound);
            }

            diesel::update(tenants::table.find(write.tenant_id))
                .set((
                    tenants::plan.eq(write.restored_plan.as_str()),
                    tenants::subscription_end.eq(write.new_end),
                    tenants::temporary_upgrade.eq(false),
                    tenants::previous_plan.eq::<Option<String>>(None),
                    tenants::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            diesel::update(subscription_history::table.find(write.boost_history_id))
                .set(subscription_history::reverted.eq(true))
                .execute(conn)?;

            Ok(WriteOutcome::Applied)
        })?;

        Ok(outcome)
    }

    async fn apply_reduction(&self, write: ReductionWrite) -> Result<WriteOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<WriteOutcome, diesel::result::Error, _>(|conn| {
            if lock_and_verify(conn, write.tenant_id, &write.guard)?.is_none() {
                return Ok(WriteOutcome::Conflict);
            }

            match write.boost_teardown {
                Some(teardown) => {
                    let deleted = diesel::delete(
                        subscription_records::table.find(teardown.boost_record_id),
                    )
                    .execute(conn)?;
                    if deleted == 0 {
                        return Err(diesel::result::Error::NotFound);
                    }

                    diesel::update(
                        subscription_history::table.find(teardown.boost_history_id),
                    )
                    .set(subscription_history::reverted.eq(true))
                    .execute(conn)?;

                    diesel::update(tenants::table.find(write.tenant_id))
                        .set((
                            tenants::plan.eq(teardown.restored_plan.as_str()),
                            tenants::subscription_end.eq(write.new_end),
                            tenants::temporary_upgrade.eq(false),
                            tenants::previous_plan.eq::<Option<String>>(None),
                            tenants::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                }
                None => {
                    diesel::update(tenants::table.find(write.tenant_id))
                        .set((
                            tenants::subscription_end.eq(write.new_end),
                            tenants::updated_at.eq(Utc::now()),
                        ))
                        .execute(conn)?;
                }
            }

            Ok(WriteOutcome::Applied)
        })?;

        Ok(outcome)
    }

    async fn apply_expiry_downgrade(&self, write: ExpiryDowngradeWrite) -> Result<WriteOutcome> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let outcome = conn.transaction::<WriteOutcome, diesel::result::Error, _>(|conn| {
            if lock_and_verify(conn, write.tenant_id, &write.guard)?.is_none() {
                return Ok(WriteOutcome::Conflict);
            }

            // Expired baseline plans get no time refund: the end stays put.
            diesel::update(tenants::table.find(write.tenant_id))
                .set((
                    tenants::plan.eq(PlanTier::Basic.as_str()),
                    tenants::updated_at.eq(Utc::now()),
                ))
                .execute(conn)?;

            diesel::update(
                subscription_records::table
                    .filter(subscription_records::tenant_id.eq(write.tenant_id))
                    .filter(subscription_records::status.eq(RecordStatus::Active.as_str())),
            )
            .set(subscription_records::status.eq(RecordStatus::Expired.as_str()))
            .execute(conn)?;

            Ok(WriteOutcome::Applied)
        })?;

        Ok(outcome)
    }
}

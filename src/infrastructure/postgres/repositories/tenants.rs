use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::tenants::TenantEntity;
use crate::domain::repositories::tenants::TenantRepository;
use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::tenants;

pub struct TenantPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl TenantPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl TenantRepository for TenantPostgres {
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<TenantEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let tenant = tenants::table
            .find(tenant_id)
            .select(TenantEntity::as_select())
            .first::<TenantEntity>(&mut conn)
            .optional()?;

        Ok(tenant)
    }

    async fn list_expired_paid(&self, now: DateTime<Utc>) -> Result<Vec<TenantEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let paid_plans = vec![
            PlanTier::Pro.as_str().to_string(),
            PlanTier::Enterprise.as_str().to_string(),
        ];

        let result = tenants::table
            .filter(tenants::plan.eq_any(paid_plans))
            .filter(tenants::temporary_upgrade.eq(false))
            .filter(tenants::subscription_end.le(now))
            .select(TenantEntity::as_select())
            .load::<TenantEntity>(&mut conn)?;

        Ok(result)
    }
}

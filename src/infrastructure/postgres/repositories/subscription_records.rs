use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::subscription_records::SubscriptionRecordEntity;
use crate::domain::repositories::subscription_records::SubscriptionRecordRepository;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::subscription_records;

pub struct SubscriptionRecordPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionRecordPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionRecordRepository for SubscriptionRecordPostgres {
    async fn find_temporary_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<SubscriptionRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let record = subscription_records::table
            .filter(subscription_records::tenant_id.eq(tenant_id))
            .filter(subscription_records::temporary_upgrade.eq(true))
            .order(subscription_records::created_at.desc())
            .select(SubscriptionRecordEntity::as_select())
            .first::<SubscriptionRecordEntity>(&mut conn)
            .optional()?;

        Ok(record)
    }

    async fn list_expired_temporary(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionRecordEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_records::table
            .filter(subscription_records::temporary_upgrade.eq(true))
            .filter(subscription_records::end_date.le(now))
            .order(subscription_records::end_date.asc())
            .select(SubscriptionRecordEntity::as_select())
            .load::<SubscriptionRecordEntity>(&mut conn)?;

        Ok(result)
    }
}

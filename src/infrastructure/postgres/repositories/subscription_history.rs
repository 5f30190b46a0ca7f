use anyhow::Result;
use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::subscription_history::SubscriptionHistoryEntity;
use crate::domain::repositories::subscription_history::SubscriptionHistoryRepository;
use crate::infrastructure::postgres::postgres_connection::PgPoolSquad;
use crate::infrastructure::postgres::schema::subscription_history;

pub struct SubscriptionHistoryPostgres {
    db_pool: Arc<PgPoolSquad>,
}

impl SubscriptionHistoryPostgres {
    pub fn new(db_pool: Arc<PgPoolSquad>) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl SubscriptionHistoryRepository for SubscriptionHistoryPostgres {
    async fn find_by_id(&self, id: i64) -> Result<Option<SubscriptionHistoryEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let entry = subscription_history::table
            .find(id)
            .select(SubscriptionHistoryEntity::as_select())
            .first::<SubscriptionHistoryEntity>(&mut conn)
            .optional()?;

        Ok(entry)
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<SubscriptionHistoryEntity>> {
        let mut conn = Arc::clone(&self.db_pool).get()?;

        let result = subscription_history::table
            .filter(subscription_history::tenant_id.eq(tenant_id))
            .order(subscription_history::created_at.desc())
            .select(SubscriptionHistoryEntity::as_select())
            .load::<SubscriptionHistoryEntity>(&mut conn)?;

        Ok(result)
    }
}

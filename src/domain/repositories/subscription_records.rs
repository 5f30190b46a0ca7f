use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscription_records::SubscriptionRecordEntity;

#[async_trait]
#[automock]
pub trait SubscriptionRecordRepository {
    /// The tenant's temporary-boost period record, if one exists. At most one
    /// can exist at a time because boosts cannot stack.
    async fn find_temporary_by_tenant(
        &self,
        tenant_id: Uuid,
    ) -> Result<Option<SubscriptionRecordEntity>>;

    /// Temporary records whose window has closed. Feeds the sweeper's revert
    /// pass.
    async fn list_expired_temporary(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<SubscriptionRecordEntity>>;
}

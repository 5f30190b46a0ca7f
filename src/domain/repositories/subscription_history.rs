use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::subscription_history::SubscriptionHistoryEntity;

#[async_trait]
#[automock]
pub trait SubscriptionHistoryRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<SubscriptionHistoryEntity>>;

    /// Ledger entries for a tenant, newest first.
    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<SubscriptionHistoryEntity>>;
}

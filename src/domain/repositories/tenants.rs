use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mockall::automock;
use uuid::Uuid;

use crate::domain::entities::tenants::TenantEntity;

#[async_trait]
#[automock]
pub trait TenantRepository {
    async fn find_by_id(&self, tenant_id: Uuid) -> Result<Option<TenantEntity>>;

    /// Paid-tier tenants whose subscription has lapsed without an active
    /// boost. Feeds the sweeper's downgrade pass.
    async fn list_expired_paid(&self, now: DateTime<Utc>) -> Result<Vec<TenantEntity>>;
}

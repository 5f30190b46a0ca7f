use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;
use uuid::Uuid;

use crate::domain::value_objects::enums::plan_tiers::PlanTier;

/// Plan-features service. Enforces per-tier resource quotas; safe to call
/// repeatedly and never mutates subscription state itself.
#[async_trait]
#[automock]
pub trait PlanFeaturesGateway {
    /// Deactivate staff/outlets/products beyond the tier's quotas.
    async fn apply_plan_limits(&self, tenant_id: Uuid, plan: PlanTier) -> Result<()>;

    /// Bring back staff accounts that were auto-deactivated while the
    /// subscription was lapsed.
    async fn reactivate_staff(&self, tenant_id: Uuid) -> Result<()>;
}

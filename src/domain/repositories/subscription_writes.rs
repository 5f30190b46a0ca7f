use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::subscriptions::{
    ExpiryDowngradeWrite, ExtensionWrite, ReductionWrite, RevertWrite, UpgradeWrite, WriteOutcome,
};

/// The engine's transactional write surface. Every method runs as one
/// database transaction that locks the tenant row, compares the embedded
/// `TenantStateGuard` against the live row, and applies nothing on mismatch.
#[async_trait]
#[automock]
pub trait SubscriptionWriteRepository {
    /// Tenant plan/start/end update plus the new period record. Active
    /// non-flat add-ons reaching past the new end are clipped down to it.
    async fn apply_extension(&self, write: ExtensionWrite) -> Result<WriteOutcome>;

    /// Tenant update plus the new period record; for temporary boosts also
    /// the baseline ledger entry (reused when one already matches) and the
    /// boost's own ledger entry, both linked from the record.
    async fn apply_upgrade(&self, write: UpgradeWrite) -> Result<WriteOutcome>;

    /// Deletes the boost record, restores the tenant to its previous plan
    /// with the recomputed end, and marks the boost ledger entry reverted.
    async fn apply_revert(&self, write: RevertWrite) -> Result<WriteOutcome>;

    /// Moves the subscription end earlier, tearing down an active boost when
    /// the shortened end no longer covers it.
    async fn apply_reduction(&self, write: ReductionWrite) -> Result<WriteOutcome>;

    /// Force-downgrades an expired paid tenant to the basic tier, leaving
    /// `subscription_end` untouched and marking its active records expired.
    async fn apply_expiry_downgrade(&self, write: ExpiryDowngradeWrite) -> Result<WriteOutcome>;
}

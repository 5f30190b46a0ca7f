use anyhow::Result;
use async_trait::async_trait;
use mockall::automock;

use crate::domain::value_objects::subscriptions::PlanChargedEvent;

/// Loyalty-points service. Fire and forget: a failed notification is logged
/// by the caller and never rolls back the subscription change it describes.
#[async_trait]
#[automock]
pub trait RewardPointsNotifier {
    async fn notify_charge(&self, event: PlanChargedEvent) -> Result<()>;
}

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::domain::repositories::reward_points::RewardPointsNotifier;
use crate::domain::value_objects::subscriptions::PlanChargedEvent;

/// Client for the loyalty-points service. Callers treat every failure here
/// as non-fatal; the subscription change has already been committed.
pub struct RewardPointsClient {
    http: reqwest::Client,
    base_url: String,
}

impl RewardPointsClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl RewardPointsNotifier for RewardPointsClient {
    async fn notify_charge(&self, event: PlanChargedEvent) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/v1/points/subscription-charge", self.base_url))
            .json(&event)
            .send()
            .await?;

        if resp.status().is_success() {
            return Ok(());
        }
        Err(anyhow!(
            "reward points notify_charge returned status {}",
            resp.status()
        ))
    }
}

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::repositories::plan_features::PlanFeaturesGateway;
use crate::domain::value_objects::enums::plan_tiers::PlanTier;

/// Client for the plan-features service, which owns quota enforcement
/// (staff, outlets, products) for each tier.
pub struct PlanFeaturesClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Serialize)]
struct ApplyLimitsBody {
    tenant_id: Uuid,
    plan: PlanTier,
}

#[derive(Debug, Serialize)]
struct ReactivateStaffBody {
    tenant_id: Uuid,
}

impl PlanFeaturesClient {
    pub fn new(base_url: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    async fn ensure_success(resp: reqwest::Response, context: &str) -> Result<()> {
        if resp.status().is_success() {
            return Ok(());
        }
        Err(anyhow!("{context} returned status {}", resp.status()))
    }
}

#[async_trait]
impl PlanFeaturesGateway for PlanFeaturesClient {
    async fn apply_plan_limits(&self, tenant_id: Uuid, plan: PlanTier) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/v1/plan-limits/apply", self.base_url))
            .json(&ApplyLimitsBody { tenant_id, plan })
            .send()
            .await?;

        Self::ensure_success(resp, "plan features apply_plan_limits").await
    }

    async fn reactivate_staff(&self, tenant_id: Uuid) -> Result<()> {
        let resp = self
            .http
            .post(format!("{}/v1/staff/reactivate", self.base_url))
            .json(&ReactivateStaffBody { tenant_id })
            .send()
            .await?;

        Self::ensure_success(resp, "plan features reactivate_staff").await
    }
}

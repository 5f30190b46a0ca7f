use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::application::usecases::lifecycle::LifecycleUseCase;
use crate::domain::repositories::{
    plan_features::PlanFeaturesGateway, reward_points::RewardPointsNotifier,
    subscription_history::SubscriptionHistoryRepository,
    subscription_records::SubscriptionRecordRepository,
    subscription_writes::SubscriptionWriteRepository, tenants::TenantRepository,
};
use crate::domain::value_objects::enums::plan_tiers::PlanTier;
use crate::domain::value_objects::enums::upgrade_types::UpgradeType;
use crate::domain::value_objects::subscriptions::{
    ExtendSubscriptionRequest, ReduceDurationRequest, UpgradeSubscriptionRequest,
};

pub fn routes<T, R, H, W, F, N>(engine: Arc<LifecycleUseCase<T, R, H, W, F, N>>) -> Router
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    Router::new()
        .route("/plans", get(list_plans))
        .route("/:tenant_id", get(subscription_state))
        .route("/:tenant_id/history", get(plan_history))
        .route("/:tenant_id/extend", post(extend))
        .route("/:tenant_id/upgrade", post(upgrade))
        .route("/:tenant_id/reduce", post(reduce_duration))
        .route("/:tenant_id/revert", post(revert))
        .with_state(engine)
}

pub async fn list_plans<T, R, H, W, F, N>(
    State(engine): State<Arc<LifecycleUseCase<T, R, H, W, F, N>>>,
) -> impl IntoResponse
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    Json(engine.list_plans()).into_response()
}

pub async fn subscription_state<T, R, H, W, F, N>(
    State(engine): State<Arc<LifecycleUseCase<T, R, H, W, F, N>>>,
    Path(tenant_id): Path<Uuid>,
) -> impl IntoResponse
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    match engine.subscription_state(tenant_id).await {
        Ok(state) => Json(state).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn plan_history<T, R, H, W, F, N>(
    State(engine): State<Arc<LifecycleUseCase<T, R, H, W, F, N>>>,
    Path(tenant_id): Path<Uuid>,
) -> impl IntoResponse
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    match engine.plan_history(tenant_id).await {
        Ok(entries) => Json(entries).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn extend<T, R, H, W, F, N>(
    State(engine): State<Arc<LifecycleUseCase<T, R, H, W, F, N>>>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<ExtendSubscriptionRequest>,
) -> impl IntoResponse
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    info!(%tenant_id, plan = %payload.plan, "subscriptions: extend request received");

    let Some(plan) = PlanTier::from_str(&payload.plan) else {
        return (
            StatusCode::BAD_REQUEST,
            format!("unknown plan: {}", payload.plan),
        )
            .into_response();
    };

    match engine.extend(tenant_id, plan, payload.duration_days).await {
        Ok(receipt) => Json(receipt).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn upgrade<T, R, H, W, F, N>(
    State(engine): State<Arc<LifecycleUseCase<T, R, H, W, F, N>>>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<UpgradeSubscriptionRequest>,
) -> impl IntoResponse
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    info!(
        %tenant_id,
        new_plan = %payload.new_plan,
        upgrade_type = %payload.upgrade_type,
        "subscriptions: upgrade request received"
    );

    let Some(new_plan) = PlanTier::from_str(&payload.new_plan) else {
        return (
            StatusCode::BAD_REQUEST,
            format!("unknown plan: {}", payload.new_plan),
        )
            .into_response();
    };
    let Some(upgrade_type) = UpgradeType::from_str(&payload.upgrade_type) else {
        return (
            StatusCode::BAD_REQUEST,
            format!("unknown upgrade type: {}", payload.upgrade_type),
        )
            .into_response();
    };

    match engine
        .upgrade(tenant_id, new_plan, upgrade_type, payload.custom_duration_days)
        .await
    {
        Ok(receipt) => Json(receipt).into_response(),
        Err(err) => err.into_response(),
    }
}

pub async fn reduce_duration<T, R, H, W, F, N>(
    State(engine): State<Arc<LifecycleUseCase<T, R, H, W, F, N>>>,
    Path(tenant_id): Path<Uuid>,
    Json(payload): Json<ReduceDurationRequest>,
) -> impl IntoResponse
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    info!(%tenant_id, days = payload.days, "subscriptions: reduce request received");

    match engine.reduce_duration(tenant_id, payload.days).await {
        Ok(state) => Json(state).into_response(),
        Err(err) => err.into_response(),
    }
}

#[derive(Debug, Serialize)]
pub struct RevertResponse {
    pub reverted: bool,
    pub plan: Option<PlanTier>,
    pub new_subscription_end: Option<DateTime<Utc>>,
}

pub async fn revert<T, R, H, W, F, N>(
    State(engine): State<Arc<LifecycleUseCase<T, R, H, W, F, N>>>,
    Path(tenant_id): Path<Uuid>,
) -> impl IntoResponse
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    info!(%tenant_id, "subscriptions: revert request received");

    use crate::domain::value_objects::subscriptions::RevertOutcome;

    match engine.revert(tenant_id).await {
        Ok(RevertOutcome::Reverted {
            restored_plan,
            new_end,
        }) => Json(RevertResponse {
            reverted: true,
            plan: Some(restored_plan),
            new_subscription_end: Some(new_end),
        })
        .into_response(),
        Ok(RevertOutcome::NotBoosted) => Json(RevertResponse {
            reverted: false,
            plan: None,
            new_subscription_end: None,
        })
        .into_response(),
        Err(err) => err.into_response(),
    }
}

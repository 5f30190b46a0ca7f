use std::sync::Arc;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::post,
};
use tracing::error;

use crate::application::usecases::sweeper::SweeperUseCase;
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{
    plan_features::PlanFeaturesGateway, reward_points::RewardPointsNotifier,
    subscription_history::SubscriptionHistoryRepository,
    subscription_records::SubscriptionRecordRepository,
    subscription_writes::SubscriptionWriteRepository, tenants::TenantRepository,
};

// Run example
//   curl -X POST "http://localhost:$SERVER_PORT/internal/v1/sweep" \
//     -H "Authorization: Bearer $INTERNAL_SWEEP_TOKEN"

pub struct SweepRouteState<T, R, H, W, F, N>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    config: Arc<DotEnvyConfig>,
    sweeper: Arc<SweeperUseCase<T, R, H, W, F, N>>,
}

impl<T, R, H, W, F, N> Clone for SweepRouteState<T, R, H, W, F, N>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            sweeper: Arc::clone(&self.sweeper),
        }
    }
}

pub fn routes<T, R, H, W, F, N>(
    config: Arc<DotEnvyConfig>,
    sweeper: Arc<SweeperUseCase<T, R, H, W, F, N>>,
) -> Router
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    Router::new()
        .route("/sweep", post(run_sweep))
        .with_state(SweepRouteState { config, sweeper })
}

pub async fn run_sweep<T, R, H, W, F, N>(
    State(state): State<SweepRouteState<T, R, H, W, F, N>>,
    headers: HeaderMap,
) -> Response
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    let expected_token = match state.config.sweeper.internal_token.as_deref() {
        Some(token) => token,
        None => {
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                "sweep token is not configured",
            )
                .into_response();
        }
    };

    if let Err(status) = authorize_bearer(&headers, expected_token) {
        return (status, "unauthorized").into_response();
    }

    match state.sweeper.run_sweep().await {
        Ok(report) => Json(report).into_response(),
        Err(err) => {
            error!(error = ?err, "sweep: trigger failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "sweep failed").into_response()
        }
    }
}

fn authorize_bearer(headers: &HeaderMap, expected_token: &str) -> Result<(), StatusCode> {
    let auth = headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let token = auth
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token == expected_token {
        Ok(())
    } else {
        Err(StatusCode::UNAUTHORIZED)
    }
}

use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::Result;
use axum::{
    Router,
    http::{
        Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::get,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;

use crate::application::usecases::{lifecycle::LifecycleUseCase, sweeper::SweeperUseCase};
use crate::config::config_model::DotEnvyConfig;
use crate::domain::repositories::{
    plan_features::PlanFeaturesGateway, reward_points::RewardPointsNotifier,
    subscription_history::SubscriptionHistoryRepository,
    subscription_records::SubscriptionRecordRepository,
    subscription_writes::SubscriptionWriteRepository, tenants::TenantRepository,
};
use crate::infrastructure::axum_http::{default_routers, routers};

pub async fn start<T, R, H, W, F, N>(
    config: Arc<DotEnvyConfig>,
    engine: Arc<LifecycleUseCase<T, R, H, W, F, N>>,
    sweeper: Arc<SweeperUseCase<T, R, H, W, F, N>>,
) -> Result<()>
where
    T: TenantRepository + Send + Sync + 'static,
    R: SubscriptionRecordRepository + Send + Sync + 'static,
    H: SubscriptionHistoryRepository + Send + Sync + 'static,
    W: SubscriptionWriteRepository + Send + Sync + 'static,
    F: PlanFeaturesGateway + Send + Sync + 'static,
    N: RewardPointsNotifier + Send + Sync + 'static,
{
    let app = Router::new()
        .fallback(default_routers::not_found)
        .nest("/api/v1/subscriptions", routers::subscriptions::routes(engine))
        .nest(
            "/internal/v1",
            routers::sweep::routes(Arc::clone(&config), sweeper),
        )
        .route("/api/v1/health-check", get(default_routers::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(config.server.timeout)))
        .layer(RequestBodyLimitLayer::new(config.server.body_limit))
        .layer(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers([AUTHORIZATION, CONTENT_TYPE])
                .allow_origin(Any),
        )
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    let listener = TcpListener::bind(addr).await?;

    info!("Server is running on port {}", config.server.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install CTRL+C signal handler");
    };

    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received ctrl+C signal"),
        _ = terminate => info!("Received terminate signal"),
    }
}

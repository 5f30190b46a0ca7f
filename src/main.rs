use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};

use tillkeeper::application::usecases::{
    lifecycle::LifecycleUseCase,
    sweeper::{self, SweeperUseCase},
};
use tillkeeper::config::config_loader;
use tillkeeper::domain::value_objects::plan_catalog::PlanCatalog;
use tillkeeper::infrastructure::axum_http::http_serve;
use tillkeeper::infrastructure::collaborators::{
    plan_features_client::PlanFeaturesClient, reward_points_client::RewardPointsClient,
};
use tillkeeper::infrastructure::postgres::postgres_connection;
use tillkeeper::infrastructure::postgres::repositories::{
    subscription_history::SubscriptionHistoryPostgres,
    subscription_records::SubscriptionRecordPostgres,
    subscription_writes::SubscriptionWritePostgres, tenants::TenantPostgres,
};
use tillkeeper::observability::init_observability;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(error) = run().await {
        error!("Service exited with error: {}", error);
        std::process::exit(1);
    }
    Ok(())
}

async fn run() -> Result<()> {
    dotenvy::dotenv().ok();
    init_observability("tillkeeper")?;

    let config = Arc::new(config_loader::load()?);
    info!("ENV has been loaded");

    let db_pool = Arc::new(postgres_connection::establish_connection(
        &config.database.url,
    )?);
    info!("Postgres connection has been established");

    let tenant_repo = Arc::new(TenantPostgres::new(Arc::clone(&db_pool)));
    let record_repo = Arc::new(SubscriptionRecordPostgres::new(Arc::clone(&db_pool)));
    let history_repo = Arc::new(SubscriptionHistoryPostgres::new(Arc::clone(&db_pool)));
    let write_repo = Arc::new(SubscriptionWritePostgres::new(Arc::clone(&db_pool)));

    let plan_features = Arc::new(PlanFeaturesClient::new(
        config.collaborators.plan_features_base_url.clone(),
    ));
    let reward_points = Arc::new(RewardPointsClient::new(
        config.collaborators.reward_points_base_url.clone(),
    ));

    let engine = Arc::new(LifecycleUseCase::new(
        Arc::clone(&tenant_repo),
        Arc::clone(&record_repo),
        Arc::clone(&history_repo),
        Arc::clone(&write_repo),
        Arc::clone(&plan_features),
        Arc::clone(&reward_points),
        Arc::new(PlanCatalog::default()),
    ));

    let sweeper_usecase = Arc::new(SweeperUseCase::new(
        Arc::clone(&engine),
        tenant_repo,
        record_repo,
        write_repo,
        plan_features,
    ));

    let http_server = tokio::spawn(http_serve::start(
        Arc::clone(&config),
        engine,
        Arc::clone(&sweeper_usecase),
    ));

    let sweep_loop = tokio::spawn(sweeper::run_loop(
        sweeper_usecase,
        config.sweeper.interval_secs,
    ));

    tokio::select! {
        result = http_server => result??,
        result = sweep_loop => result??,
    };

    Ok(())
}

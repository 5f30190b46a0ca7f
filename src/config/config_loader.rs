use anyhow::{Ok, Result};

use super::config_model::{Collaborators, Database, DotEnvyConfig, Server, Sweeper};

pub fn load() -> Result<DotEnvyConfig> {
    dotenvy::dotenv().ok();

    let server = Server {
        port: std::env::var("SERVER_PORT")
            .expect("SERVER_PORT is invalid")
            .parse()?,
        body_limit: std::env::var("SERVER_BODY_LIMIT")
            .unwrap_or_else(|_| "262144".to_string())
            .parse()?,
        timeout: std::env::var("SERVER_TIMEOUT")
            .unwrap_or_else(|_| "30".to_string())
            .parse()?,
    };

    let database = Database {
        url: std::env::var("DATABASE_URL").expect("DATABASE_URL is invalid"),
    };

    let sweeper = Sweeper {
        interval_secs: std::env::var("SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()?,
        internal_token: std::env::var("INTERNAL_SWEEP_TOKEN").ok().and_then(|v| {
            let trimmed = v.trim().to_string();
            (!trimmed.is_empty()).then_some(trimmed)
        }),
    };

    let collaborators = Collaborators {
        plan_features_base_url: std::env::var("PLAN_FEATURES_BASE_URL")
            .expect("PLAN_FEATURES_BASE_URL is invalid"),
        reward_points_base_url: std::env::var("REWARD_POINTS_BASE_URL")
            .expect("REWARD_POINTS_BASE_URL is invalid"),
    };

    Ok(DotEnvyConfig {
        server,
        database,
        sweeper,
        collaborators,
    })
}

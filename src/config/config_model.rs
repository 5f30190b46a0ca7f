#[derive(Debug, Clone)]
pub struct DotEnvyConfig {
    pub server: Server,
    pub database: Database,
    pub sweeper: Sweeper,
    pub collaborators: Collaborators,
}

#[derive(Debug, Clone)]
pub struct Server {
    pub port: u16,
    pub body_limit: usize,
    pub timeout: u64,
}

#[derive(Debug, Clone)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct Sweeper {
    /// Seconds between automatic sweep passes.
    pub interval_secs: u64,
    /// Bearer token guarding the internal sweep trigger. When unset the
    /// endpoint answers 503.
    pub internal_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Collaborators {
    pub plan_features_base_url: String,
    pub reward_points_base_url: String,
}

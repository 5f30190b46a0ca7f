pub mod plan_features_client;
pub mod reward_points_client;

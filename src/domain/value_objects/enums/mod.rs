pub mod plan_tiers;
pub mod record_statuses;
pub mod upgrade_types;

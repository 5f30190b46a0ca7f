pub mod subscription_history;
pub mod subscription_records;
pub mod subscription_writes;
pub mod tenants;

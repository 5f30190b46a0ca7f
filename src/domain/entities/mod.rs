pub mod subscription_history;
pub mod subscription_records;
pub mod tenant_addons;
pub mod tenants;

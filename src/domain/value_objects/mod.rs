pub mod enums;
pub mod plan_catalog;
pub mod proration;
pub mod subscriptions;

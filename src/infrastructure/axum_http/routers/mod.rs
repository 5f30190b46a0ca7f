pub mod subscriptions;
pub mod sweep;

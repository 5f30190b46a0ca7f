pub mod lifecycle;
pub mod sweeper;

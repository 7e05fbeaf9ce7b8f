pub mod aggregator;
pub mod dashboard;
pub mod handlers;

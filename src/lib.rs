pub mod config;
pub mod constants;
pub mod crawler;
pub mod error;
pub mod geocode;
pub mod logging;
pub mod metrics;
pub mod mission;
pub mod normalize;
pub mod parser;
pub mod rate_limiter;
pub mod types;

// Ports and their adapters
pub mod app;
pub mod infra;

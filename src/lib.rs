pub mod config;
pub mod denom;
pub mod lcd;
pub mod metrics;
pub mod queriers;
pub mod server;
pub mod telemetry;
pub mod types;

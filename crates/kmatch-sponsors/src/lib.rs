pub mod config;
pub mod error;
pub mod format;
pub mod pipeline;
pub mod register;
pub mod snapshot;
pub mod sponsors;
pub mod telemetry;

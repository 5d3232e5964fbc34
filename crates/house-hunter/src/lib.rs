pub mod config;
pub mod error;
pub mod ingest;
pub mod telemetry;
pub mod underwriting;

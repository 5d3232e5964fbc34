use crate::config::ConfigError;
use crate::ingest::IngestError;
use crate::telemetry::TelemetryError;
use crate::underwriting::{AssumptionError, FetchError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Assumptions(AssumptionError),
    Ingest(IngestError),
    Fetch(FetchError),
    Usage(String),
    Render(serde_json::Error),
    Io(std::io::Error),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Assumptions(err) => write!(f, "invalid assumptions: {}", err),
            AppError::Ingest(err) => write!(f, "ingest error: {}", err),
            AppError::Fetch(err) => write!(f, "listing retrieval failed: {}", err),
            AppError::Usage(message) => write!(f, "{}", message),
            AppError::Render(err) => write!(f, "unable to render report: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Assumptions(err) => Some(err),
            AppError::Ingest(err) => Some(err),
            AppError::Fetch(err) => Some(err),
            AppError::Usage(_) => None,
            AppError::Render(err) => Some(err),
            AppError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<AssumptionError> for AppError {
    fn from(value: AssumptionError) -> Self {
        Self::Assumptions(value)
    }
}

impl From<IngestError> for AppError {
    fn from(value: IngestError) -> Self {
        Self::Ingest(value)
    }
}

impl From<FetchError> for AppError {
    fn from(value: FetchError) -> Self {
        Self::Fetch(value)
    }
}

impl From<serde_json::Error> for AppError {
    fn from(value: serde_json::Error) -> Self {
        Self::Render(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

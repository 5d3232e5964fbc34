use crate::config::TelemetryConfig;
use std::fmt;
use tracing_subscriber::filter::ParseError;
use tracing_subscriber::EnvFilter;

/// Raised while installing the run's log subscriber.
#[derive(Debug)]
pub enum TelemetryError {
    /// `HOUSE_HUNTER_LOG_LEVEL` is not a valid filter directive.
    InvalidLevel { directive: String, source: ParseError },
    /// A global subscriber was already set.
    Install(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TelemetryError::InvalidLevel { directive, .. } => write!(
                f,
                "log level '{directive}' is not a valid filter (try info, debug or house_hunter=trace)"
            ),
            TelemetryError::Install(err) => write!(f, "unable to install log subscriber: {err}"),
        }
    }
}

impl std::error::Error for TelemetryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TelemetryError::InvalidLevel { source, .. } => Some(source),
            TelemetryError::Install(err) => Some(err.as_ref()),
        }
    }
}

/// Builds the filter from `RUST_LOG`, falling back to the configured level.
pub fn env_filter(config: &TelemetryConfig) -> Result<EnvFilter, TelemetryError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.log_level).map_err(|source| TelemetryError::InvalidLevel {
        directive: config.log_level.clone(),
        source,
    })
}

/// Installs a compact subscriber on stderr so reports on stdout stay machine-readable.
pub fn init(config: &TelemetryConfig) -> Result<(), TelemetryError> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter(config)?)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .with_ansi(false)
        .try_init()
        .map_err(TelemetryError::Install)
}

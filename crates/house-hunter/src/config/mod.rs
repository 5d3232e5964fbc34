mod calibration;

pub use calibration::{Calibration, HeuristicRentOverrides, PropertyTaxOverrides};

use std::collections::HashMap;
use std::env;
use std::fmt;
use std::path::{Path, PathBuf};

/// Optional KEY=VALUE file read next to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".house_hunter.env";

const RAPIDAPI_KEY: &str = "RAPIDAPI_KEY";
const LOG_LEVEL: &str = "HOUSE_HUNTER_LOG_LEVEL";
const CALIBRATION_FILE: &str = "HOUSE_HUNTER_CALIBRATION_FILE";

/// Top-level configuration resolved from the environment and config file.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telemetry: TelemetryConfig,
    pub rapidapi: RapidApiCredentials,
    /// JSON file overlaying the built-in heuristic and tax tables.
    pub calibration_file: Option<PathBuf>,
}

impl AppConfig {
    /// Loads `.env`, then the config file (a missing file is not an error).
    pub fn load(config_file: &Path) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let file_values = read_config_file(config_file)?;
        Ok(Self::from_values(|key| env::var(key).ok(), &file_values))
    }

    /// Resolves settings with the process environment taking precedence over the file.
    pub fn from_values<F>(env_lookup: F, file_values: &HashMap<String, String>) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| {
            env_lookup(key)
                .or_else(|| file_values.get(key).cloned())
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Self {
            telemetry: TelemetryConfig {
                log_level: lookup(LOG_LEVEL).unwrap_or_else(|| "info".to_string()),
            },
            rapidapi: RapidApiCredentials {
                api_key: lookup(RAPIDAPI_KEY),
            },
            calibration_file: lookup(CALIBRATION_FILE).map(PathBuf::from),
        }
    }

    /// Calibration from a CLI path, else the configured one; defaults when neither is set.
    pub fn calibration(&self, cli_override: Option<&Path>) -> Result<Calibration, ConfigError> {
        match cli_override.or(self.calibration_file.as_deref()) {
            Some(path) => Calibration::load(path),
            None => Ok(Calibration::default()),
        }
    }

    /// API key from a CLI override, else the resolved configuration.
    pub fn rapidapi_key(&self, cli_override: Option<&str>) -> Result<String, ConfigError> {
        cli_override
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(str::to_string)
            .or_else(|| self.rapidapi.api_key.clone())
            .ok_or(ConfigError::MissingApiKey)
    }
}

fn read_config_file(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    if !path.exists() {
        return Ok(HashMap::new());
    }

    let to_error = |source| ConfigError::File {
        path: path.to_path_buf(),
        source,
    };
    let mut values = HashMap::new();
    for item in dotenvy::from_path_iter(path).map_err(to_error)? {
        let (key, value) = item.map_err(to_error)?;
        values.insert(key, value);
    }
    Ok(values)
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Credentials for the RapidAPI realtor endpoints.
#[derive(Clone, Default)]
pub struct RapidApiCredentials {
    pub api_key: Option<String>,
}

impl fmt::Debug for RapidApiCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapidApiCredentials")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    MissingApiKey,
    File {
        path: PathBuf,
        source: dotenvy::Error,
    },
    CalibrationRead {
        path: PathBuf,
        source: std::io::Error,
    },
    CalibrationParse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiKey => write!(
                f,
                "RapidAPI key is required: pass --rapidapi-key, set RAPIDAPI_KEY, or add RAPIDAPI_KEY to the config file"
            ),
            ConfigError::File { path, .. } => {
                write!(f, "unable to read config file {}", path.display())
            }
            ConfigError::CalibrationRead { path, .. } => {
                write!(f, "unable to open calibration file {}", path.display())
            }
            ConfigError::CalibrationParse { path, source } => {
                write!(f, "invalid calibration file {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::MissingApiKey => None,
            ConfigError::File { source, .. } => Some(source),
            ConfigError::CalibrationRead { source, .. } => Some(source),
            ConfigError::CalibrationParse { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var(RAPIDAPI_KEY);
        env::remove_var(LOG_LEVEL);
        env::remove_var(CALIBRATION_FILE);
    }

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let path = env::temp_dir().join(format!("house-hunter-{}-{name}.env", std::process::id()));
        std::fs::write(&path, contents).expect("write temp config");
        path
    }

    #[test]
    fn load_uses_defaults_when_nothing_is_configured() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();

        let config = AppConfig::load(Path::new("./does-not-exist.env")).expect("config loads");
        assert_eq!(config.telemetry.log_level, "info");
        assert!(config.rapidapi.api_key.is_none());
        assert!(matches!(
            config.rapidapi_key(None),
            Err(ConfigError::MissingApiKey)
        ));
    }

    #[test]
    fn load_reads_key_value_file_with_quotes_and_comments() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let path = temp_config(
            "quoted",
            "# local overrides\nRAPIDAPI_KEY=\"file-key\"\nHOUSE_HUNTER_LOG_LEVEL='debug'\n",
        );

        let config = AppConfig::load(&path).expect("config loads");
        std::fs::remove_file(&path).ok();

        assert_eq!(config.rapidapi.api_key.as_deref(), Some("file-key"));
        assert_eq!(config.telemetry.log_level, "debug");
    }

    #[test]
    fn environment_overrides_file_and_cli_overrides_both() {
        let file_values = HashMap::from([(RAPIDAPI_KEY.to_string(), "file-key".to_string())]);
        let config = AppConfig::from_values(
            |key| (key == RAPIDAPI_KEY).then(|| "env-key".to_string()),
            &file_values,
        );

        assert_eq!(config.rapidapi_key(None).expect("key"), "env-key");
        assert_eq!(config.rapidapi_key(Some("cli-key")).expect("key"), "cli-key");
        assert_eq!(config.rapidapi_key(Some("  ")).expect("key"), "env-key");
    }

    #[test]
    fn calibration_path_prefers_cli_over_configuration() {
        let missing = PathBuf::from("./configured-calibration.json");
        let file_values = HashMap::from([(
            CALIBRATION_FILE.to_string(),
            missing.display().to_string(),
        )]);
        let config = AppConfig::from_values(|_| None, &file_values);
        assert_eq!(config.calibration_file.as_deref(), Some(missing.as_path()));

        match config.calibration(None) {
            Err(ConfigError::CalibrationRead { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected configured path to be read, got {other:?}"),
        }

        let cli_path = temp_config("calibration", r#"{"heuristic": {"minimum_rent": 750}}"#);
        let calibration = config.calibration(Some(&cli_path));
        std::fs::remove_file(&cli_path).ok();
        let calibration = calibration.expect("cli calibration loads");
        assert_eq!(calibration.heuristic.minimum_rent, Some(750.0));

        let unset = AppConfig::from_values(|_| None, &HashMap::new());
        assert_eq!(
            unset.calibration(None).expect("defaults"),
            Calibration::default()
        );
    }

    #[test]
    fn credentials_are_redacted_in_debug_output() {
        let credentials = RapidApiCredentials {
            api_key: Some("secret".to_string()),
        };
        assert!(!format!("{credentials:?}").contains("secret"));
    }
}

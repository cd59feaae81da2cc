//! Application configuration loaded from environment variables.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Default checkpoint file for backup rotation state.
pub const DEFAULT_CHECKPOINT_PATH: &str = "backup-suite-ids.csv";

/// Default HTTP request timeout in seconds.
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 60;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the TestRail instance (e.g. `https://example.testrail.io`)
    pub url: String,
    /// TestRail account used for API calls
    pub username: String,
    /// API key or password for the account
    pub password: SecretString,
    /// Numeric id of the account; plan listings are filtered to plans it created
    pub user_id: i64,
    /// Project that holds the plans and suites
    pub project_id: i64,
    /// Title of the plan to reuse or create
    pub plan_name: String,
    /// Plan whose structure is cloned when `plan_name` does not exist yet
    pub base_plan_id: i64,
    /// Optional run-name filter for the cloned plan; empty means all runs
    pub run_names: Vec<String>,
    /// Checkpoint file holding the previous rotation's backup suite ids
    pub checkpoint_path: PathBuf,
    /// Total timeout applied to every TestRail request
    pub http_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Required:
    /// - `TESTRAIL_URL`: base URL of the TestRail instance
    /// - `TESTRAIL_USERNAME`: account email
    /// - `TESTRAIL_PASSWORD`: API key or password
    /// - `TESTRAIL_USER_ID`: numeric id of the account
    /// - `TESTRAIL_PROJECT_ID`: project id
    /// - `TESTRAIL_PLAN_NAME`: title of the plan to reuse or create
    /// - `TESTRAIL_BASE_PLAN_ID`: id of the plan to clone from
    ///
    /// Optional:
    /// - `TESTRAIL_RUN_NAMES`: comma-separated run names to keep when cloning
    /// - `TESTRAIL_CHECKPOINT_PATH`: backup checkpoint file (default: backup-suite-ids.csv)
    /// - `TESTRAIL_HTTP_TIMEOUT_SECS`: request timeout in seconds (default: 60)
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = required("TESTRAIL_URL")?;
        let username = required("TESTRAIL_USERNAME")?;
        let password = SecretString::from(required("TESTRAIL_PASSWORD")?);

        let user_id = parse_id(&required("TESTRAIL_USER_ID")?, "TESTRAIL_USER_ID")?;
        let project_id = parse_id(&required("TESTRAIL_PROJECT_ID")?, "TESTRAIL_PROJECT_ID")?;
        let plan_name = required("TESTRAIL_PLAN_NAME")?;
        let base_plan_id = parse_id(&required("TESTRAIL_BASE_PLAN_ID")?, "TESTRAIL_BASE_PLAN_ID")?;

        let run_names = env::var("TESTRAIL_RUN_NAMES")
            .map(|v| parse_run_names(&v))
            .unwrap_or_default();

        let checkpoint_path = env::var("TESTRAIL_CHECKPOINT_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CHECKPOINT_PATH));

        let http_timeout = match env::var("TESTRAIL_HTTP_TIMEOUT_SECS") {
            Ok(v) => Duration::from_secs(v.parse::<u64>().map_err(|_| {
                ConfigError::InvalidValue("TESTRAIL_HTTP_TIMEOUT_SECS must be a number of seconds")
            })?),
            Err(_) => Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
        };

        let config = Config {
            url,
            username,
            password,
            user_id,
            project_id,
            plan_name,
            base_plan_id,
            run_names,
            checkpoint_path,
            http_timeout,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.url.starts_with("http://") && !self.url.starts_with("https://") {
            return Err(ConfigError::InvalidValue(
                "TESTRAIL_URL must start with http:// or https://",
            ));
        }
        if self.plan_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "TESTRAIL_PLAN_NAME must not be empty",
            ));
        }
        Ok(())
    }
}

/// Parse a comma-separated list of run names, dropping empty segments.
fn parse_run_names(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(ConfigError::MissingEnvVar(name)),
    }
}

fn parse_id(value: &str, name: &'static str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| ConfigError::InvalidId(name))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Invalid configuration value: {0}")]
    InvalidValue(&'static str),

    #[error("{0} must be a numeric TestRail id")]
    InvalidId(&'static str),
}

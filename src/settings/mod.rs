//! Settings and account configuration
//!
//! Two YAML files drive a run:
//!
//! ```yaml
//! # app_settings.yaml
//! engagement_settings:
//!   name: my_tweets
//!   endpoint: historical
//!   inbox: ./inbox
//!   outbox: ./outbox
//!   rate_limit_requests: 6
//!   rate_limit_seconds: 60
//!   max_top_tweets: 10
//! engagement_types:
//!   impressions: true
//!   favorites: true
//! engagement_groupings:
//!   by_tweet_type:
//!     - tweet.id
//!     - engagement.type
//! ```
//!
//! ```yaml
//! # accounts.yaml
//! engagement_api:
//!   bearer_token: AAAA...
//! ```

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

use crate::session::SessionConfig;
use crate::transport::http::DEFAULT_BASE_URL;
use crate::{Endpoint, Grouping, MetricFlag};

pub mod dates;

pub use dates::parse_date_spec;

/// Default application settings file
pub const DEFAULT_SETTINGS_PATH: &str = "./config/app_settings.yaml";

/// Default account file
pub const DEFAULT_ACCOUNT_PATH: &str = "./config/accounts.yaml";

/// Settings errors
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// File could not be read
    #[error("failed to read {path}: {message}")]
    ReadError {
        /// File path
        path: String,
        /// Underlying error
        message: String,
    },

    /// File is not valid YAML for the expected shape
    #[error("YAML error: {0}")]
    YamlError(String),

    /// Settings are present but unusable
    #[error("invalid settings: {0}")]
    Invalid(String),

    /// Unrecognized date specification
    #[error("unrecognized date: {0:?}")]
    InvalidDate(String),
}

/// Top-level application settings file
#[derive(Debug, Clone, Deserialize)]
pub struct AppSettings {
    /// Session and filesystem settings
    pub engagement_settings: EngagementSettings,
    /// Metric type flags in file order
    #[serde(default)]
    pub engagement_types: Mapping,
    /// Grouping definitions in file order
    #[serde(default)]
    pub engagement_groupings: Mapping,
}

/// The `engagement_settings` section
#[derive(Debug, Clone, Deserialize)]
pub struct EngagementSettings {
    /// Dataset name used to label output
    #[serde(default)]
    pub name: Option<String>,
    /// Endpoint name
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Directory identifier files are read from
    #[serde(default = "default_inbox")]
    pub inbox: PathBuf,
    /// Directory output is written to
    #[serde(default = "default_outbox")]
    pub outbox: PathBuf,
    /// Write output under `outbox/<name>`
    #[serde(default)]
    pub name_based_folders: bool,
    /// Requests allowed per window
    #[serde(default = "default_rate_limit_requests")]
    pub rate_limit_requests: u32,
    /// Window length in seconds
    #[serde(default = "default_rate_limit_seconds")]
    pub rate_limit_seconds: u64,
    /// Top-N board width; zero disables the Top Tweets section
    #[serde(default = "default_max_top_tweets")]
    pub max_top_tweets: usize,
    /// Historical start date specification
    #[serde(default)]
    pub start: Option<String>,
    /// Historical end date specification
    #[serde(default)]
    pub end: Option<String>,
    /// Archive raw responses
    #[serde(default = "default_save_api_responses")]
    pub save_api_responses: bool,
}

fn default_endpoint() -> String {
    Endpoint::Historical.to_string()
}

fn default_inbox() -> PathBuf {
    PathBuf::from("./inbox")
}

fn default_outbox() -> PathBuf {
    PathBuf::from("./outbox")
}

fn default_rate_limit_requests() -> u32 {
    6
}

fn default_rate_limit_seconds() -> u64 {
    60
}

fn default_max_top_tweets() -> usize {
    10
}

fn default_save_api_responses() -> bool {
    true
}

impl AppSettings {
    /// Load and validate a settings file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = read_file(path.as_ref())?;
        let settings = Self::from_yaml(&content)?;
        debug!("Loaded settings from {}", path.as_ref().display());
        Ok(settings)
    }

    /// Parse and validate settings YAML
    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        let settings: AppSettings =
            serde_yaml::from_str(content).map_err(|e| SettingsError::YamlError(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let s = &self.engagement_settings;
        if s.rate_limit_requests == 0 || s.rate_limit_seconds == 0 {
            return Err(SettingsError::Invalid(format!(
                "rate limit must be positive, got {} requests per {} seconds",
                s.rate_limit_requests, s.rate_limit_seconds
            )));
        }
        self.endpoint()?;
        self.metric_flags()?;
        self.groupings()?;
        Ok(())
    }

    /// Configured endpoint
    pub fn endpoint(&self) -> Result<Endpoint, SettingsError> {
        Endpoint::from_str(&self.engagement_settings.endpoint).map_err(SettingsError::Invalid)
    }

    /// Metric type flags in file order
    pub fn metric_flags(&self) -> Result<Vec<MetricFlag>, SettingsError> {
        self.engagement_types
            .iter()
            .map(|(name, enabled)| {
                let name = yaml_key(name, "engagement_types")?;
                let enabled = match enabled {
                    Value::Bool(b) => *b,
                    Value::Null => false,
                    other => {
                        return Err(SettingsError::Invalid(format!(
                            "engagement type '{name}' must be true or false, got {other:?}"
                        )))
                    }
                };
                Ok(MetricFlag { name, enabled })
            })
            .collect()
    }

    /// Grouping definitions in file order
    pub fn groupings(&self) -> Result<Vec<Grouping>, SettingsError> {
        self.engagement_groupings
            .iter()
            .map(|(name, keys)| {
                let name = yaml_key(name, "engagement_groupings")?;
                let keys = keys.as_sequence().ok_or_else(|| {
                    SettingsError::Invalid(format!("grouping '{name}' must be a list of keys"))
                })?;
                let group_by = keys
                    .iter()
                    .map(|k| {
                        k.as_str().map(str::to_string).ok_or_else(|| {
                            SettingsError::Invalid(format!("grouping '{name}' has a non-string key"))
                        })
                    })
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Grouping { name, group_by })
            })
            .collect()
    }

    /// Date range from the settings file
    pub fn date_range(
        &self,
        now: DateTime<Utc>,
    ) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), SettingsError> {
        let s = &self.engagement_settings;
        Ok((
            parse_optional_date(s.start.as_deref(), now)?,
            parse_optional_date(s.end.as_deref(), now)?,
        ))
    }

    /// Build a session configuration
    ///
    /// `endpoint` and the dates come from the caller so command-line values
    /// can take precedence over the file.
    pub fn session_config(
        &self,
        endpoint: Endpoint,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Result<SessionConfig, SettingsError> {
        let s = &self.engagement_settings;
        SessionConfig::builder(endpoint)
            .metric_types(self.metric_flags()?)
            .groupings(self.groupings()?)
            .date_range(start, end)
            .rate_limit(
                s.rate_limit_requests,
                Duration::from_secs(s.rate_limit_seconds),
            )
            .top_n(s.max_top_tweets)
            .save_responses(s.save_api_responses)
            .build()
            .map_err(|e| SettingsError::Invalid(e.to_string()))
    }
}

/// Top-level account file
#[derive(Clone, Deserialize)]
pub struct AccountSettings {
    /// API credentials
    pub engagement_api: ApiCredentials,
}

/// The `engagement_api` section
#[derive(Clone, Deserialize)]
pub struct ApiCredentials {
    /// Bearer token sent with every request
    pub bearer_token: String,
    /// API base URL override
    #[serde(default)]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for AccountSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountSettings")
            .field("bearer_token", &"***")
            .field("base_url", &self.base_url())
            .finish()
    }
}

impl AccountSettings {
    /// Load an account file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let content = read_file(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse account YAML
    pub fn from_yaml(content: &str) -> Result<Self, SettingsError> {
        let account: AccountSettings =
            serde_yaml::from_str(content).map_err(|e| SettingsError::YamlError(e.to_string()))?;
        if account.engagement_api.bearer_token.trim().is_empty() {
            return Err(SettingsError::Invalid("bearer_token is empty".to_string()));
        }
        Ok(account)
    }

    /// API base URL
    pub fn base_url(&self) -> &str {
        self.engagement_api
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
    }
}

fn read_file(path: &Path) -> Result<String, SettingsError> {
    std::fs::read_to_string(path).map_err(|e| SettingsError::ReadError {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

fn yaml_key(key: &Value, section: &str) -> Result<String, SettingsError> {
    key.as_str()
        .map(str::to_string)
        .ok_or_else(|| SettingsError::Invalid(format!("non-string key in {section}")))
}

fn parse_optional_date(
    spec: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>, SettingsError> {
    match spec.map(str::trim) {
        None | Some("") => Ok(None),
        Some(spec) => parse_date_spec(spec, now).map(Some),
    }
}

//! Configuration infrastructure
//!
//! Settings are layered with the `config` crate:
//! 1. Built-in defaults (`AppConfig::default()`)
//! 2. An optional `config.{yaml,toml,json}` file in the working directory, or
//!    the file named by `ARTICLE_WORDFREQ_CONFIG`
//! 3. Environment variables such as `ARTICLE_WORDFREQ__TOP_RESULTS=20` or
//!    `ARTICLE_WORDFREQ__LOGGING__LEVEL=debug`

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

/// Environment variable naming an explicit configuration file.
pub const CONFIG_PATH_ENV: &str = "ARTICLE_WORDFREQ_CONFIG";

/// Prefix for per-key environment overrides.
pub const ENV_PREFIX: &str = "ARTICLE_WORDFREQ";

/// Base name of the optional configuration file in the working directory.
pub const DEFAULT_CONFIG_NAME: &str = "config";

/// Highest launch rate the token bucket can represent (one token per nanosecond).
pub const MAX_REQUESTS_PER_SECOND: f64 = 1e9;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("Invalid configuration value for '{field}': {message}")]
    Validation { field: &'static str, message: String },

    #[error("Invalid CSS selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Number of ranked words to report
    pub top_results: usize,

    /// Newline-delimited file of article URLs
    pub url_list_path: String,

    /// Source of the whitespace separated word list
    pub word_bank_url: String,

    /// CSS selector of the element holding the article body
    pub container_selector: String,

    /// Sustained task launch rate
    pub requests_per_second: f64,

    /// Launches allowed back to back before the rate applies
    pub burst_size: u32,

    /// Maximum tasks inside fetch/extract/merge at once
    pub max_concurrent_requests: usize,

    /// Retries on network errors and 404 responses
    pub max_retries: u32,

    /// Redirect hops followed before giving up
    pub max_redirects: u32,

    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,

    /// User agent sent with every request
    pub user_agent: String,

    pub logging: LoggingConfig,
}

/// Logging configuration settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "error", "warn", "info", "debug", "trace"
    pub level: String,

    /// Enable JSON formatted logs
    pub json_format: bool,

    /// Enable console (stderr) output
    pub console_output: bool,

    /// Enable file output
    pub file_output: bool,

    /// Directory for the log file
    pub directory: String,

    /// Log file name inside `directory`
    pub file_name: String,
}

/// Default values, taken from the settings the crawler has always shipped with.
pub mod defaults {
    pub const TOP_RESULTS: usize = 10;
    pub const URL_LIST_PATH: &str = "static/endg-urls";
    pub const WORD_BANK_URL: &str =
        "https://raw.githubusercontent.com/dwyl/english-words/master/words.txt";
    /// Engadget keeps the article body in `div.caas-body`
    pub const CONTAINER_SELECTOR: &str = ".caas-body";
    pub const REQUESTS_PER_SECOND: f64 = 20.0;
    pub const BURST_SIZE: u32 = 20;
    pub const MAX_CONCURRENT_REQUESTS: usize = 20;
    pub const MAX_RETRIES: u32 = 3;
    pub const MAX_REDIRECTS: u32 = 5;
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
    pub const USER_AGENT: &str = concat!("article-wordfreq/", env!("CARGO_PKG_VERSION"));

    pub const LOG_LEVEL: &str = "info";
    pub const LOG_JSON_FORMAT: bool = false;
    pub const LOG_CONSOLE_OUTPUT: bool = true;
    pub const LOG_FILE_OUTPUT: bool = false;
    pub const LOG_DIRECTORY: &str = "logs";
    pub const LOG_FILE_NAME: &str = "article-wordfreq.log";
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            top_results: defaults::TOP_RESULTS,
            url_list_path: defaults::URL_LIST_PATH.to_string(),
            word_bank_url: defaults::WORD_BANK_URL.to_string(),
            container_selector: defaults::CONTAINER_SELECTOR.to_string(),
            requests_per_second: defaults::REQUESTS_PER_SECOND,
            burst_size: defaults::BURST_SIZE,
            max_concurrent_requests: defaults::MAX_CONCURRENT_REQUESTS,
            max_retries: defaults::MAX_RETRIES,
            max_redirects: defaults::MAX_REDIRECTS,
            request_timeout_seconds: defaults::REQUEST_TIMEOUT_SECONDS,
            user_agent: defaults::USER_AGENT.to_string(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::LOG_LEVEL.to_string(),
            json_format: defaults::LOG_JSON_FORMAT,
            console_output: defaults::LOG_CONSOLE_OUTPUT,
            file_output: defaults::LOG_FILE_OUTPUT,
            directory: defaults::LOG_DIRECTORY.to_string(),
            file_name: defaults::LOG_FILE_NAME.to_string(),
        }
    }
}

impl AppConfig {
    /// Loads the configuration the binary runs with: defaults, then the file
    /// named by `ARTICLE_WORDFREQ_CONFIG` (required) or `./config.*` (optional),
    /// then environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let file = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => config::File::from(Path::new(&path)).required(true),
            Err(_) => config::File::with_name(DEFAULT_CONFIG_NAME).required(false),
        };
        Self::build(file)
    }

    /// Loads defaults overlaid with a specific file and environment overrides.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::build(config::File::from(path.as_ref()).required(true))
    }

    fn build<F>(file: F) -> Result<Self, ConfigError>
    where
        F: config::Source + Send + Sync + 'static,
    {
        let settings = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let config: Self = settings.try_deserialize()?;
        config.validate()?;
        info!(
            "🔧 Configuration loaded: top_results={}, max_concurrent_requests={}, requests_per_second={}, burst_size={}",
            config.top_results,
            config.max_concurrent_requests,
            config.requests_per_second,
            config.burst_size
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Validation {
                field: "max_concurrent_requests",
                message: "must be greater than 0".to_string(),
            });
        }

        if !self.requests_per_second.is_finite() || self.requests_per_second <= 0.0 {
            return Err(ConfigError::Validation {
                field: "requests_per_second",
                message: format!("must be a positive number, got {}", self.requests_per_second),
            });
        }

        if self.requests_per_second > MAX_REQUESTS_PER_SECOND {
            return Err(ConfigError::Validation {
                field: "requests_per_second",
                message: format!(
                    "must not exceed {MAX_REQUESTS_PER_SECOND}, got {}",
                    self.requests_per_second
                ),
            });
        }

        if self.burst_size == 0 {
            return Err(ConfigError::Validation {
                field: "burst_size",
                message: "must be greater than 0".to_string(),
            });
        }

        if self.container_selector.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "container_selector",
                message: "must not be empty".to_string(),
            });
        }

        if self.word_bank_url.trim().is_empty() {
            return Err(ConfigError::Validation {
                field: "word_bank_url",
                message: "must not be empty".to_string(),
            });
        }

        if self.request_timeout_seconds == 0 {
            return Err(ConfigError::Validation {
                field: "request_timeout_seconds",
                message: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

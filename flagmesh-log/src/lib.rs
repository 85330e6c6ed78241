//! Logging for flagmesh
//!
//! Installs a `tracing` subscriber configured from environment variables.
//! Library crates log through `tracing` macros; applications call [`init`]
//! once at startup.
//!
//! # Usage
//!
//! ```no_run
//! flagmesh_log::init().expect("logging already initialized");
//! tracing::info!("resolver starting");
//! ```
//!
//! # Environment Variables
//!
//! - `FLAGMESH_DEBUG=1` - Enable debug logging
//! - `FLAGMESH_LOG_LEVEL=trace|debug|info|warn|error` - Set log level
//! - `FLAGMESH_LOG_FORMAT=json|pretty|compact` - Set output format
//! - `FLAGMESH_LOG_COLOR=1|0` - Enable/disable colors
//! - `RUST_LOG` - Full filter directive, overrides the level

use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub const DEBUG_VAR: &str = "FLAGMESH_DEBUG";
pub const LEVEL_VAR: &str = "FLAGMESH_LOG_LEVEL";
pub const FORMAT_VAR: &str = "FLAGMESH_LOG_FORMAT";
pub const COLOR_VAR: &str = "FLAGMESH_LOG_COLOR";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum LogError {
    /// A global subscriber is already set
    #[error("Failed to install log subscriber: {0}")]
    Init(String),

    /// The filter directive could not be parsed
    #[error("Invalid log filter '{filter}': {reason}")]
    Filter { filter: String, reason: String },
}

/// Log level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Parse a level name, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Some(Self::Trace),
            "debug" => Some(Self::Debug),
            "info" => Some(Self::Info),
            "warn" | "warning" => Some(Self::Warn),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Filter directive for this level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per line
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line human-readable output
    Compact,
}

impl LogFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "pretty" => Some(Self::Pretty),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub format: LogFormat,
    pub colors: bool,
    pub targets: bool,
    /// Explicit filter directive, e.g. `flagmesh_features=debug`
    pub filter: Option<String>,
}

impl Default for LogConfig {
    /// JSON at INFO level, no colors
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Json,
            colors: false,
            targets: true,
            filter: None,
        }
    }
}

impl LogConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, falling back to defaults for
    /// missing or unparsable values.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let flag = |name: &str| lookup(name).map(|v| v == "1" || v.eq_ignore_ascii_case("true"));

        let debug = flag(DEBUG_VAR).unwrap_or(false);

        let level = lookup(LEVEL_VAR)
            .and_then(|s| LogLevel::parse(&s))
            .unwrap_or(if debug { LogLevel::Debug } else { LogLevel::Info });

        let format = lookup(FORMAT_VAR)
            .and_then(|s| LogFormat::parse(&s))
            .unwrap_or(LogFormat::Json);

        let colors = flag(COLOR_VAR).unwrap_or(false) && format != LogFormat::Json;

        Self {
            level,
            format,
            colors,
            targets: true,
            filter: lookup("RUST_LOG").filter(|s| !s.trim().is_empty()),
        }
    }

    pub fn level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_colors(mut self, enable: bool) -> Self {
        self.colors = enable;
        self
    }

    pub fn with_targets(mut self, enable: bool) -> Self {
        self.targets = enable;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    /// Build the filter: the explicit directive if set, otherwise the level.
    pub fn env_filter(&self) -> Result<EnvFilter, LogError> {
        match &self.filter {
            Some(filter) => EnvFilter::try_new(filter).map_err(|e| LogError::Filter {
                filter: filter.clone(),
                reason: e.to_string(),
            }),
            None => Ok(EnvFilter::new(self.level.as_str())),
        }
    }

    /// Install this configuration as the global subscriber, writing to stderr.
    pub fn try_init(&self) -> Result<(), LogError> {
        let filter = self.env_filter()?;
        let registry = tracing_subscriber::registry().with(filter);

        let result = match self.format {
            LogFormat::Json => registry
                .with(
                    fmt::layer()
                        .json()
                        .with_writer(std::io::stderr)
                        .with_target(self.targets),
                )
                .try_init(),
            LogFormat::Pretty => registry
                .with(
                    fmt::layer()
                        .pretty()
                        .with_writer(std::io::stderr)
                        .with_target(self.targets)
                        .with_ansi(self.colors),
                )
                .try_init(),
            LogFormat::Compact => registry
                .with(
                    fmt::layer()
                        .compact()
                        .with_writer(std::io::stderr)
                        .with_target(self.targets)
                        .with_ansi(self.colors),
                )
                .try_init(),
        };

        result.map_err(|e| LogError::Init(e.to_string()))
    }
}

/// Install a subscriber configured from the environment.
pub fn init() -> Result<(), LogError> {
    LogConfig::from_env().try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_level_parse() {
        assert_eq!(LogLevel::parse("debug"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("warning"), Some(LogLevel::Warn));
        assert_eq!(LogLevel::parse("verbose"), None);
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(LogFormat::parse("pretty"), Some(LogFormat::Pretty));
        assert_eq!(LogFormat::parse("Compact"), Some(LogFormat::Compact));
        assert_eq!(LogFormat::parse("json"), Some(LogFormat::Json));
        assert_eq!(LogFormat::parse("xml"), None);
    }

    #[test]
    fn test_defaults_without_env() {
        let config = LogConfig::from_vars(vars(&[]));
        assert_eq!(config, LogConfig::default());
    }

    #[test]
    fn test_debug_flag_lowers_level() {
        let config = LogConfig::from_vars(vars(&[(DEBUG_VAR, "true")]));
        assert_eq!(config.level, LogLevel::Debug);
    }

    #[test]
    fn test_explicit_level_wins_over_debug() {
        let config = LogConfig::from_vars(vars(&[(DEBUG_VAR, "1"), (LEVEL_VAR, "warn")]));
        assert_eq!(config.level, LogLevel::Warn);
    }

    #[test]
    fn test_colors_ignored_for_json() {
        let json = LogConfig::from_vars(vars(&[(COLOR_VAR, "1")]));
        assert!(!json.colors);

        let pretty = LogConfig::from_vars(vars(&[(COLOR_VAR, "1"), (FORMAT_VAR, "pretty")]));
        assert!(pretty.colors);
        assert_eq!(pretty.format, LogFormat::Pretty);
    }

    #[test]
    fn test_invalid_filter() {
        let config = LogConfig::new().with_filter("flagmesh_features=loud");
        assert!(matches!(config.env_filter(), Err(LogError::Filter { .. })));
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::new()
            .level(LogLevel::Trace)
            .format(LogFormat::Compact)
            .with_colors(true)
            .with_targets(false);

        assert_eq!(config.level, LogLevel::Trace);
        assert_eq!(config.format, LogFormat::Compact);
        assert!(config.colors);
        assert!(!config.targets);
    }
}

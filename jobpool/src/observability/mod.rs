//! Observability utilities.
//!
//! The pool logs through `tracing`. Applications that do not install their
//! own subscriber can call [`init_tracing`] once at startup.

use crate::errors::JobPoolError;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

/// Environment variable read for the log filter.
pub const LOG_ENV_VAR: &str = "JOBPOOL_LOG";

/// Subscriber settings for [`init_tracing`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingConfig {
    /// Filter directive used when `JOBPOOL_LOG` is unset, e.g. `jobpool=debug`.
    pub default_filter: String,
    /// Emit one JSON object per record instead of human readable lines.
    pub json: bool,
    /// Include the emitting thread's name, which carries the worker id.
    pub thread_names: bool,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            default_filter: "info".to_string(),
            json: false,
            thread_names: true,
        }
    }
}

impl TracingConfig {
    /// Sets the fallback filter directive.
    #[must_use]
    pub fn with_default_filter(mut self, filter: impl Into<String>) -> Self {
        self.default_filter = filter.into();
        self
    }

    /// Enables or disables JSON output.
    #[must_use]
    pub const fn with_json(mut self, json: bool) -> Self {
        self.json = json;
        self
    }

    /// Builds the filter, preferring `JOBPOOL_LOG` over the fallback.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the directive cannot be parsed.
    pub fn env_filter(&self) -> Result<EnvFilter, JobPoolError> {
        let directive =
            std::env::var(LOG_ENV_VAR).unwrap_or_else(|_| self.default_filter.clone());
        EnvFilter::try_new(&directive).map_err(|e| {
            JobPoolError::InvalidConfig(format!("invalid log filter '{directive}': {e}"))
        })
    }
}

/// Installs a global `tracing-subscriber` fmt subscriber.
///
/// # Errors
///
/// Returns `InvalidConfig` if the filter is malformed or a global subscriber
/// is already installed.
pub fn init_tracing(config: &TracingConfig) -> Result<(), JobPoolError> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_thread_names(config.thread_names);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| JobPoolError::InvalidConfig(format!("tracing subscriber: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TracingConfig::default();
        assert_eq!(config.default_filter, "info");
        assert!(!config.json);
        assert!(config.thread_names);
    }

    #[test]
    fn test_config_deserialize_with_defaults() {
        let config: TracingConfig = serde_json::from_str(r#"{"json": true}"#).unwrap();
        assert!(config.json);
        assert_eq!(config.default_filter, "info");
    }

    #[test]
    fn test_builders() {
        let config = TracingConfig::default()
            .with_default_filter("jobpool=debug")
            .with_json(true);
        assert_eq!(config.default_filter, "jobpool=debug");
        assert!(config.json);
    }

    #[test]
    fn test_env_filter_accepts_directive() {
        let config = TracingConfig::default().with_default_filter("jobpool=trace,warn");
        if std::env::var(LOG_ENV_VAR).is_err() {
            assert!(config.env_filter().is_ok());
        }
    }
}

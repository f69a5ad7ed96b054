//! Logging utilities and configuration for the aggregate library.
//!
//! Folding never logs on the hot path. Registration summaries, resolved
//! parameters, skipped frecency dates and errors surfaced to a host engine are
//! reported through `tracing`.

use tracing::Level;

/// Logging configuration for host registration and execution.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for aggregate components
    pub base_level: Level,
    /// Whether to log every registered function
    pub log_registration: bool,
    /// Whether to log errors before they are handed to the engine
    pub log_host_errors: bool,
    /// Maximum length for logged field values (to prevent huge logs)
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_registration: false,
            log_host_errors: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Creates a verbose configuration suitable for debugging.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_registration: true,
            log_host_errors: true,
            max_field_length: 1024,
        }
    }

    /// Creates a minimal configuration for production with lowest overhead.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_registration: false,
            log_host_errors: false,
            max_field_length: 128,
        }
    }

    /// Creates a balanced configuration suitable for most use cases.
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Checks if events at `level` pass the base level.
    pub fn enabled(&self, level: Level) -> bool {
        level <= self.base_level
    }
}

/// Macro for conditional registration logging.
#[macro_export]
macro_rules! log_registration {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_registration && $config.enabled(tracing::Level::DEBUG) {
            tracing::debug!($($arg)*);
        }
    };
}

/// Macro for conditional logging of errors returned to a host engine.
#[macro_export]
macro_rules! log_host_error {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_host_errors && $config.enabled(tracing::Level::WARN) {
            tracing::warn!($($arg)*);
        }
    };
}

/// Truncates a string to the maximum field length if needed.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        value.to_string()
    } else {
        let mut end = max_length;
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...(truncated)", &value[..end])
    }
}

/// Utilities for setting up structured logging.
pub mod setup {
    use tracing::Level;

    /// Configuration for the logging subscriber.
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for the application
        pub level: Level,
        /// Log level for the aggregate library specifically
        pub crate_level: Level,
        /// Whether to use JSON output format
        pub json_format: bool,
        /// Environment filter override
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        /// Creates a configuration for production use.
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                crate_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        /// Creates a configuration for development use.
        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                crate_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        /// Sets the log level for the application.
        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        /// Sets the log level for the aggregate library.
        pub fn with_crate_level(mut self, level: Level) -> Self {
            self.crate_level = level;
            self
        }

        /// Sets whether to use JSON output format.
        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        /// Sets a custom environment filter.
        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// Builds the environment filter string.
        pub fn env_filter(&self) -> String {
            if let Some(ref filter) = self.env_filter {
                filter.clone()
            } else {
                format!(
                    "{},term_aggregates={}",
                    self.level.as_str().to_lowercase(),
                    self.crate_level.as_str().to_lowercase()
                )
            }
        }
    }

    /// Initializes a `tracing` subscriber with an env filter and a plain or
    /// JSON formatting layer.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use term_aggregates::logging::setup::{init_logging, LoggingConfig};
    ///
    /// let config = LoggingConfig::development().with_json_format(true);
    /// init_logging(config).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(config.env_filter()));

        let fmt_layer = if config.json_format {
            tracing_subscriber::fmt::layer().json().boxed()
        } else {
            tracing_subscriber::fmt::layer().boxed()
        };

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_defaults() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.log_registration);
        assert!(config.log_host_errors);
        assert_eq!(config.max_field_length, 256);
    }

    #[test]
    fn test_log_config_presets() {
        let config = LogConfig::verbose();
        assert_eq!(config.base_level, Level::DEBUG);
        assert!(config.log_registration);

        let config = LogConfig::production();
        assert_eq!(config.base_level, Level::WARN);
        assert!(!config.log_host_errors);
        assert_eq!(config.max_field_length, 128);
    }

    #[test]
    fn test_base_level_gates_events() {
        let config = LogConfig::default();
        assert!(config.enabled(Level::WARN));
        assert!(config.enabled(Level::INFO));
        assert!(!config.enabled(Level::DEBUG));

        let config = LogConfig::verbose();
        assert!(config.enabled(Level::DEBUG));
        assert!(!config.enabled(Level::TRACE));

        let config = LogConfig {
            base_level: Level::ERROR,
            ..LogConfig::default()
        };
        assert!(!config.enabled(Level::WARN));
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text that should be truncated", 10),
            "this is a ...(truncated)"
        );
        assert_eq!(truncate_field("ééé", 3), "é...(truncated)");
    }

    #[test]
    fn test_env_filter() {
        let config = LoggingConfig::default();
        assert_eq!(config.env_filter(), "info,term_aggregates=debug");

        let config = LoggingConfig::production().with_env_filter("warn");
        assert_eq!(config.env_filter(), "warn");
    }
}

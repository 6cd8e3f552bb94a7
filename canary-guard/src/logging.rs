//! Logging utilities and configuration.
//!
//! The library only emits `tracing` events; installing a subscriber is up to
//! the application, optionally through [`setup::init_logging`].

use tracing::Level;

/// Controls how much the engine logs during a run.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Base log level for engine diagnostics
    pub base_level: Level,
    /// Log every rule outcome at debug level
    pub log_rule_details: bool,
    /// Log every column profile at debug level
    pub log_profiles: bool,
    /// Log the run summary at info level
    pub log_run_summary: bool,
    /// Maximum length for logged field values such as messages and patterns
    pub max_field_length: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            base_level: Level::INFO,
            log_rule_details: false,
            log_profiles: false,
            log_run_summary: true,
            max_field_length: 256,
        }
    }
}

impl LogConfig {
    /// Everything on, for debugging rule sets.
    pub fn verbose() -> Self {
        Self {
            base_level: Level::DEBUG,
            log_rule_details: true,
            log_profiles: true,
            log_run_summary: true,
            max_field_length: 1024,
        }
    }

    /// Warnings only.
    pub fn production() -> Self {
        Self {
            base_level: Level::WARN,
            log_rule_details: false,
            log_profiles: false,
            log_run_summary: false,
            max_field_length: 128,
        }
    }
}

/// Debug logging that is skipped entirely below the configured level.
#[macro_export]
macro_rules! perf_debug {
    ($config:expr, $($arg:tt)*) => {
        if $config.base_level >= tracing::Level::DEBUG {
            tracing::debug!($($arg)*);
        }
    };
}

/// Debug logging of rule outcomes, gated by `log_rule_details`.
#[macro_export]
macro_rules! log_rule {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_rule_details {
            tracing::debug!($($arg)*);
        }
    };
}

/// Debug logging of column profiles, gated by `log_profiles`.
#[macro_export]
macro_rules! log_profile {
    ($config:expr, $($arg:tt)*) => {
        if $config.log_profiles {
            tracing::debug!($($arg)*);
        }
    };
}

/// Truncates a string to at most `max_length` bytes, on a char boundary.
pub fn truncate_field(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    let mut end = max_length;
    while !value.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...(truncated)", &value[..end])
}

/// Subscriber setup for applications embedding the library.
pub mod setup {
    use tracing::Level;

    use crate::prelude::*;

    /// Configuration for [`init_logging`].
    #[derive(Debug, Clone)]
    pub struct LoggingConfig {
        /// Log level for everything outside this crate
        pub level: Level,
        /// Log level for `canary_guard`
        pub canary_level: Level,
        /// Emit JSON lines instead of human-readable output
        pub json_format: bool,
        /// Explicit filter directive, overriding both levels
        pub env_filter: Option<String>,
    }

    impl Default for LoggingConfig {
        fn default() -> Self {
            Self {
                level: Level::INFO,
                canary_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }
    }

    impl LoggingConfig {
        pub fn production() -> Self {
            Self {
                level: Level::WARN,
                canary_level: Level::INFO,
                json_format: true,
                env_filter: None,
            }
        }

        pub fn development() -> Self {
            Self {
                level: Level::DEBUG,
                canary_level: Level::DEBUG,
                json_format: false,
                env_filter: None,
            }
        }

        pub fn with_level(mut self, level: Level) -> Self {
            self.level = level;
            self
        }

        pub fn with_canary_level(mut self, level: Level) -> Self {
            self.canary_level = level;
            self
        }

        pub fn with_json_format(mut self, enabled: bool) -> Self {
            self.json_format = enabled;
            self
        }

        pub fn with_env_filter(mut self, filter: impl Into<String>) -> Self {
            self.env_filter = Some(filter.into());
            self
        }

        /// The filter directive, e.g. `info,canary_guard=debug`.
        pub fn env_filter(&self) -> String {
            match &self.env_filter {
                Some(filter) => filter.clone(),
                None => format!(
                    "{},canary_guard={}",
                    self.level.as_str().to_lowercase(),
                    self.canary_level.as_str().to_lowercase()
                ),
            }
        }
    }

    /// Installs a global `tracing` subscriber.
    ///
    /// `RUST_LOG` takes precedence over the configured filter. Fails if a
    /// global subscriber is already set.
    ///
    /// ```rust,no_run
    /// use canary_guard::logging::setup::{init_logging, LoggingConfig};
    ///
    /// init_logging(LoggingConfig::development().with_json_format(true)).unwrap();
    /// ```
    pub fn init_logging(config: LoggingConfig) -> Result<()> {
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
            .try_init()
            .map_err(|e| CanaryError::Internal(format!("failed to install subscriber: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::setup::LoggingConfig;
    use super::*;

    #[test]
    fn test_log_config_presets() {
        let config = LogConfig::default();
        assert_eq!(config.base_level, Level::INFO);
        assert!(!config.log_rule_details);
        assert!(config.log_run_summary);

        let verbose = LogConfig::verbose();
        assert!(verbose.log_rule_details);
        assert!(verbose.log_profiles);
        assert_eq!(verbose.max_field_length, 1024);

        let production = LogConfig::production();
        assert_eq!(production.base_level, Level::WARN);
        assert!(!production.log_run_summary);
    }

    #[test]
    fn test_truncate_field() {
        assert_eq!(truncate_field("hello", 10), "hello");
        assert_eq!(
            truncate_field("this is a very long text", 10),
            "this is a ...(truncated)"
        );
        // "é" is two bytes; never split it
        assert_eq!(truncate_field("aé", 2), "a...(truncated)");
    }

    #[test]
    fn test_env_filter() {
        assert_eq!(
            LoggingConfig::default().env_filter(),
            "info,canary_guard=debug"
        );
        assert_eq!(
            LoggingConfig::production().env_filter(),
            "warn,canary_guard=info"
        );
        assert_eq!(
            LoggingConfig::default()
                .with_env_filter("canary_guard=trace")
                .env_filter(),
            "canary_guard=trace"
        );
    }

    #[test]
    fn test_macros_respect_flags() {
        let config = LogConfig::production();
        // Compiles and is a no-op when disabled
        log_rule!(config, rule = "r", "never emitted");
        log_profile!(config, column = "c", "never emitted");
        perf_debug!(config, "never emitted");
    }
}

//! Structured logging for the world generation tools.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds. `RUST_LOG` takes precedence over the configured
//! `debug.log_level`.

use std::path::Path;

use nebula_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when neither `RUST_LOG` nor the config sets a level.
pub const DEFAULT_FILTER: &str = "info";

/// Name of the JSON log file written to `log_dir` in debug builds.
pub const LOG_FILE: &str = "worldgen.log";

/// Filter string derived from the config, falling back to [`DEFAULT_FILTER`].
pub fn filter_directives(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.trim().is_empty() => {
            config.debug.log_level.clone()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Installs the global tracing subscriber.
///
/// # Arguments
///
/// * `log_dir` - Directory for the JSON log file (debug builds only)
/// * `debug_build` - Whether file logging is enabled
/// * `config` - Optional configuration providing the log level
///
/// ```no_run
/// use nebula_config::Config;
/// use nebula_log::init_logging;
///
/// let config = Config::default();
/// init_logging(Some(std::path::Path::new("./logs")), cfg!(debug_assertions), Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_directives(config);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    // Heightmap worker logs are easier to follow from a file.
    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_defaults_without_config() {
        assert_eq!(filter_directives(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_filter_uses_config_level() {
        let mut config = Config::default();
        config.debug.log_level = "warn,nebula_scripting=debug".to_string();
        assert_eq!(filter_directives(Some(&config)), "warn,nebula_scripting=debug");
    }

    #[test]
    fn test_blank_config_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level = "  ".to_string();
        assert_eq!(filter_directives(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_filter_directives_parse() {
        for directives in ["info", "debug,nebula_scripting=trace", "warn,nebula_terrain=debug"] {
            assert!(
                EnvFilter::try_new(directives).is_ok(),
                "failed to parse filter: {directives}"
            );
        }
    }
}

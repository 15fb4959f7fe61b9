//! Structured logging for umbra.
//!
//! Installs a `tracing` subscriber with console output (uptime, target, level)
//! and, when the config names a log file, a JSON file layer for later
//! inspection. `RUST_LOG` takes precedence over the configured level.

use std::path::Path;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use umbra_config::Config;

/// Filter used when neither `RUST_LOG` nor the config sets one.
pub const DEFAULT_FILTER: &str = "info";

/// Initialize the global tracing subscriber.
///
/// A second call keeps the first subscriber.
///
/// # Examples
///
/// ```no_run
/// use umbra_config::Config;
/// use umbra_log::init_logging;
///
/// let mut config = Config::default();
/// config.debug.log_level = "debug,umbra_volume=trace".to_string();
/// init_logging(Some(&config));
/// ```
pub fn init_logging(config: Option<&Config>) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| config_env_filter(config));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true) // ray-march workers are named
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if let Some(log_file) = config.and_then(|c| c.debug.log_file.as_deref())
        && let Some(file) = create_log_file(log_file)
    {
        let file_layer = fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        install(subscriber.with(file_layer));
        return;
    }

    install(subscriber);
}

/// Sets `subscriber` as the global default unless one is already installed.
fn install(subscriber: impl SubscriberInitExt) {
    if subscriber.try_init().is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
}

/// Filter directive string for `config`.
pub fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => config.debug.log_level.clone(),
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Filter from the configured level, or [`default_env_filter`] when it does not parse.
pub fn config_env_filter(config: Option<&Config>) -> EnvFilter {
    EnvFilter::try_new(filter_string(config)).unwrap_or_else(|_| default_env_filter())
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

fn create_log_file(path: &Path) -> Option<std::fs::File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).ok()?;
    }
    std::fs::File::create(path).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[test]
    fn test_default_log_level() {
        let filter = default_env_filter();
        assert!(format!("{}", filter).contains("info"));
        assert_eq!(filter_string(None), "info");
    }

    #[test]
    fn test_config_log_level_used() {
        let mut config = Config::default();
        config.debug.log_level = "warn,umbra_volume=debug".to_string();
        assert_eq!(filter_string(Some(&config)), "warn,umbra_volume=debug");

        config.debug.log_level.clear();
        assert_eq!(filter_string(Some(&config)), DEFAULT_FILTER);
    }

    #[test]
    fn test_unparseable_level_falls_back_to_default() {
        let mut config = Config::default();
        config.debug.log_level = "umbra_volume=loudest".to_string();
        let filter = config_env_filter(Some(&config));
        assert_eq!(filter.to_string(), default_env_filter().to_string());

        config.debug.log_level = "warn".to_string();
        assert_eq!(config_env_filter(Some(&config)).to_string(), "warn");
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,umbra_volume=trace",
            "warn,umbra_volume::dispatch=debug",
            "error",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_log_file_parent_created() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("logs").join("umbra.json");
        assert!(create_log_file(&log_path).is_some());
        assert!(log_path.exists());
    }

    #[test]
    fn test_json_layer_emits_parseable_lines() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_path = temp_dir.path().join("umbra.json");
        let file = create_log_file(&log_path).unwrap();

        let subscriber = tracing_subscriber::registry().with(
            fmt::layer()
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .json(),
        );
        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(covered = 32, "Shadow pass complete");
        });

        let contents = std::fs::read_to_string(&log_path).unwrap();
        let line = contents.lines().next().expect("one log line");
        let value: serde_json::Value = serde_json::from_str(line).unwrap();
        assert_eq!(value["level"], "INFO");
        assert_eq!(value["fields"]["message"], "Shadow pass complete");
        assert_eq!(value["fields"]["covered"], 32);
    }
}

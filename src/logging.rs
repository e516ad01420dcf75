use std::collections::BTreeMap;

use crate::config::AppConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Targets quieted unless `log_targets` says otherwise
const DEFAULT_TARGETS: [(&str, &str); 2] = [
    // sqlx logs every statement at info
    ("sqlx", "warn"),
    ("hyper", "info"),
];

/// Build the `EnvFilter` directive string: the global level first, then
/// one `target=level` per override. Configured targets replace the defaults.
pub fn filter_directives(log_level: &str, targets: &BTreeMap<String, String>) -> String {
    let mut levels: BTreeMap<&str, &str> = DEFAULT_TARGETS.into_iter().collect();
    for (target, level) in targets {
        levels.insert(target.as_str(), level.as_str());
    }

    let mut directives = log_level.to_string();
    for (target, level) in levels {
        directives.push_str(&format!(",{}={}", target, level));
    }
    directives
}

/// Install the global subscriber. Keep the guard alive for the process
/// lifetime or buffered file output is lost.
///
/// `RUST_LOG` wins over the configured directives when set.
pub fn init_logging(config: &AppConfig) -> WorkerGuard {
    let file_appender = match config.rotation.as_str() {
        "hourly" => tracing_appender::rolling::hourly(&config.log_dir, &config.log_file),
        "daily" => tracing_appender::rolling::daily(&config.log_dir, &config.log_file),
        _ => tracing_appender::rolling::never(&config.log_dir, &config.log_file),
    };
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let directives = filter_directives(&config.log_level, &config.log_targets);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directives));

    let registry = tracing_subscriber::registry().with(filter);

    if config.use_json {
        let file_layer = fmt::layer()
            .json()
            .with_target(true)
            .with_current_span(false)
            .with_writer(non_blocking)
            .with_ansi(false);
        registry.with(file_layer).init();
    } else {
        let file_layer = fmt::layer()
            .with_target(true)
            .with_writer(non_blocking)
            .with_ansi(false);
        let stdout_layer = fmt::layer().compact().with_target(false).with_ansi(true);
        registry.with(file_layer).with(stdout_layer).init();
    }

    tracing::debug!(directives = %directives, "Logging initialized");
    guard
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(
            filter_directives("info", &BTreeMap::new()),
            "info,hyper=info,sqlx=warn"
        );
    }

    #[test]
    fn test_configured_targets_override_defaults() {
        let targets = BTreeMap::from([
            ("sqlx".to_string(), "debug".to_string()),
            ("remit_engine::transfer".to_string(), "trace".to_string()),
        ]);
        let directives = filter_directives("warn", &targets);
        assert_eq!(
            directives,
            "warn,hyper=info,remit_engine::transfer=trace,sqlx=debug"
        );
        assert!(EnvFilter::try_new(&directives).is_ok());
    }
}

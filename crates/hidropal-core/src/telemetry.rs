//! Tracing subscriber setup

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::LoggingConfig;
use crate::error::TelemetryError;

/// Install the global fmt subscriber
///
/// `RUST_LOG`, when set, replaces the configured filter directive.
///
/// # Errors
/// Returns error if the directive is invalid or a subscriber is already set
pub fn init(config: &LoggingConfig) -> Result<(), TelemetryError> {
    let env = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(&config.filter, env.as_deref())?;

    tracing_subscriber::registry()
        .with(build_stdout_layer(config.json))
        .with(filter)
        .try_init()
        .map_err(|err| TelemetryError::AlreadyInstalled(err.to_string()))
}

fn build_filter(configured: &str, env: Option<&str>) -> Result<EnvFilter, TelemetryError> {
    let directive = env.filter(|value| !value.trim().is_empty()).unwrap_or(configured);
    EnvFilter::try_new(directive).map_err(|err| TelemetryError::InvalidFilter {
        directive: directive.to_string(),
        reason: err.to_string(),
    })
}

fn build_stdout_layer(json: bool) -> Box<dyn Layer<Registry> + Send + Sync> {
    if json {
        Box::new(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_current_span(true),
        )
    } else {
        Box::new(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_writer(std::io::stderr)
                .with_target(true),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing::level_filters::LevelFilter;

    #[test]
    fn env_directive_wins() {
        let filter = build_filter("info", Some("trace")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::TRACE));
    }

    #[test]
    fn blank_env_falls_back_to_config() {
        let filter = build_filter("warn", Some("  ")).unwrap();
        assert_eq!(filter.max_level_hint(), Some(LevelFilter::WARN));
    }

    #[test]
    fn bad_directive_is_reported() {
        let err = build_filter("hidropal_core=loud", None).unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidFilter { .. }));
    }

    #[test]
    fn second_init_is_an_error() {
        let config = LoggingConfig::default();
        let _ = init(&config);
        assert!(matches!(init(&config), Err(TelemetryError::AlreadyInstalled(_))));
    }
}

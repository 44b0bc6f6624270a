use std::env::var;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{Layer, filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Coarse log level used when `RUST_LOG` is not set.
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";
/// `json` switches to one JSON object per line, anything else is compact text.
pub const LOG_FORMAT_ENV: &str = "RUST_LOG_FORMAT";

pub fn init_tracing() {
    initialize_tracing(level_from_env(var(LOG_LEVEL_ENV).ok().as_deref()));
}

/// Map the `LOG_LEVEL` values understood by jsonmon onto a filter.
/// Unknown or missing values fall back to `INFO`.
fn level_from_env(level: Option<&str>) -> LevelFilter {
    match level.map(str::trim).map(str::to_ascii_uppercase).as_deref() {
        Some("DEBUG") => LevelFilter::DEBUG,
        Some("WARN" | "WARNING") => LevelFilter::WARN,
        Some("ERROR" | "ERR") => LevelFilter::ERROR,
        _ => LevelFilter::INFO,
    }
}

/// Initialize tracing subscriber with default configuration.
fn initialize_tracing(level: LevelFilter) {
    let env_filter = EnvFilter::builder().with_default_directive(level.into()).from_env_lossy();

    let log_format = var(LOG_FORMAT_ENV).unwrap_or_default();

    let log_layer = match log_format.as_str() {
        "json" => tracing_subscriber::fmt::layer().json().with_filter(env_filter).boxed(),
        _ => tracing_subscriber::fmt::layer()
            .compact()
            .without_time()
            .with_filter(env_filter)
            .boxed(),
    };

    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::registry().with(log_layer).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_from_env() {
        assert_eq!(level_from_env(Some("DEBUG")), LevelFilter::DEBUG);
        assert_eq!(level_from_env(Some("error")), LevelFilter::ERROR);
        assert_eq!(level_from_env(Some(" warn ")), LevelFilter::WARN);
        assert_eq!(level_from_env(Some("INFO")), LevelFilter::INFO);
        assert_eq!(level_from_env(Some("verbose")), LevelFilter::INFO);
        assert_eq!(level_from_env(None), LevelFilter::INFO);
    }
}

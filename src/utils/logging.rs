//! Tracing subscriber setup
//!
//! Logs go to stderr so they never interleave with answers printed by the
//! shell. `RUST_LOG` takes precedence over the configured level; `-v` raises
//! MediBot's own targets to `debug` on top of either.

use crate::utils::toml_config::LoggingConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const VERBOSE_DIRECTIVES: [&str; 2] = ["medibot=debug", "medibot_index=debug"];

/// Build the filter from `RUST_LOG` (if set), else the configured level.
fn build_filter(rust_log: Option<&str>, config: &LoggingConfig, verbose: bool) -> EnvFilter {
    let base = rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_new(&config.level).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));

    if !verbose {
        return base;
    }
    VERBOSE_DIRECTIVES
        .iter()
        .filter_map(|directive| directive.parse().ok())
        .fold(base, |filter, directive| filter.add_directive(directive))
}

/// Install the global tracing subscriber.
///
/// Calling this twice is harmless; the second subscriber is ignored.
pub fn init_tracing(config: &LoggingConfig, verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let env_filter = build_filter(rust_log.as_deref(), config, verbose);

    let json_layer = config.json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.json).then(|| {
        tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(level: &str) -> LoggingConfig {
        LoggingConfig {
            level: level.to_string(),
            json: false,
        }
    }

    #[test]
    fn test_rust_log_overrides_configured_level() {
        let filter = build_filter(Some("medibot=warn"), &config("info"), false).to_string();
        assert!(filter.contains("medibot=warn"));
        assert!(!filter.contains("info"));
    }

    #[test]
    fn test_configured_level_used_without_rust_log() {
        for rust_log in [None, Some("  ")] {
            let filter = build_filter(rust_log, &config("info"), false).to_string();
            assert_eq!(filter, "info");
        }
    }

    #[test]
    fn test_verbose_applies_over_rust_log() {
        let filter = build_filter(Some("medibot=warn"), &config("info"), true).to_string();
        assert!(filter.contains("medibot=debug"));
        assert!(filter.contains("medibot_index=debug"));
    }
}

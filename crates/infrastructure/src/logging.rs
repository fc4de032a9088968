use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{LogFormat, LogLevel};

/// Initialize structured logging to stderr.
///
/// - `LogFormat::Json`: flattened JSON (aggregator-friendly).
/// - `LogFormat::Text`: human-readable output.
///
/// Uses `RUST_LOG` if set, otherwise the given `level`. Must be called at
/// most once; CSV output goes to stdout, so diagnostics stay on stderr.
pub fn init_logging(level: LogLevel, format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_target(true)
                    .with_writer(std::io::stderr)
                    .with_ansi(false),
            )
            .init(),
        LogFormat::Text => registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_level_as_str_is_valid_env_filter() {
        for level in [
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ] {
            assert!(
                EnvFilter::try_new(level.as_str()).is_ok(),
                "{} should be a valid filter",
                level.as_str()
            );
        }
    }
}

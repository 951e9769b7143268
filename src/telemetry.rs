use std::io;

use tracing::warn;
use tracing_subscriber::{
    filter::{EnvFilter, ParseError},
    fmt,
};

const FALLBACK_LEVEL: &str = "debug";

/// Keeps the diagnostic subscriber installed for the current thread while alive.
pub struct TelemetryGuard {
    _default_guard: tracing::subscriber::DefaultGuard,
}

/// Builds the stderr subscriber and installs it as the default of the calling thread.
///
/// `RUST_LOG` takes precedence over `level`. An unparsable `level` falls back to `debug`
/// and is reported once the subscriber is in place.
pub fn init(level: &str) -> TelemetryGuard {
    let (filter, rejected) = match EnvFilter::try_from_default_env() {
        Ok(filter) => (filter, None),
        Err(_) => match level_filter(level) {
            Ok(filter) => (filter, None),
            Err(err) => (EnvFilter::new(FALLBACK_LEVEL), Some(err)),
        },
    };

    let subscriber = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .finish();

    let guard = TelemetryGuard {
        _default_guard: tracing::subscriber::set_default(subscriber),
    };
    if let Some(err) = rejected {
        warn!("invalid log level {level:?} ({err}), using {FALLBACK_LEVEL}");
    }
    guard
}

fn level_filter(level: &str) -> Result<EnvFilter, ParseError> {
    EnvFilter::try_new(level)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_levels_and_directives() {
        assert!(level_filter("debug").is_ok());
        assert!(level_filter("sattrack=trace,warn").is_ok());
    }

    #[test]
    fn rejects_unknown_level() {
        assert!(level_filter("sattrack=verbose").is_err());
    }

    #[test]
    fn init_survives_invalid_level() {
        let _guard = init("sattrack=verbose");
        tracing::debug!("still logging");
    }
}

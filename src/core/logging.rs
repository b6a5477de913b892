//! Tracing initialization.
//!
//! Level precedence: explicit `--log-level` → `LOG_LEVEL` → `info`. Logs go to
//! stderr so JSON reports on stdout stay machine-readable.

use std::sync::Once;

use tracing::level_filters::LevelFilter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable holding the log level (or a full filter directive).
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

const DEFAULT_LEVEL: &str = "info";

static INIT: Once = Once::new();

/// Build the filter for the given level, falling back to `info` when the level
/// does not parse. The second element carries the rejected input, if any.
///
/// A bare word must be a level name (`warning`, `fatal` and `panic` are
/// accepted as aliases). Full directives such as `invoices_validator=debug`
/// are passed to [`EnvFilter`] as written.
#[must_use]
pub fn resolve_filter(
    flag: Option<&str>,
    env_level: Option<&str>,
) -> (EnvFilter, Option<String>) {
    let requested = flag
        .or(env_level)
        .map(str::trim)
        .filter(|level| !level.is_empty());

    let Some(level) = requested else {
        return (EnvFilter::new(DEFAULT_LEVEL), None);
    };

    let parsed = if level.contains(['=', ',']) {
        EnvFilter::try_new(level).ok()
    } else {
        parse_level(level).map(|filter| {
            EnvFilter::builder()
                .with_default_directive(filter.into())
                .parse_lossy("")
        })
    };

    match parsed {
        Some(filter) => (filter, None),
        None => (EnvFilter::new(DEFAULT_LEVEL), Some(level.to_string())),
    }
}

fn parse_level(raw: &str) -> Option<LevelFilter> {
    let normalized = match raw.to_ascii_lowercase().as_str() {
        "warning" => "warn".to_string(),
        "fatal" | "panic" => "error".to_string(),
        other => other.to_string(),
    };
    normalized.parse().ok()
}

/// Initialize logging once; later calls are no-ops.
pub fn init_logging(flag: Option<&str>) {
    INIT.call_once(|| {
        let env_level = std::env::var(LOG_LEVEL_ENV).ok();
        let (filter, rejected) = resolve_filter(flag, env_level.as_deref());

        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(filter)
            .init();

        if let Some(level) = rejected {
            tracing::error!(
                "error parsing log level {level:?}, will fall back to default level {DEFAULT_LEVEL}"
            );
        }
    });
}

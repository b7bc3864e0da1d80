use std::str::FromStr;

use tracing::metadata::LevelFilter;
use tracing_subscriber::{
    Layer, filter::FilterFn, prelude::__tracing_subscriber_SubscriberExt, util::SubscriberInitExt,
};

/// Environment variable overriding the log level
pub const LOG_LEVEL_VAR: &str = "LOG_LEVEL";

/// Resolve the level from an optional `LOG_LEVEL` value
fn level_from(value: Option<&str>) -> LevelFilter {
    let default = LevelFilter::WARN;

    value.map_or(default, |level| {
        LevelFilter::from_str(level).unwrap_or_else(|_| {
            eprintln!("Invalid log level specified {level}, defaulting to {default}");
            default
        })
    })
}

/// Install the global subscriber
///
/// Logs go to stderr so that stdout only carries command output.
pub fn init() {
    let level = level_from(std::env::var(LOG_LEVEL_VAR).ok().as_deref());

    let _ = tracing_subscriber::Registry::default()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_file(false)
                .with_line_number(false)
                .compact()
                .with_ansi(true)
                .with_timer(tracing_subscriber::fmt::time::ChronoUtc::rfc_3339())
                .with_filter(level)
                .with_filter(FilterFn::new(|metadata| {
                    metadata.target().starts_with("mailctl")
                })),
        )
        .try_init();
}

//! Shared logging initialization for relay hosts.

use std::sync::OnceLock;

static INIT: OnceLock<()> = OnceLock::new();

/// Environment variable selecting the log level.
pub const LOG_ENV: &str = "ACTION_RELAY_LOG";

fn parse_level(raw: Option<String>) -> tracing::Level {
    match raw
        .unwrap_or_else(|| "info".to_string())
        .to_ascii_lowercase()
        .as_str()
    {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "warn" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}

/// Initialize process-level tracing output from `ACTION_RELAY_LOG`.
///
/// Safe to call from every process and every store construction; only the
/// first call installs a subscriber. Never fails: if the host already set a
/// global subscriber, that one stays.
pub fn init() {
    if INIT.get().is_some() {
        return;
    }
    let level = parse_level(std::env::var(LOG_ENV).ok());
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
    let _ = INIT.set(());
}

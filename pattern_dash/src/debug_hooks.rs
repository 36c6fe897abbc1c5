//! Topic-named log helpers. Each topic is a `log` target, so
//! `RUST_LOG=feed.live=debug` narrows output to one area.

use log::Level;
use patternscan::{FetchErrorKind, PatternFilters};
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

fn log_line(topic: &'static str, level: Level, msg: impl AsRef<str>) {
    log::log!(target: topic, level, "{}", msg.as_ref());
}

pub fn log_refresh_started(filters: &PatternFilters) {
    log_line(
        "fetch.refresh",
        Level::Debug,
        format!(
            "refresh started universe={:?} confidence_min={:?} limit={:?} symbols={} types={}",
            filters.universe,
            filters.confidence_min,
            filters.limit,
            filters.symbols.len(),
            filters.pattern_types.len()
        ),
    );
}

pub fn log_refresh_skipped(reason: &str) {
    log_line("fetch.refresh", Level::Debug, format!("refresh skipped: {reason}"));
}

pub fn log_refresh_done(count: usize, elapsed_ms: u128) {
    log_line(
        "fetch.refresh",
        Level::Info,
        format!("loaded {count} patterns in {elapsed_ms}ms"),
    );
}

pub fn log_refresh_failed(kind: FetchErrorKind, message: &str) {
    log_line(
        "fetch.refresh",
        Level::Warn,
        format!("refresh failed kind={kind} | {message}"),
    );
}

pub fn log_live_connected(endpoint: &str) {
    log_line("feed.live", Level::Info, format!("connected to {endpoint}"));
}

pub fn log_live_disconnected(reason: &str) {
    log_line("feed.live", Level::Warn, format!("disconnected: {reason}"));
}

pub fn log_live_frame_error(frame: &str, err: &str) {
    log_line(
        "feed.parse",
        Level::Debug,
        format!("failed to parse frame: {frame:?}; err={err}"),
    );
}

pub fn log_live_event(kind: &str, symbol: &str) {
    static COUNT: AtomicU64 = AtomicU64::new(0);
    let n = COUNT.fetch_add(1, Ordering::Relaxed) + 1;
    if n <= 10 || n % 100 == 0 {
        log_line(
            "feed.live",
            Level::Debug,
            format!("event #{n} kind={kind} symbol={symbol}"),
        );
    }
}

pub fn log_state_saved(path: &Path) {
    log_line("persist.state", Level::Debug, format!("saved {:?}", path));
}

pub fn log_state_backup_failed(backup: &Path, err: &std::io::Error) {
    log_line(
        "persist.state",
        Level::Warn,
        format!("could not write backup {:?}: {err}", backup),
    );
}

pub fn log_state_corrupt(path: &Path, err: &anyhow::Error, archived: &Path) {
    log_line(
        "persist.state",
        Level::Warn,
        format!("state file {:?} unreadable ({err:#}); archived to {:?}", path, archived),
    );
}

use super::state::*;
use chrono::{DateTime, Local, TimeZone};
use patternscan::PatternRecord;
use std::fmt::Write;

const SYMBOL_W: usize = 8;
const PATTERN_W: usize = 22;

fn fmt_local(ts: Option<DateTime<chrono::Utc>>) -> String {
    ts.map(|t| t.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn fmt_unix(secs: Option<u64>) -> String {
    secs.and_then(|s| Local.timestamp_opt(s as i64, 0).single())
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string())
}

fn fmt_volume(v: u64) -> String {
    match v {
        v if v >= 1_000_000_000 => format!("{:.2}B", v as f64 / 1e9),
        v if v >= 1_000_000 => format!("{:.2}M", v as f64 / 1e6),
        v if v >= 1_000 => format!("{:.1}K", v as f64 / 1e3),
        v => v.to_string(),
    }
}

pub fn status_line(state: &AppState) -> String {
    let live = if state.live.connected { "live" } else { "offline" };
    let loading = if state.is_loading { " | loading" } else { "" };
    let auto = match state.auto_refresh_secs {
        0 => "auto off".to_string(),
        s => format!("auto {s}s"),
    };
    format!(
        "updated {} | {} | {} ({} events){}",
        fmt_unix(state.last_refresh_unix),
        auto,
        live,
        state.live.events_seen,
        loading
    )
}

fn row(out: &mut String, p: &PatternRecord, watched: bool) {
    let mark = if watched { '*' } else { ' ' };
    let rs = p.rs.map(|rs| format!("{rs:.1}")).unwrap_or_else(|| "-".to_string());
    let _ = writeln!(
        out,
        "{mark}{:<sw$} {:<pw$} {:>5.1}% {:>10.2} {:>+7.2}% {:>9} {:>6}  {}",
        p.symbol,
        p.pattern,
        p.confidence * 100.0,
        p.price,
        p.change_percent,
        fmt_volume(p.volume),
        rs,
        fmt_local(p.detected_at()),
        sw = SYMBOL_W,
        pw = PATTERN_W,
    );
}

/// Text view of the current state: status, error banner, then one row per pattern.
pub fn render(state: &AppState) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", status_line(state));
    if let Some(err) = &state.last_error {
        let _ = writeln!(out, "! {err}");
    }
    if !state.status_message.is_empty() {
        let _ = writeln!(out, "{}", state.status_message);
    }

    let _ = writeln!(
        out,
        " {:<sw$} {:<pw$} {:>6} {:>10} {:>8} {:>9} {:>6}  {}",
        "SYMBOL",
        "PATTERN",
        "CONF",
        "PRICE",
        "CHG",
        "VOLUME",
        "RS",
        "DETECTED",
        sw = SYMBOL_W,
        pw = PATTERN_W,
    );

    let visible = state.visible_patterns();
    if visible.is_empty() {
        let msg = if state.is_loading {
            "(loading...)"
        } else if state.watchlist_only {
            "(no patterns for watchlist symbols)"
        } else {
            "(no patterns)"
        };
        let _ = writeln!(out, " {msg}");
    }
    for p in visible {
        row(&mut out, p, state.watchlist.contains(&p.symbol));
    }
    out
}

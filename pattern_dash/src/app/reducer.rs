use super::event::*;
use super::state::*;
use crate::debug_hooks;
use patternscan::PatternRecord;

pub fn reduce(state: &mut AppState, ev: AppEvent) -> bool {
    match ev {
        AppEvent::Ui(u) => reduce_ui(state, u),
        AppEvent::Fetch(f) => reduce_fetch(state, f),
        AppEvent::Live(l) => reduce_live(state, l),
        AppEvent::Timer(t) => reduce_timer(state, t),
    }
}

fn request_refresh(state: &mut AppState, reason: &str) -> bool {
    if state.queue_refresh() {
        state.status_message = format!("Refreshing ({reason})...");
        true
    } else {
        debug_hooks::log_refresh_skipped("already loading");
        state.status_message = "Refresh already in progress.".to_string();
        true
    }
}

fn reduce_ui(state: &mut AppState, ev: UiEvent) -> bool {
    match ev {
        UiEvent::RefreshRequested => request_refresh(state, "manual"),
        UiEvent::FiltersChanged { filters } => {
            if filters == state.filters {
                return false;
            }
            state.filters = filters;
            request_refresh(state, "filters changed")
        }
        UiEvent::AutoRefreshChanged { secs } => {
            state.auto_refresh_secs = secs;
            state.status_message = if secs == 0 {
                "Auto-refresh off.".to_string()
            } else {
                format!("Auto-refresh every {secs}s.")
            };
            true
        }

        UiEvent::WatchlistAdd { symbol } => {
            state.status_message = match state.watchlist.add(&symbol) {
                Ok(sym) => format!("Added {sym} to watchlist."),
                Err(err) => format!("Watchlist: {err}."),
            };
            true
        }
        UiEvent::WatchlistRemove { symbol } => {
            state.status_message = match state.watchlist.remove(&symbol) {
                Ok(sym) => format!("Removed {sym} from watchlist."),
                Err(err) => format!("Watchlist: {err}."),
            };
            true
        }
        UiEvent::WatchlistOnlyToggled { enabled } => {
            if state.watchlist_only == enabled {
                return false;
            }
            state.watchlist_only = enabled;
            state.status_message = if enabled {
                "Showing watchlist symbols only.".to_string()
            } else {
                "Showing all symbols.".to_string()
            };
            true
        }

        UiEvent::PresetSave { name } => {
            state.status_message = match state.presets.save(&name, state.filters.clone()) {
                Ok(true) => format!("Preset {:?} updated.", name.trim()),
                Ok(false) => format!("Preset {:?} saved.", name.trim()),
                Err(err) => format!("Preset: {err}."),
            };
            true
        }
        UiEvent::PresetApply { name } => match state.presets.get(&name) {
            Ok(filters) => {
                let filters = filters.clone();
                if filters == state.filters {
                    state.status_message = format!("Preset {:?} already active.", name.trim());
                    return true;
                }
                state.filters = filters;
                request_refresh(state, "preset applied")
            }
            Err(err) => {
                state.status_message = format!("Preset: {err}.");
                true
            }
        },
        UiEvent::PresetDelete { name } => {
            state.status_message = match state.presets.delete(&name) {
                Ok(_) => format!("Preset {:?} deleted.", name.trim()),
                Err(err) => format!("Preset: {err}."),
            };
            true
        }
    }
}

fn reduce_fetch(state: &mut AppState, ev: FetchEvent) -> bool {
    state.is_loading = false;
    match ev {
        FetchEvent::Completed {
            patterns,
            finished_unix,
            elapsed_ms,
        } => {
            debug_hooks::log_refresh_done(patterns.len(), elapsed_ms);
            state.status_message = format!("Loaded {} patterns.", patterns.len());
            state.patterns = patterns;
            state.last_refresh_unix = Some(finished_unix);
            state.last_attempt_unix = Some(finished_unix);
            state.last_error = None;
        }
        FetchEvent::Failed {
            kind,
            message,
            finished_unix,
        } => {
            debug_hooks::log_refresh_failed(kind, &message);
            // Keep showing the last good result.
            state.status_message = format!("Refresh failed: {message}");
            state.last_error = Some(message);
            state.last_attempt_unix = Some(finished_unix);
        }
    }
    true
}

fn reduce_live(state: &mut AppState, ev: LiveEvent) -> bool {
    match ev {
        LiveEvent::Connected => {
            state.live.connected = true;
            state.status_message = "Live feed connected.".to_string();
            true
        }
        LiveEvent::Disconnected { reason } => {
            let was_connected = state.live.connected;
            state.live.connected = false;
            state.status_message = format!("Live feed disconnected: {reason}");
            was_connected
        }
        LiveEvent::PatternDetected(record) => {
            note_live_event(state);
            if !state.filters.matches(&record) {
                return false;
            }
            debug_hooks::log_live_event("pattern_detected", &record.symbol);
            insert_live_pattern(state, record);
            true
        }
        LiveEvent::PriceUpdate {
            symbol,
            price,
            change_percent,
        } => {
            note_live_event(state);
            let mut changed = false;
            for p in state
                .patterns
                .iter_mut()
                .filter(|p| p.symbol.eq_ignore_ascii_case(&symbol))
            {
                p.price = price;
                p.change_percent = change_percent;
                changed = true;
            }
            if changed {
                debug_hooks::log_live_event("price_update", &symbol);
            }
            changed
        }
    }
}

fn note_live_event(state: &mut AppState) {
    state.live.events_seen += 1;
    state.live.last_event_unix = Some(state.now_unix);
}

/// Newest first; replaces an older row for the same symbol and pattern.
fn insert_live_pattern(state: &mut AppState, record: PatternRecord) {
    state.patterns.retain(|p| !p.same_event(&record));
    state.patterns.insert(0, record);
    let limit = state.row_limit();
    state.patterns.truncate(limit);
}

fn reduce_timer(state: &mut AppState, ev: TimerEvent) -> bool {
    match ev {
        TimerEvent::Tick { now_unix } => {
            state.now_unix = now_unix;
            if state.auto_refresh_due() {
                request_refresh(state, "auto")
            } else {
                false
            }
        }
    }
}

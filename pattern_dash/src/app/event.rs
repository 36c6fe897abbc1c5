use patternscan::{FetchErrorKind, PatternFilters, PatternRecord};

#[derive(Debug, Clone)]
pub enum AppEvent {
    Ui(UiEvent),
    Fetch(FetchEvent),
    Live(LiveEvent),
    Timer(TimerEvent),
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    RefreshRequested,
    FiltersChanged { filters: PatternFilters },
    AutoRefreshChanged { secs: u64 },

    WatchlistAdd { symbol: String },
    WatchlistRemove { symbol: String },
    WatchlistOnlyToggled { enabled: bool },

    PresetSave { name: String },
    PresetApply { name: String },
    PresetDelete { name: String },
}

/// Result of one refresh, sent back by the refresher task.
#[derive(Debug, Clone)]
pub enum FetchEvent {
    Completed {
        patterns: Vec<PatternRecord>,
        finished_unix: u64,
        elapsed_ms: u128,
    },
    Failed {
        kind: FetchErrorKind,
        message: String,
        finished_unix: u64,
    },
}

/// Typed push events, already decoded from the wire.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Connected,
    Disconnected { reason: String },
    PatternDetected(PatternRecord),
    PriceUpdate {
        symbol: String,
        price: f64,
        change_percent: f64,
    },
}

#[derive(Debug, Clone)]
pub enum TimerEvent {
    Tick { now_unix: u64 },
}

use crate::persist::{PersistedState, STATE_VERSION};
use crate::presets::PresetStore;
use crate::watchlist::Watchlist;
use patternscan::{PatternFilters, PatternRecord};
use std::time::{SystemTime, UNIX_EPOCH};

/// Row cap when the filters carry no `limit`.
pub const DEFAULT_ROW_LIMIT: usize = 100;

pub fn default_filters() -> PatternFilters {
    PatternFilters::default()
        .with_universe("sp500")
        .with_confidence_min(0.6)
        .with_limit(DEFAULT_ROW_LIMIT as u32)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LiveStatus {
    pub connected: bool,
    pub events_seen: u64,
    pub last_event_unix: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub filters: PatternFilters,
    pub patterns: Vec<PatternRecord>,

    /// Set while a fetch is in flight; further refreshes are refused.
    pub is_loading: bool,
    /// Filters snapshot for the next fetch to launch.
    pub pending_refresh: Option<PatternFilters>,
    pub last_refresh_unix: Option<u64>,
    pub last_attempt_unix: Option<u64>,
    pub last_error: Option<String>,

    pub auto_refresh_secs: u64,
    pub now_unix: u64,

    pub watchlist: Watchlist,
    pub watchlist_only: bool,
    pub presets: PresetStore,

    pub live: LiveStatus,
    pub status_message: String,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            filters: default_filters(),
            patterns: Vec::new(),

            is_loading: false,
            pending_refresh: None,
            last_refresh_unix: None,
            last_attempt_unix: None,
            last_error: None,

            auto_refresh_secs: 60,
            now_unix: 0,

            watchlist: Watchlist::default(),
            watchlist_only: false,
            presets: PresetStore::default(),

            live: LiveStatus::default(),
            status_message: String::new(),
        }
    }
}

impl AppState {
    pub fn from_persisted(saved: PersistedState) -> Self {
        Self {
            filters: saved.filters,
            watchlist: saved.watchlist,
            watchlist_only: saved.watchlist_only,
            presets: saved.presets,
            auto_refresh_secs: saved.auto_refresh_secs,
            ..Self::default()
        }
    }

    pub fn to_persisted(&self) -> PersistedState {
        PersistedState {
            version: STATE_VERSION,
            filters: self.filters.clone(),
            watchlist: self.watchlist.clone(),
            watchlist_only: self.watchlist_only,
            presets: self.presets.clone(),
            auto_refresh_secs: self.auto_refresh_secs,
        }
    }

    /// Marks a refresh as wanted. Refused while one is in flight.
    pub fn queue_refresh(&mut self) -> bool {
        if self.is_loading {
            return false;
        }
        self.is_loading = true;
        self.pending_refresh = Some(self.filters.clone());
        self.last_attempt_unix = Some(self.now_unix);
        true
    }

    /// Filters to launch a fetch with, if one was queued.
    pub fn take_refresh_request(&mut self) -> Option<PatternFilters> {
        self.pending_refresh.take()
    }

    pub fn auto_refresh_due(&self) -> bool {
        if self.auto_refresh_secs == 0 || self.is_loading {
            return false;
        }
        match self.last_attempt_unix {
            None => true,
            Some(last) => self.now_unix.saturating_sub(last) >= self.auto_refresh_secs,
        }
    }

    pub fn row_limit(&self) -> usize {
        self.filters
            .limit
            .map(|l| l as usize)
            .unwrap_or(DEFAULT_ROW_LIMIT)
    }

    /// Rows to show after the watchlist-only switch.
    pub fn visible_patterns(&self) -> Vec<&PatternRecord> {
        if self.watchlist_only {
            self.watchlist.watched(&self.patterns)
        } else {
            self.patterns.iter().collect()
        }
    }
}

/// unix seconds
pub fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

use crate::debug_hooks;
use crate::presets::PresetStore;
use crate::watchlist::Watchlist;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use patternscan::PatternFilters;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// Bump when the saved layout changes.
pub const STATE_VERSION: u32 = 1;

/// What survives a restart. Fetched rows are never saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersistedState {
    pub version: u32,
    pub filters: PatternFilters,
    pub watchlist: Watchlist,
    pub watchlist_only: bool,
    pub presets: PresetStore,
    pub auto_refresh_secs: u64,
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            filters: crate::app::state::default_filters(),
            watchlist: Watchlist::default(),
            watchlist_only: false,
            presets: PresetStore::default(),
            auto_refresh_secs: 60,
        }
    }
}

struct Inner {
    path: PathBuf,
    last_saved_json: Mutex<String>,
}

#[derive(Clone)]
pub struct Persistence {
    inner: Arc<Inner>,
}

impl Persistence {
    /// State file under the platform config dir.
    pub fn new() -> Result<Self> {
        Ok(Self::at(default_state_path()?))
    }

    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self {
            inner: Arc::new(Inner {
                path: path.into(),
                last_saved_json: Mutex::new(String::new()),
            }),
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.inner.path
    }

    /// Missing file gives defaults. An unreadable one is moved aside first.
    pub fn load(&self) -> PersistedState {
        let path = &self.inner.path;
        if !path.exists() {
            return PersistedState::default();
        }
        match read_json::<PersistedState>(path) {
            Ok(mut state) => {
                if state.version == 0 {
                    state.version = STATE_VERSION;
                }
                state
            }
            Err(err) => {
                let archived = archive_corrupt(path);
                debug_hooks::log_state_corrupt(path, &err, &archived);
                PersistedState::default()
            }
        }
    }

    /// Writes only when the content changed since the last save.
    pub fn save_now(&self, state: &PersistedState) -> Result<bool> {
        let path = &self.inner.path;

        let parent = path.parent().context("state path has no parent")?;
        fs::create_dir_all(parent).with_context(|| format!("create state dir {:?}", parent))?;

        let json = serde_json::to_string_pretty(state)?;

        let mut last = match self.inner.last_saved_json.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *last == json {
            return Ok(false);
        }

        if path.exists() {
            let backup = path.with_extension("json.bak");
            if let Err(err) = fs::copy(path, &backup) {
                debug_hooks::log_state_backup_failed(&backup, &err);
            }
        }

        atomic_write(path, json.as_bytes())?;
        // Cache only what reached disk, so a failed write is retried.
        *last = json;
        debug_hooks::log_state_saved(path);
        Ok(true)
    }
}

fn default_state_path() -> Result<PathBuf> {
    let proj = ProjectDirs::from("com", "patternscan", "pattern_dash")
        .context("ProjectDirs::from returned None")?;
    Ok(proj.config_dir().join("state.json"))
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let bytes = fs::read(path).with_context(|| format!("read {:?}", path))?;
    let value = serde_json::from_slice::<T>(&bytes).context("parse json")?;
    Ok(value)
}

fn archive_corrupt(path: &Path) -> PathBuf {
    let ts = crate::app::state::now_unix();
    let archived = path.with_extension(format!("corrupt.{ts}.json"));
    let _ = fs::rename(path, &archived);
    archived
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().context("no parent dir for state path")?;
    let tmp = dir.join(format!(
        ".{}.tmp",
        path.file_name().unwrap_or_default().to_string_lossy()
    ));

    {
        let mut f = fs::File::create(&tmp).with_context(|| format!("create tmp {:?}", tmp))?;
        f.write_all(bytes).context("write tmp")?;
        let _ = f.sync_all();
    }

    fs::rename(&tmp, path).with_context(|| format!("rename {:?} -> {:?}", tmp, path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> PersistedState {
        let mut state = PersistedState::default();
        state.watchlist.add("aapl").unwrap();
        state
            .presets
            .save("tech", PatternFilters::default().with_sector("Technology"))
            .unwrap();
        state.watchlist_only = true;
        state.auto_refresh_secs = 30;
        state
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let p = Persistence::at(dir.path().join("state.json"));
        assert_eq!(p.load(), PersistedState::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");
        let p = Persistence::at(&path);
        assert!(p.save_now(&sample()).unwrap());

        let loaded = Persistence::at(&path).load();
        assert_eq!(loaded, sample());
        assert!(loaded.watchlist.contains("AAPL"));
    }

    #[test]
    fn unchanged_state_is_not_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let p = Persistence::at(&path);
        assert!(p.save_now(&sample()).unwrap());
        assert!(!p.save_now(&sample()).unwrap());
        assert!(!path.with_extension("json.bak").exists());

        let mut changed = sample();
        changed.auto_refresh_secs = 0;
        assert!(p.save_now(&changed).unwrap());
        assert!(path.with_extension("json.bak").exists());
        assert!(!dir.path().join(".state.json.tmp").exists());
    }

    #[test]
    fn failed_write_is_retried_on_next_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let tmp = dir.path().join(".state.json.tmp");
        fs::create_dir(&tmp).unwrap();

        let p = Persistence::at(&path);
        let err = p.save_now(&sample()).unwrap_err();
        assert!(format!("{err:#}").contains("create tmp"));
        assert!(!path.exists());

        fs::remove_dir(&tmp).unwrap();
        assert!(p.save_now(&sample()).unwrap());
        assert_eq!(Persistence::at(&path).load(), sample());
    }

    #[test]
    fn backup_failure_does_not_block_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::create_dir(path.with_extension("json.bak")).unwrap();

        let p = Persistence::at(&path);
        assert!(p.save_now(&sample()).unwrap());
        let mut changed = sample();
        changed.watchlist_only = false;
        assert!(p.save_now(&changed).unwrap());
        assert_eq!(Persistence::at(&path).load(), changed);
    }

    #[test]
    fn corrupt_file_is_archived() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, b"{ not json").unwrap();

        let loaded = Persistence::at(&path).load();
        assert_eq!(loaded, PersistedState::default());
        assert!(!path.exists());
        let archived: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains("corrupt"))
            .collect();
        assert_eq!(archived.len(), 1);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, br#"{"version": 0, "watchlist": ["MSFT"]}"#).unwrap();

        let loaded = Persistence::at(&path).load();
        assert_eq!(loaded.version, STATE_VERSION);
        assert!(loaded.watchlist.contains("MSFT"));
        assert_eq!(loaded.auto_refresh_secs, 60);
        assert_eq!(loaded.filters, crate::app::state::default_filters());
    }
}

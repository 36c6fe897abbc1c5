use patternscan::PatternFilters;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresetError {
    #[error("preset name is empty")]
    EmptyName,
    #[error("no preset named {0:?}")]
    NotFound(String),
}

/// Named filter snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PresetStore {
    presets: BTreeMap<String, PatternFilters>,
}

impl PresetStore {
    /// Stores `filters` under `name`. Returns true if an older preset was replaced.
    pub fn save(&mut self, name: &str, filters: PatternFilters) -> Result<bool, PresetError> {
        let name = clean_name(name)?;
        Ok(self.presets.insert(name, filters).is_some())
    }

    pub fn get(&self, name: &str) -> Result<&PatternFilters, PresetError> {
        let name = clean_name(name)?;
        self.presets.get(&name).ok_or(PresetError::NotFound(name))
    }

    pub fn delete(&mut self, name: &str) -> Result<PatternFilters, PresetError> {
        let name = clean_name(name)?;
        self.presets.remove(&name).ok_or(PresetError::NotFound(name))
    }

    /// Preset names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.presets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

fn clean_name(name: &str) -> Result<String, PresetError> {
    let name = name.trim();
    if name.is_empty() {
        Err(PresetError::EmptyName)
    } else {
        Ok(name.to_string())
    }
}

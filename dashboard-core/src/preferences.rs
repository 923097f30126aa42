//! User preferences: the active unit system and the most recent searches.
//!
//! Every mutation is written through to a [`KeyValueStore`] immediately.
//! Loading is best-effort: malformed stored values fall back to defaults.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, HashMap},
    fmt::Debug,
    fs,
    path::{Path, PathBuf},
};

use crate::units::Units;

pub const UNITS_KEY: &str = "weatherUnits";
pub const RECENT_SEARCHES_KEY: &str = "recentSearches";
pub const MAX_RECENT_SEARCHES: usize = 3;

/// String key/value persistence for preferences.
pub trait KeyValueStore: Send + Debug {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON object on disk, rewritten on every `set`.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file starts empty; an unreadable
    /// one is logged and also starts empty.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(err) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %err,
                    "ignoring unreadable preferences file"
                );
                BTreeMap::new()
            }
        };
        Self { path, entries }
    }

    fn read_entries(path: &Path) -> Result<BTreeMap<String, String>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read preferences file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse preferences file: {}", path.display()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) -> Result<()> {
        self.entries.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create preferences directory: {}", parent.display())
            })?;
        }
        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize preferences")?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write preferences file: {}", self.path.display()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Preferences {
    pub units: Units,
    /// Most recent first, case-insensitively unique, at most [`MAX_RECENT_SEARCHES`].
    pub recent_searches: Vec<String>,
}

/// Owner of the [`Preferences`] and their persistence.
#[derive(Debug)]
pub struct PreferenceContext {
    prefs: Preferences,
    store: Box<dyn KeyValueStore>,
}

impl PreferenceContext {
    /// Hydrate preferences from `store`.
    pub fn load(store: Box<dyn KeyValueStore>) -> Self {
        let units = match store.get(UNITS_KEY) {
            Some(raw) => raw.parse().unwrap_or_else(|err| {
                tracing::warn!(error = %err, "ignoring stored units");
                Units::default()
            }),
            None => Units::default(),
        };

        let recent_searches = match store.get(RECENT_SEARCHES_KEY) {
            Some(raw) => match serde_json::from_str::<Vec<String>>(&raw) {
                Ok(list) => normalize_recent(list),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to parse recent searches");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        Self {
            prefs: Preferences {
                units,
                recent_searches,
            },
            store,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn units(&self) -> Units {
        self.prefs.units
    }

    pub fn recent_searches(&self) -> &[String] {
        &self.prefs.recent_searches
    }

    /// Flip between metric and imperial and persist the result.
    pub fn toggle_units(&mut self) {
        self.prefs.units = self.prefs.units.toggle();
        self.persist(UNITS_KEY, self.prefs.units.as_str().to_string());
    }

    /// Put `city` at the front of the recent searches, dropping any entry
    /// equal to it ignoring case. Blank input is ignored.
    pub fn add_recent_search(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            return;
        }

        let lowered = city.to_lowercase();
        let recent = &mut self.prefs.recent_searches;
        recent.retain(|c| c.to_lowercase() != lowered);
        recent.insert(0, city.to_string());
        recent.truncate(MAX_RECENT_SEARCHES);

        match serde_json::to_string(recent) {
            Ok(json) => self.persist(RECENT_SEARCHES_KEY, json),
            Err(err) => tracing::warn!(error = %err, "failed to encode recent searches"),
        }
    }

    fn persist(&mut self, key: &str, value: String) {
        if let Err(err) = self.store.set(key, value) {
            tracing::warn!(key, error = %err, "failed to persist preference");
        }
    }
}

/// Enforce the recent-search invariants on a list read from storage.
fn normalize_recent(list: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(MAX_RECENT_SEARCHES);
    for city in list {
        let city = city.trim();
        if city.is_empty() || out.iter().any(|c| c.to_lowercase() == city.to_lowercase()) {
            continue;
        }
        out.push(city.to_string());
        if out.len() == MAX_RECENT_SEARCHES {
            break;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> PreferenceContext {
        PreferenceContext::load(Box::new(MemoryStore::new()))
    }

    #[test]
    fn defaults_without_stored_values() {
        let ctx = context();
        assert_eq!(ctx.preferences(), &Preferences::default());
        assert_eq!(ctx.units(), Units::Metric);
        assert!(ctx.recent_searches().is_empty());
    }

    #[test]
    fn toggle_units_twice_restores_original() {
        let mut ctx = context();
        ctx.toggle_units();
        assert_eq!(ctx.units(), Units::Imperial);
        ctx.toggle_units();
        assert_eq!(ctx.units(), Units::Metric);
    }

    #[test]
    fn recent_searches_are_bounded_and_most_recent_first() {
        let mut ctx = context();
        for city in ["Oslo", "Paris", "Rome", "Tokyo"] {
            ctx.add_recent_search(city);
        }
        assert_eq!(ctx.recent_searches(), ["Tokyo", "Rome", "Paris"]);
    }

    #[test]
    fn recent_searches_dedupe_case_insensitively() {
        let mut ctx = context();
        ctx.add_recent_search("London");
        ctx.add_recent_search("london");
        assert_eq!(ctx.recent_searches(), ["london"]);

        ctx.add_recent_search("Paris");
        ctx.add_recent_search("LONDON");
        assert_eq!(ctx.recent_searches(), ["LONDON", "Paris"]);
    }

    #[test]
    fn blank_search_is_ignored() {
        let mut ctx = context();
        ctx.add_recent_search("  ");
        assert!(ctx.recent_searches().is_empty());
    }

    #[test]
    fn mutations_are_persisted_and_reloaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("preferences.json");

        let mut ctx = PreferenceContext::load(Box::new(FileStore::open(&path)));
        ctx.toggle_units();
        ctx.add_recent_search("Berlin");
        ctx.add_recent_search("Madrid");

        let stored: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(stored[UNITS_KEY], "imperial");
        assert_eq!(stored[RECENT_SEARCHES_KEY], r#"["Madrid","Berlin"]"#);

        let reloaded = PreferenceContext::load(Box::new(FileStore::open(&path)));
        assert_eq!(reloaded.units(), Units::Imperial);
        assert_eq!(reloaded.recent_searches(), ["Madrid", "Berlin"]);
    }

    #[test]
    fn malformed_stored_values_fall_back_to_defaults() {
        let mut store = MemoryStore::new();
        store.set(UNITS_KEY, "kelvin".into()).unwrap();
        store.set(RECENT_SEARCHES_KEY, "not json".into()).unwrap();

        let ctx = PreferenceContext::load(Box::new(store));
        assert_eq!(ctx.preferences(), &Preferences::default());
    }

    #[test]
    fn stored_list_is_normalized_on_load() {
        let mut store = MemoryStore::new();
        store
            .set(RECENT_SEARCHES_KEY, r#"["Oslo","oslo","Rome","Lima","Kyiv"]"#.into())
            .unwrap();

        let ctx = PreferenceContext::load(Box::new(store));
        assert_eq!(ctx.recent_searches(), ["Oslo", "Rome", "Lima"]);
    }

    #[test]
    fn unreadable_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        fs::write(&path, "{ broken").unwrap();

        let ctx = PreferenceContext::load(Box::new(FileStore::open(&path)));
        assert_eq!(ctx.preferences(), &Preferences::default());
    }
}

//! Language lines for entry titles, descriptions, databank paths and subtitles.
//!
//! Lines live in two tiers. The override tier is in memory only and always wins; it's where titles
//! and descriptions are put every launch. The persisted tier is the plugin's localization file,
//! which the host reads on its own, and which we only ever add keys to.

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use eyre::{eyre, Context, Result};
use serde_json::Value;

type Table = BTreeMap<String, String>;

/// Locks `mutex`, recovering the data if a previous holder panicked. Every critical section in
/// this module leaves its table in a usable state, so a poisoned lock is still safe to use.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poison| poison.into_inner())
}

/// The localization file on disk.
struct PersistedTable {
    path: PathBuf,

    /// Held across every load-modify-save cycle so that concurrent writers can't lose each
    /// other's additions.
    file_lock: Mutex<()>,

    /// The table as last loaded or saved. `None` until the first lookup needs it.
    loaded: Mutex<Option<Table>>,
}

impl PersistedTable {
    fn new(path: PathBuf) -> PersistedTable {
        PersistedTable {
            path,
            file_lock: Mutex::new(()),
            loaded: Mutex::new(None),
        }
    }

    /// Reads the file. A missing file is an empty table.
    fn read(&self) -> Result<Table> {
        if !self.path.exists() {
            return Ok(Table::new());
        }

        let json = std::fs::read_to_string(&self.path).wrap_err("failed to read file")?;

        // Editors on Windows like to start the file with a byte order mark.
        let json = json.strip_prefix('\u{feff}').unwrap_or(&json);

        if json.trim().is_empty() {
            return Ok(Table::new());
        }

        let raw: BTreeMap<String, Value> =
            serde_json::from_str(json).wrap_err("failed to parse file")?;

        raw.into_iter()
            .filter_map(|(key, value)| match value {
                Value::String(line) => Some(Ok((key, line))),
                Value::Number(number) => Some(Ok((key, number.to_string()))),
                Value::Bool(flag) => Some(Ok((key, flag.to_string()))),
                Value::Null => None,
                Value::Array(_) | Value::Object(_) => {
                    Some(Err(eyre!("value for '{}' is not a single line", key)))
                }
            })
            .collect()
    }

    /// Reads the file, logging and swallowing any error.
    fn load(&self) -> Table {
        match self.read() {
            Ok(table) => table,
            Err(err) => {
                log::error!(
                    "Error loading localization file at {:?}: {:?}",
                    self.path,
                    err
                );

                Table::new()
            }
        }
    }

    /// Writes `table` to the file, creating its directory if needed.
    fn save(&self, table: &Table) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).wrap_err("failed to create directory")?;
        }

        std::fs::write(&self.path, serde_json::to_string_pretty(table)?)
            .wrap_err("failed to write file")?;

        log::debug!("Updated localization file saved to {:?}", self.path);
        Ok(())
    }

    /// Runs `query` against the cached table, loading it first if necessary.
    fn with_loaded<T>(&self, query: impl FnOnce(&Table) -> T) -> T {
        {
            let loaded = lock(&self.loaded);

            if let Some(table) = loaded.as_ref() {
                return query(table);
            }
        }

        // Locks are always taken file first, then table.
        let _file = lock(&self.file_lock);
        let mut loaded = lock(&self.loaded);

        query(loaded.get_or_insert_with(|| self.load()))
    }
}

/// Two-tier key/value store for language lines.
pub struct LocalizationStore {
    overrides: Mutex<Table>,
    persisted: PersistedTable,
}

impl LocalizationStore {
    /// Creates a store backed by the localization file at `path`. The file isn't touched until it's
    /// needed.
    pub fn new(path: impl Into<PathBuf>) -> LocalizationStore {
        LocalizationStore {
            overrides: Mutex::new(Table::new()),
            persisted: PersistedTable::new(path.into()),
        }
    }

    pub fn file_path(&self) -> &Path {
        &self.persisted.path
    }

    /// Sets `key` to `value` in the override tier, replacing any earlier value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        lock(&self.overrides).insert(key.into(), value.into());
    }

    /// Returns the line for `key`. If no tier has one, the key itself is returned so there's always
    /// something to display.
    pub fn get(&self, key: &str) -> String {
        if let Some(value) = lock(&self.overrides).get(key) {
            return value.clone();
        }

        self.persisted
            .with_loaded(|table| table.get(key).cloned())
            .unwrap_or_else(|| key.to_string())
    }

    /// Returns `true` if either tier has a line for `key`.
    pub fn has(&self, key: &str) -> bool {
        if lock(&self.overrides).contains_key(key) {
            return true;
        }

        self.persisted.with_loaded(|table| table.contains_key(key))
    }

    /// Adds `label` under `key` to the localization file unless the file already has that key.
    /// Returns `true` if the label was added.
    ///
    /// The file is re-read inside the lock rather than trusting the cached copy, so lines added by
    /// anything else since it was loaded are kept.
    pub fn add_path_label_if_absent(&self, key: &str, label: &str) -> bool {
        let _file = lock(&self.persisted.file_lock);

        // Saving after a failed read would replace every line in the file with just this one.
        let mut table = match self.persisted.read() {
            Ok(table) => table,

            Err(err) => {
                log::error!(
                    "Not adding {} to localization file at {:?}, which couldn't be loaded: {:?}",
                    key,
                    self.persisted.path,
                    err
                );

                return false;
            }
        };

        let added = if table.contains_key(key) {
            log::debug!("Path {} already exists in localization data", key);
            false
        } else {
            table.insert(key.to_string(), label.to_string());
            log::info!("Added new path to localization: {} = {}", key, label);
            true
        };

        if let Err(err) = self.persisted.save(&table) {
            log::error!(
                "Error saving localization file at {:?}: {:?}",
                self.persisted.path,
                err
            );
        }

        *lock(&self.persisted.loaded) = Some(table);

        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn store_in(dir: &TempDir) -> LocalizationStore {
        LocalizationStore::new(dir.path().join("Localization").join("English.json"))
    }

    fn persisted(dir: &TempDir) -> Table {
        let json =
            std::fs::read_to_string(dir.path().join("Localization").join("English.json")).unwrap();
        serde_json::from_str(&json).unwrap()
    }

    fn write_file(dir: &TempDir, json: &str) {
        let path = dir.path().join("Localization");
        std::fs::create_dir_all(&path).unwrap();
        std::fs::write(path.join("English.json"), json).unwrap();
    }

    #[test]
    fn get_prefers_override_then_file_then_key() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, r#"{ "EncyTitle_a": "From file", "EncyTitle_b": "Also from file" }"#);

        let store = store_in(&dir);
        store.set("EncyTitle_a", "Override");

        assert_eq!(store.get("EncyTitle_a"), "Override");
        assert_eq!(store.get("EncyTitle_b"), "Also from file");
        assert_eq!(store.get("EncyTitle_c"), "EncyTitle_c");
    }

    #[test]
    fn set_overwrites() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        store.set("line", "first");
        store.set("line", "second");

        assert_eq!(store.get("line"), "second");
    }

    #[test]
    fn has_checks_both_tiers() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, r#"{ "persisted": "yes" }"#);

        let store = store_in(&dir);
        store.set("memory", "yes");

        assert!(store.has("memory"));
        assert!(store.has("persisted"));
        assert!(!store.has("neither"));
    }

    #[test]
    fn unreadable_file_means_not_found() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "{ this is not json");

        let store = store_in(&dir);

        assert!(!store.has("anything"));
        assert_eq!(store.get("anything"), "anything");
    }

    #[test]
    fn path_labels_are_never_overwritten() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        assert!(store.add_path_label_if_absent("EncyPath_Alien", "Alien"));
        assert!(!store.add_path_label_if_absent("EncyPath_Alien", "Something else"));

        let table = persisted(&dir);
        assert_eq!(table.len(), 1);
        assert_eq!(table["EncyPath_Alien"], "Alien");
        assert_eq!(store.get("EncyPath_Alien"), "Alien");
    }

    #[test]
    fn path_labels_keep_existing_file_lines() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, r#"{ "Existing": "Kept" }"#);

        let store = store_in(&dir);
        store.add_path_label_if_absent("EncyPath_New", "New");

        let table = persisted(&dir);
        assert_eq!(table["Existing"], "Kept");
        assert_eq!(table["EncyPath_New"], "New");
    }

    #[test]
    fn byte_order_mark_is_skipped() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, "\u{feff}{ \"Existing\": \"Kept\", \"Other\": \"Also\" }");

        let store = store_in(&dir);
        assert_eq!(store.get("Existing"), "Kept");

        assert!(store.add_path_label_if_absent("EncyPath_New", "New"));

        let table = persisted(&dir);
        assert_eq!(table.len(), 3);
        assert_eq!(table["Existing"], "Kept");
        assert_eq!(table["Other"], "Also");
    }

    #[test]
    fn scalar_values_are_read_as_text() {
        let dir = TempDir::new().unwrap();
        write_file(&dir, r#"{ "Existing": "Kept", "Count": 3, "Flag": true, "Gone": null }"#);

        let store = store_in(&dir);
        assert_eq!(store.get("Count"), "3");
        assert_eq!(store.get("Flag"), "true");
        assert!(!store.has("Gone"));

        store.add_path_label_if_absent("EncyPath_New", "New");

        let table = persisted(&dir);
        assert_eq!(table["Existing"], "Kept");
        assert_eq!(table["Count"], "3");
        assert_eq!(table["EncyPath_New"], "New");
    }

    #[test]
    fn unparsable_file_is_left_alone() {
        let dir = TempDir::new().unwrap();
        let broken = r#"{ "Existing": "Kept", "Nested": { "a": "b" } "#;
        write_file(&dir, broken);

        let store = store_in(&dir);
        assert!(!store.add_path_label_if_absent("EncyPath_New", "New"));

        let on_disk =
            std::fs::read_to_string(dir.path().join("Localization").join("English.json")).unwrap();
        assert_eq!(on_disk, broken);
    }

    #[test]
    fn cached_file_tier_sees_new_labels() {
        let dir = TempDir::new().unwrap();
        let store = store_in(&dir);

        // Load the (empty) file tier before adding to it.
        assert!(!store.has("EncyPath_Late"));

        store.add_path_label_if_absent("EncyPath_Late", "Late");
        assert!(store.has("EncyPath_Late"));
    }

    #[test]
    fn concurrent_additions_are_all_kept() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(store_in(&dir));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);

                std::thread::spawn(move || {
                    for j in 0..10 {
                        store.add_path_label_if_absent(&format!("EncyPath_{}_{}", i, j), "label");
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(persisted(&dir).len(), 80);
    }
}

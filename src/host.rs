//! The interface to the modding host.
//!
//! Everything the plugin does to the game goes through [`Host`]. The pipeline always hands the host
//! fully resolved data, and never lets an error from it escape: each failure is logged and
//! recorded against the descriptor that caused it.

use std::path::Path;

use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::{assets::SharedAsset, tech_type::TechType};

/// A sound that has been handed to the host's audio system.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredSound {
    pub id: String,
    pub clip: SharedAsset,

    /// The mixer bus the sound plays on.
    pub bus: String,
}

/// The category a story goal belongs to, which decides what the host does when it fires.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum GoalType {
    /// Plays a PDA audio log.
    Pda,

    /// Unlocks an encyclopedia entry.
    Encyclopedia,
}

/// A trigger that fires when the player picks up an item of `tech_type`.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryGoal {
    pub key: String,
    pub goal_type: GoalType,
    pub tech_type: TechType,

    /// Seconds between the trigger and the goal firing.
    pub delay: f32,
}

/// Everything the host needs to show an encyclopedia entry.
#[derive(Debug, Clone, PartialEq)]
pub struct EncyclopediaEntry {
    pub key: String,

    /// Slash-separated databank location.
    pub path: String,

    pub title: String,
    pub description: String,
    pub image: Option<SharedAsset>,
    pub popup: Option<SharedAsset>,
    pub sound: Option<RegisteredSound>,
}

/// A PDA audio log.
#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    pub key: String,
    pub subtitle: String,
    pub sound: RegisteredSound,
    pub icon: Option<SharedAsset>,
}

/// Calls into the game. Implemented by the host integration layer.
pub trait Host {
    /// Returns `true` if the plugin with `plugin_id` has been loaded by the host.
    fn is_plugin_loaded(&self, plugin_id: &str) -> bool;

    fn register_sound(&self, sound: &RegisteredSound) -> Result<()>;

    fn register_item_goal(&self, goal: &StoryGoal) -> Result<()>;

    fn add_encyclopedia_entry(&self, entry: &EncyclopediaEntry) -> Result<()>;

    fn add_log_entry(&self, entry: &LogEntry) -> Result<()>;

    /// Asks the host to load language files from `folder`.
    fn register_localization_folder(&self, folder: &Path) -> Result<()>;
}

/// A [`Host`] that records every call, for tests.
#[cfg(test)]
pub mod testing {
    use super::*;
    use std::{
        collections::HashSet,
        path::PathBuf,
        sync::{
            atomic::{AtomicBool, Ordering},
            Mutex,
        },
    };

    #[derive(Default)]
    pub struct RecordingHost {
        loaded_plugins: Mutex<HashSet<String>>,
        sounds: Mutex<Vec<RegisteredSound>>,
        goals: Mutex<Vec<StoryGoal>>,
        entries: Mutex<Vec<EncyclopediaEntry>>,
        log_entries: Mutex<Vec<LogEntry>>,
        localization_folders: Mutex<Vec<PathBuf>>,

        fail_sounds: AtomicBool,
        failing_entries: Mutex<HashSet<String>>,
    }

    impl RecordingHost {
        pub fn new() -> RecordingHost {
            RecordingHost::default()
        }

        pub fn with_plugins(ids: &[&str]) -> RecordingHost {
            let host = RecordingHost::new();
            host.loaded_plugins
                .lock()
                .unwrap()
                .extend(ids.iter().map(|id| id.to_string()));
            host
        }

        pub fn fail_sounds(&self, fail: bool) {
            self.fail_sounds.store(fail, Ordering::SeqCst);
        }

        /// Makes encyclopedia registration fail for `key`.
        pub fn fail_entry(&self, key: &str) {
            self.failing_entries.lock().unwrap().insert(key.to_string());
        }

        pub fn sounds(&self) -> Vec<RegisteredSound> {
            self.sounds.lock().unwrap().clone()
        }

        pub fn goals(&self) -> Vec<StoryGoal> {
            self.goals.lock().unwrap().clone()
        }

        pub fn entries(&self) -> Vec<EncyclopediaEntry> {
            self.entries.lock().unwrap().clone()
        }

        pub fn entry(&self, key: &str) -> Option<EncyclopediaEntry> {
            self.entries().into_iter().find(|entry| entry.key == key)
        }

        pub fn log_entries(&self) -> Vec<LogEntry> {
            self.log_entries.lock().unwrap().clone()
        }

        pub fn localization_folders(&self) -> Vec<PathBuf> {
            self.localization_folders.lock().unwrap().clone()
        }
    }

    impl Host for RecordingHost {
        fn is_plugin_loaded(&self, plugin_id: &str) -> bool {
            self.loaded_plugins.lock().unwrap().contains(plugin_id)
        }

        fn register_sound(&self, sound: &RegisteredSound) -> Result<()> {
            if self.fail_sounds.load(Ordering::SeqCst) {
                eyre::bail!("audio system unavailable");
            }

            self.sounds.lock().unwrap().push(sound.clone());
            Ok(())
        }

        fn register_item_goal(&self, goal: &StoryGoal) -> Result<()> {
            self.goals.lock().unwrap().push(goal.clone());
            Ok(())
        }

        fn add_encyclopedia_entry(&self, entry: &EncyclopediaEntry) -> Result<()> {
            if self.failing_entries.lock().unwrap().contains(&entry.key) {
                eyre::bail!("databank rejected '{}'", entry.key);
            }

            self.entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        fn add_log_entry(&self, entry: &LogEntry) -> Result<()> {
            self.log_entries.lock().unwrap().push(entry.clone());
            Ok(())
        }

        fn register_localization_folder(&self, folder: &Path) -> Result<()> {
            self.localization_folders
                .lock()
                .unwrap()
                .push(folder.to_path_buf());
            Ok(())
        }
    }
}

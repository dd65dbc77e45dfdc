//! Plugin configuration.
//!
//! Settings are read from `pdassist.settings.json` in the plugin folder. Every field has a default,
//! so the file is optional and may list only the values it wants to change.

use std::{
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};

/// Name of the settings file inside the plugin folder.
pub const SETTINGS_FILE_NAME: &str = "pdassist.settings.json";

/// The voice bus that audio logs play on.
pub const PDA_VOICE_BUS: &str = "bus:/master/all/all voice/AI voice";

/// Folder layout, relative to the plugin folder unless noted otherwise.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Layout {
    /// Holds our own `PDA` and audio log folders.
    pub data_dir: PathBuf,

    /// Name of the PDA entry folder, inside the data folder or a mod's `Assets` folder.
    pub pda_folder: String,

    /// Names of the audio log folders inside the data folder.
    pub audio_log_folders: Vec<String>,

    /// Names of the audio log folders inside a mod's `Assets` folder.
    pub mod_audio_log_folders: Vec<String>,

    /// Folder of loose sound files searched before anything else.
    pub audio_assets_dir: PathBuf,

    /// Folder that bundle names are relative to.
    pub bundle_dir: PathBuf,

    /// Folder of soft-dependency manifests.
    pub soft_dependencies_dir: PathBuf,

    /// The persisted localization file.
    pub localization_file: PathBuf,
}

impl Default for Layout {
    fn default() -> Self {
        Layout {
            data_dir: ["Assets", "EncyclopediaData"].iter().collect(),
            pda_folder: "PDA".to_string(),
            audio_log_folders: vec!["AudioLogs".to_string()],
            mod_audio_log_folders: vec!["VoiceLogs".to_string()],
            audio_assets_dir: ["Assets", "AudioAssets"].iter().collect(),
            bundle_dir: PathBuf::from("Assets"),
            soft_dependencies_dir: ["Assets", "SoftDependencies"].iter().collect(),
            localization_file: ["Localization", "English.json"].iter().collect(),
        }
    }
}

/// How much is written to the log file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl Default for LogLevel {
    fn default() -> Self {
        if cfg!(feature = "debug") {
            LogLevel::Debug
        } else {
            LogLevel::Info
        }
    }
}

impl LogLevel {
    pub fn filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// The plugin's settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// The folder the plugin is installed in. Everything in `layout` is relative to this.
    #[serde(skip)]
    pub plugin_dir: PathBuf,

    pub layout: Layout,

    /// The mixer bus audio logs are registered on.
    pub voice_bus: String,

    /// Delay in seconds before an encyclopedia goal fires.
    pub encyclopedia_goal_delay: f32,

    /// Delay in seconds before an audio log goal fires.
    pub audio_log_goal_delay: f32,

    /// Name of the log file inside the plugin folder.
    pub log_file: String,

    pub log_level: LogLevel,

    /// Whether a crash report is written when the plugin panics.
    pub write_panic_report: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            plugin_dir: PathBuf::new(),
            layout: Layout::default(),
            voice_bus: PDA_VOICE_BUS.to_string(),
            encyclopedia_goal_delay: 2.0,
            audio_log_goal_delay: 0.0,
            log_file: "pdassist.log".to_string(),
            log_level: LogLevel::default(),
            write_panic_report: true,
        }
    }
}

impl Settings {
    /// Default settings for a plugin installed in `plugin_dir`.
    pub fn for_plugin_dir(plugin_dir: impl Into<PathBuf>) -> Settings {
        Settings {
            plugin_dir: plugin_dir.into(),
            ..Settings::default()
        }
    }

    /// Attempts to parse the contents of `reader` to get a `Settings` value.
    fn parse_json(reader: impl Read) -> Result<Settings> {
        // Coerce with `?`.
        Ok(serde_json::from_reader(reader)?)
    }

    /// Looks for a settings file in `plugin_dir` and loads it.
    fn load_from_file(plugin_dir: &Path) -> Result<Option<Settings>> {
        let path = plugin_dir.join(SETTINGS_FILE_NAME);

        if !path.exists() {
            // This isn't an error, but we didn't find any settings.
            return Ok(None);
        }

        let file = File::open(&path).wrap_err_with(|| format!("opening {:?}", path))?;

        Ok(Some(
            Settings::parse_json(file).wrap_err_with(|| format!("parsing {:?}", path))?,
        ))
    }

    /// Either loads the settings for `plugin_dir` from disk or generates default values for them.
    pub fn load(plugin_dir: impl Into<PathBuf>) -> Settings {
        let plugin_dir = plugin_dir.into();

        let settings = match Settings::load_from_file(&plugin_dir) {
            Ok(Some(settings)) => settings,

            Ok(None) => {
                log::info!("No settings file found. Defaults will be used.");
                Settings::default()
            }

            Err(err) => {
                log::error!("Error loading settings file: {err:?}. Defaults will be used.");
                Settings::default()
            }
        };

        Settings {
            plugin_dir,
            ..settings
        }
    }

    /// Saves the settings to the plugin folder.
    pub fn save(&self) -> Result<()> {
        std::fs::write(
            self.plugin_dir.join(SETTINGS_FILE_NAME),
            serde_json::to_string_pretty(self)?,
        )?;

        Ok(())
    }

    fn resolve(&self, relative: &Path) -> PathBuf {
        self.plugin_dir.join(relative)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.resolve(&self.layout.data_dir)
    }

    pub fn audio_assets_dir(&self) -> PathBuf {
        self.resolve(&self.layout.audio_assets_dir)
    }

    pub fn bundle_dir(&self) -> PathBuf {
        self.resolve(&self.layout.bundle_dir)
    }

    pub fn soft_dependencies_dir(&self) -> PathBuf {
        self.resolve(&self.layout.soft_dependencies_dir)
    }

    pub fn localization_file(&self) -> PathBuf {
        self.resolve(&self.layout.localization_file)
    }

    pub fn log_path(&self) -> PathBuf {
        self.plugin_dir.join(&self.log_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = Settings::load(dir.path());

        assert_eq!(settings, Settings::for_plugin_dir(dir.path()));
        assert_eq!(
            settings.localization_file(),
            dir.path().join("Localization").join("English.json")
        );
        assert_eq!(
            settings.data_dir(),
            dir.path().join("Assets").join("EncyclopediaData")
        );
    }

    #[test]
    fn partial_file_overrides_only_given_values() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join(SETTINGS_FILE_NAME),
            r#"{ "encyclopedia_goal_delay": 5.0, "layout": { "pda_folder": "Entries" } }"#,
        )
        .unwrap();

        let settings = Settings::load(dir.path());

        assert_eq!(settings.encyclopedia_goal_delay, 5.0);
        assert_eq!(settings.layout.pda_folder, "Entries");
        assert_eq!(settings.layout.audio_log_folders, vec!["AudioLogs".to_string()]);
        assert_eq!(settings.voice_bus, PDA_VOICE_BUS);
        assert_eq!(settings.plugin_dir, dir.path());
    }

    #[test]
    fn broken_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join(SETTINGS_FILE_NAME), "{ nope").unwrap();

        assert_eq!(Settings::load(dir.path()), Settings::for_plugin_dir(dir.path()));
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = TempDir::new().unwrap();
        let mut settings = Settings::for_plugin_dir(dir.path());
        settings.voice_bus = "bus:/custom".to_string();
        settings.log_level = LogLevel::Trace;
        settings.save().unwrap();

        assert_eq!(Settings::load(dir.path()), settings);
    }
}

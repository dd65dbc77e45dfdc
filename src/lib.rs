//! PDAssist registers encyclopedia entries and PDA audio logs described by JSON files.
//!
//! The host integration layer builds a [`Plugin`] once it knows where the plugin is installed, lets
//! other mods add their folders through [`Plugin::mod_paths`], and then calls [`Plugin::load`]
//! with its implementation of [`Host`].

pub mod assets;
pub mod dependencies;
pub mod descriptor;
pub mod host;
pub mod loader;
pub mod localization;
pub mod logging;
pub mod mod_paths;
pub mod problem;
pub mod registrar;
pub mod settings;
pub mod sound;
pub mod tech_type;

use std::path::PathBuf;

pub use assets::Resolver;
pub use host::Host;
pub use loader::LoadSummary;
pub use localization::LocalizationStore;
pub use mod_paths::ModPathRegistry;
pub use problem::Problem;
pub use registrar::{KeyLedger, Registrar};
pub use settings::Settings;
pub use sound::SoundRegistry;

use loader::ContentRoot;

/// All of the plugin's state. Each service is created once here and shared by reference.
pub struct Plugin {
    settings: Settings,
    localization: LocalizationStore,
    resolver: Resolver,
    sounds: SoundRegistry,
    mod_paths: ModPathRegistry,
    keys: KeyLedger,
}

impl Plugin {
    pub fn new(settings: Settings) -> Plugin {
        Plugin {
            localization: LocalizationStore::new(settings.localization_file()),
            resolver: Resolver::new(),
            sounds: SoundRegistry::new(),
            mod_paths: ModPathRegistry::new(),
            keys: KeyLedger::new(),
            settings,
        }
    }

    /// Creates the plugin for the installation in `plugin_dir`, reading its settings file if
    /// there is one.
    pub fn for_plugin_dir(plugin_dir: impl Into<PathBuf>) -> Plugin {
        Plugin::new(Settings::load(plugin_dir))
    }

    /// Starts writing our log file. Only call this if the host hasn't installed a logger.
    pub fn init_logging(&self) -> eyre::Result<()> {
        logging::init(
            &self.settings.log_path(),
            self.settings.log_level.filter(),
            self.settings.write_panic_report,
        )?;

        log::info!("PDAssist {} logging started", env!("CARGO_PKG_VERSION"));
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn localization(&self) -> &LocalizationStore {
        &self.localization
    }

    pub fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    pub fn sounds(&self) -> &SoundRegistry {
        &self.sounds
    }

    /// Other mods register their folders here before [`Plugin::load`] runs.
    pub fn mod_paths(&self) -> &ModPathRegistry {
        &self.mod_paths
    }

    /// A registrar that registers with `host` using this plugin's services.
    pub fn registrar<'a>(&'a self, host: &'a dyn Host) -> Registrar<'a> {
        Registrar::new(
            host,
            &self.settings,
            &self.localization,
            &self.resolver,
            &self.sounds,
            &self.keys,
        )
    }

    /// Loads and registers all content: ours first, then that of each registered mod. Nothing
    /// here can fail; every problem is logged and counted in the summary.
    pub fn load(&self, host: &dyn Host) -> LoadSummary {
        log::info!("PDAssist {} loading content", env!("CARGO_PKG_VERSION"));

        dependencies::check(host, &self.settings.soft_dependencies_dir());

        let registrar = self.registrar(host);
        let mut summary = LoadSummary::default();

        let mod_roots: Vec<ContentRoot> = self
            .mod_paths
            .list()
            .iter()
            .map(|path| ContentRoot::for_mod(path, &self.settings))
            .collect();

        loader::load_root(
            &registrar,
            &ContentRoot::primary(&self.settings),
            &mod_roots,
            &mut summary,
        );

        for root in &mod_roots {
            loader::load_root(&registrar, root, &mod_roots, &mut summary);
        }

        let localization_dir = self
            .settings
            .localization_file()
            .parent()
            .map(|dir| dir.to_path_buf())
            .unwrap_or_else(|| self.settings.plugin_dir.clone());

        match host.register_localization_folder(&localization_dir) {
            Ok(()) => log::info!("Localization folder {:?} registered", localization_dir),
            Err(err) => log::error!("Unable to register localization folder: {:#}", err),
        }

        log::info!(
            "Finished loading: {} registered, {} duplicate, {} failed, {} aborted, {} files skipped",
            summary.registered,
            summary.duplicate,
            summary.failed,
            summary.aborted,
            summary.skipped_files
        );

        summary
    }
}

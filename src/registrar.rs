//! Turns descriptors into registered game content.
//!
//! Each descriptor goes through the same steps, in order:
//!
//!  1. Its title, description and (for PDA entries) databank path labels are localized.
//!  2. Its images and sound are resolved. Any of them may be missing.
//!  3. Audio logs have their sound registered and get a subtitle line.
//!  4. The tech type is validated and, if valid, a story goal is registered.
//!  5. The entry itself is registered with the host.
//!
//! Nothing that goes wrong for one descriptor affects any other. Problems are logged as they
//! happen and collected into the [`Report`] returned for the descriptor.

use std::{collections::HashSet, path::PathBuf, sync::Mutex};

use itertools::Itertools;

use crate::{
    assets::{AssetKind, Resolution, Resolver, SharedAsset, Strategy},
    descriptor::{AudioLogEntry, Descriptor},
    host::{EncyclopediaEntry, GoalType, Host, LogEntry, RegisteredSound, StoryGoal},
    localization::LocalizationStore,
    problem::Problem,
    settings::Settings,
    sound::{SoundOutcome, SoundRegistry},
    tech_type::TechType,
};

/// Localization key for an entry's title.
pub fn title_key(key: &str) -> String {
    format!("EncyTitle_{}", key)
}

/// Localization key for an entry's description.
pub fn description_key(key: &str) -> String {
    format!("EncyDesc_{}", key)
}

/// Returns the localization key and label for every prefix of a databank path, shortest first.
/// `"A/B/C"` gives `EncyPath_A`, `EncyPath_A/B` and `EncyPath_A/B/C`, labelled `A`, `B` and `C`.
pub fn path_labels(path: &str) -> Vec<(String, String)> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    (1..=segments.len())
        .map(|len| {
            (
                format!("EncyPath_{}", segments[..len].iter().join("/")),
                segments[len - 1].to_string(),
            )
        })
        .collect()
}

/// The keys that have been claimed by a descriptor during this run.
#[derive(Default)]
pub struct KeyLedger {
    claimed: Mutex<HashSet<String>>,
}

impl KeyLedger {
    pub fn new() -> KeyLedger {
        KeyLedger::default()
    }

    /// Claims `key`, returning `false` if it was claimed before.
    pub fn claim(&self, key: &str) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .insert(key.to_string())
    }

    pub fn is_claimed(&self, key: &str) -> bool {
        self.claimed
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .contains(key)
    }
}

/// The directories a descriptor's loose assets may be found in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchPaths {
    /// Directories searched for images, in order.
    pub images: Vec<PathBuf>,

    /// Directories searched for sounds, in order.
    pub sounds: Vec<PathBuf>,

    /// The directory that bundle names are relative to.
    pub bundle_dir: PathBuf,
}

/// How a descriptor's registration ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Status {
    /// The host accepted the entry. There may still be problems with optional parts.
    Registered,

    /// The key had already been used, so nothing was done.
    Duplicate,

    /// Registration stopped before reaching the host.
    Aborted,

    /// The host rejected the entry.
    Failed,
}

/// The outcome of registering one descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub key: String,
    pub status: Status,
    pub problems: Vec<Problem>,
    pub goal: Option<StoryGoal>,
}

impl Report {
    fn new(key: &str) -> Report {
        Report {
            key: key.to_string(),
            status: Status::Aborted,
            problems: vec![],
            goal: None,
        }
    }

    /// Returns `true` if a problem matching `predicate` was recorded.
    pub fn has_problem(&self, predicate: impl Fn(&Problem) -> bool) -> bool {
        self.problems.iter().any(predicate)
    }
}

/// The assets resolved for one descriptor.
struct ResolvedAssets {
    image: Option<SharedAsset>,
    popup: Option<SharedAsset>,
    sound: Option<SharedAsset>,
}

/// Registers descriptors with a host, using the plugin's shared state.
pub struct Registrar<'a> {
    host: &'a dyn Host,
    settings: &'a Settings,
    localization: &'a LocalizationStore,
    resolver: &'a Resolver,
    sounds: &'a SoundRegistry,
    keys: &'a KeyLedger,
}

impl<'a> Registrar<'a> {
    pub fn new(
        host: &'a dyn Host,
        settings: &'a Settings,
        localization: &'a LocalizationStore,
        resolver: &'a Resolver,
        sounds: &'a SoundRegistry,
        keys: &'a KeyLedger,
    ) -> Registrar<'a> {
        Registrar {
            host,
            settings,
            localization,
            resolver,
            sounds,
            keys,
        }
    }

    /// Registers `descriptor`, looking for its loose assets in `paths`.
    pub fn register(&self, descriptor: &Descriptor, paths: &SearchPaths) -> Report {
        let mut report = Report::new(descriptor.key());

        report.status = match self.run(descriptor, paths, &mut report) {
            Ok(status) => status,

            Err(problem) => {
                let status = match problem {
                    Problem::DuplicateRegistration { .. } => Status::Duplicate,
                    _ => Status::Aborted,
                };

                report.problems.push(problem);
                status
            }
        };

        report
    }

    /// Runs every step for `descriptor`. An `Err` stops registration of this descriptor.
    fn run(
        &self,
        descriptor: &Descriptor,
        paths: &SearchPaths,
        report: &mut Report,
    ) -> Result<Status, Problem> {
        // `Descriptor::parse` refuses descriptors without a key.
        let key = descriptor.key();

        if !self.keys.claim(key) {
            log::warn!("Entry '{}' has already been registered. Skipping.", key);
            return Err(Problem::DuplicateRegistration { id: key.to_string() });
        }

        log::info!(
            "Registering {} entry: {} under path {}",
            descriptor.kind(),
            key,
            descriptor.path()
        );

        self.localize(descriptor);

        let assets = self.resolve_assets(descriptor, paths, report)?;

        let sound = match descriptor {
            Descriptor::AudioLog(entry) => self.register_sound(entry, assets.sound.clone(), report),
            Descriptor::Pda(_) => None,
        };

        report.goal = self.register_goal(descriptor, report);

        Ok(self.register_entry(descriptor, assets, sound, report))
    }

    /// Step 1: puts the title, description and path labels into the localization store.
    fn localize(&self, descriptor: &Descriptor) {
        let key = descriptor.key();

        self.localization.set(title_key(key), descriptor.title());
        self.localization
            .set(description_key(key), descriptor.description());

        if let Descriptor::Pda(entry) = descriptor {
            for (label_key, label) in path_labels(&entry.path) {
                self.localization.add_path_label_if_absent(&label_key, &label);
            }
        }
    }

    /// Step 2: resolves every asset the descriptor refers to.
    fn resolve_assets(
        &self,
        descriptor: &Descriptor,
        paths: &SearchPaths,
        report: &mut Report,
    ) -> Result<ResolvedAssets, Problem> {
        let strategy = descriptor.strategy(&paths.bundle_dir);

        if let Err(problem) = self.resolver.prepare(&strategy) {
            log::error!("{} Registration of '{}' aborted.", problem, descriptor.key());
            return Err(problem);
        }

        let mut assets = ResolvedAssets {
            image: self.resolve_optional(
                &strategy,
                descriptor.image(),
                AssetKind::Image,
                &paths.images,
                "image",
                report,
            )?,

            popup: self.resolve_optional(
                &strategy,
                descriptor.popup_image(),
                AssetKind::Image,
                &paths.images,
                "popup image",
                report,
            )?,

            sound: None,
        };

        if let Descriptor::AudioLog(entry) = descriptor {
            assets.sound = self.resolve_optional(
                &strategy,
                entry.sound_key(),
                AssetKind::Audio,
                &paths.sounds,
                "sound",
                report,
            )?;
        }

        Ok(assets)
    }

    /// Resolves a single optional asset. Only a failure to load the bundle is returned as an
    /// error; anything else leaves the asset absent and is recorded in `report`.
    fn resolve_optional(
        &self,
        strategy: &Strategy,
        asset_key: &str,
        kind: AssetKind,
        candidates: &[PathBuf],
        role: &str,
        report: &mut Report,
    ) -> Result<Option<SharedAsset>, Problem> {
        if asset_key.trim().is_empty() {
            log::debug!("No {} given for '{}'", role, report.key);
            return Ok(None);
        }

        match self.resolver.resolve(strategy, asset_key, kind, candidates) {
            Ok(Resolution::Found(asset)) => Ok(Some(asset)),

            Ok(Resolution::NotFound) => {
                let problem = Problem::MissingFile {
                    key: asset_key.to_string(),
                    extension: kind.extension(),
                };

                log::warn!("Failed to load {} for '{}': {}", role, report.key, problem);
                report.problems.push(problem);

                Ok(None)
            }

            Err(problem @ Problem::ArchiveLoadFailure { .. }) => Err(problem),

            Err(problem) => {
                log::warn!("Failed to load {} for '{}': {}", role, report.key, problem);
                report.problems.push(problem);

                Ok(None)
            }
        }
    }

    /// Step 3: registers an audio log's sound and subtitle.
    fn register_sound(
        &self,
        entry: &AudioLogEntry,
        clip: Option<SharedAsset>,
        report: &mut Report,
    ) -> Option<RegisteredSound> {
        let sound_id = entry.sound_id();

        let sound = match clip {
            Some(clip) => {
                match self
                    .sounds
                    .register(self.host, &sound_id, clip, &self.settings.voice_bus)
                {
                    Ok(SoundOutcome::Registered(sound)) => {
                        log::info!("Sound registered with ID: {}", sound_id);
                        Some(sound)
                    }

                    Ok(SoundOutcome::AlreadyRegistered(sound)) => Some(sound),

                    Err(problem) => {
                        log::error!("Unable to register sound for {}: {}", entry.key, problem);
                        report.problems.push(problem);
                        None
                    }
                }
            }

            // Another descriptor may already have registered a sound under this id.
            None => self.sounds.get(&sound_id),
        };

        if sound.is_some() && !self.localization.has(&sound_id) {
            self.localization.set(sound_id.as_str(), entry.description.as_str());
            log::info!("Subtitle for {} set: {}", sound_id, entry.description);
        }

        sound
    }

    /// Step 4: validates the tech type and registers the story goal.
    fn register_goal(&self, descriptor: &Descriptor, report: &mut Report) -> Option<StoryGoal> {
        let key = descriptor.key();
        let name = descriptor.tech_type().trim();

        let tech_type = match name.parse::<TechType>() {
            Ok(tech_type) => tech_type,

            Err(_) => {
                let problem = Problem::InvalidTechType {
                    key: key.to_string(),
                    name: name.to_string(),
                };

                log::error!(
                    "{}. Please ensure the TechType is correct in the JSON. The entry will still \
                     be registered, but without a story goal.",
                    problem
                );

                report.problems.push(problem);
                return None;
            }
        };

        let goal = match descriptor {
            Descriptor::Pda(_) => StoryGoal {
                key: key.to_string(),
                goal_type: GoalType::Encyclopedia,
                tech_type,
                delay: self.settings.encyclopedia_goal_delay,
            },

            Descriptor::AudioLog(_) => StoryGoal {
                key: key.to_string(),
                goal_type: GoalType::Pda,
                tech_type,
                delay: self.settings.audio_log_goal_delay,
            },
        };

        match self.host.register_item_goal(&goal) {
            Ok(()) => {
                log::info!("Story goal for {} registered with TechType: {}", key, tech_type);
                Some(goal)
            }

            Err(err) => {
                let problem = Problem::HostRegistrationFailure {
                    key: key.to_string(),
                    action: "register story goal",
                    reason: format!("{:#}", err),
                };

                log::error!("{}", problem);
                report.problems.push(problem);
                None
            }
        }
    }

    /// Step 5: hands the finished entry to the host.
    fn register_entry(
        &self,
        descriptor: &Descriptor,
        assets: ResolvedAssets,
        sound: Option<RegisteredSound>,
        report: &mut Report,
    ) -> Status {
        let key = descriptor.key();
        let mut status = Status::Registered;

        if let Some(sound) = &sound {
            let log_entry = LogEntry {
                key: key.to_string(),
                subtitle: descriptor.description().to_string(),
                sound: sound.clone(),
                icon: assets.popup.clone(),
            };

            match self.host.add_log_entry(&log_entry) {
                Ok(()) => log::info!("Log entry for {} added to PDA.", key),

                Err(err) => {
                    let problem = Problem::HostRegistrationFailure {
                        key: key.to_string(),
                        action: "add log entry",
                        reason: format!("{:#}", err),
                    };

                    log::error!("{}", problem);
                    report.problems.push(problem);
                    status = Status::Failed;
                }
            }
        }

        let entry = EncyclopediaEntry {
            key: key.to_string(),
            path: descriptor.path().to_string(),
            title: self.localization.get(&title_key(key)),
            description: self.localization.get(&description_key(key)),
            image: assets.image,
            popup: assets.popup,
            sound,
        };

        match self.host.add_encyclopedia_entry(&entry) {
            Ok(()) => log::info!("Encyclopedia entry for {} successfully registered.", key),

            Err(err) => {
                let problem = Problem::HostRegistrationFailure {
                    key: key.to_string(),
                    action: "add encyclopedia entry",
                    reason: format!("{:#}", err),
                };

                log::error!("Error registering entry {}: {}", key, problem);
                report.problems.push(problem);
                status = Status::Failed;
            }
        }

        status
    }
}

//! Finds descriptor files on disk and feeds them to the registrar.

use std::path::{Path, PathBuf};

use eyre::{Context, Result};

use crate::{
    descriptor::{Descriptor, DescriptorKind},
    problem::Problem,
    registrar::{Registrar, Report, SearchPaths, Status},
    settings::Settings,
};

/*
    <plugin>
      Assets
        EncyclopediaData
          PDA           Our PDA entry descriptors.
          AudioLogs     Our audio log descriptors.
        AudioAssets     Loose sounds, searched before anything else.
        x.bundle        Bundles named by descriptors that don't use fallback loading.

    <mod>
      Assets
        PDA             A mod's PDA entry descriptors.
        VoiceLogs       A mod's audio log descriptors.
        x.bundle

    Loose images and sounds sit next to the descriptors that use them.
*/

/// A folder tree that holds descriptors and the assets they use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRoot {
    /// Shown in log messages.
    pub name: String,

    pub pda_dir: PathBuf,
    pub audio_log_dirs: Vec<PathBuf>,

    /// Where bundle names are looked up.
    pub bundle_dir: PathBuf,

    /// Loose-asset folders searched before the descriptor folders.
    pub extra_asset_dirs: Vec<PathBuf>,
}

impl ContentRoot {
    /// The plugin's own content.
    pub fn primary(settings: &Settings) -> ContentRoot {
        let data_dir = settings.data_dir();

        ContentRoot {
            name: "PDAssist".to_string(),
            pda_dir: data_dir.join(&settings.layout.pda_folder),
            audio_log_dirs: settings
                .layout
                .audio_log_folders
                .iter()
                .map(|folder| data_dir.join(folder))
                .collect(),
            bundle_dir: settings.bundle_dir(),
            extra_asset_dirs: vec![settings.audio_assets_dir()],
        }
    }

    /// Content shipped by another mod installed at `mod_dir`.
    pub fn for_mod(mod_dir: &Path, settings: &Settings) -> ContentRoot {
        let assets_dir = mod_dir.join("Assets");

        ContentRoot {
            name: mod_dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| mod_dir.display().to_string()),
            pda_dir: assets_dir.join(&settings.layout.pda_folder),
            audio_log_dirs: settings
                .layout
                .mod_audio_log_folders
                .iter()
                .map(|folder| assets_dir.join(folder))
                .collect(),
            bundle_dir: assets_dir,
            extra_asset_dirs: vec![],
        }
    }

    /// Every descriptor folder, with the kind of descriptor it holds. PDA entries come first.
    pub fn categories(&self) -> Vec<(DescriptorKind, &Path)> {
        std::iter::once((DescriptorKind::Pda, self.pda_dir.as_path()))
            .chain(
                self.audio_log_dirs
                    .iter()
                    .map(|dir| (DescriptorKind::AudioLog, dir.as_path())),
            )
            .collect()
    }

    /// The descriptor folders of this root, in search order.
    fn descriptor_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.pda_dir).chain(self.audio_log_dirs.iter())
    }

    /// Works out where loose assets for this root's descriptors are searched for. Folders of
    /// `mod_roots` come after our own.
    pub fn search_paths(&self, mod_roots: &[ContentRoot]) -> SearchPaths {
        let mut dirs: Vec<PathBuf> = self
            .extra_asset_dirs
            .iter()
            .chain(self.descriptor_dirs())
            .cloned()
            .collect();

        for root in mod_roots {
            for dir in root.descriptor_dirs() {
                if !dirs.contains(dir) {
                    dirs.push(dir.clone());
                }
            }
        }

        SearchPaths {
            images: dirs.clone(),
            sounds: dirs,
            bundle_dir: self.bundle_dir.clone(),
        }
    }
}

/// Lists the `.json` files directly inside `dir`.
pub fn list_descriptor_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = vec![];

    for entry in std::fs::read_dir(dir).wrap_err_with(|| format!("listing {:?}", dir))? {
        let entry = match entry {
            Ok(entry) => entry,

            Err(err) => {
                log::error!("Error reading entry from {:?}: {}", dir, err);
                continue;
            }
        };

        let path = entry.path();

        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        if is_json && path.is_file() {
            files.push(path);
        }
    }

    // The file system gives no order guarantee. Sorting keeps log output stable between runs.
    files.sort();

    Ok(files)
}

/// Reads and parses the descriptor at `path`.
pub fn read_descriptor(kind: DescriptorKind, path: &Path) -> Result<Descriptor, Problem> {
    let malformed = |reason: String| Problem::MalformedDescriptor {
        path: path.to_path_buf(),
        reason,
    };

    let json = std::fs::read_to_string(path).map_err(|err| malformed(err.to_string()))?;
    Descriptor::parse(kind, &json).map_err(|err| malformed(format!("{:#}", err)))
}

/// Totals for one load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoadSummary {
    pub registered: usize,
    pub duplicate: usize,
    pub failed: usize,
    pub aborted: usize,

    /// Descriptor files that couldn't be read or parsed.
    pub skipped_files: usize,

    /// Everything that went wrong, in the order it happened.
    pub problems: Vec<Problem>,
}

impl LoadSummary {
    fn record(&mut self, report: Report) {
        match report.status {
            Status::Registered => self.registered += 1,
            Status::Duplicate => self.duplicate += 1,
            Status::Failed => self.failed += 1,
            Status::Aborted => self.aborted += 1,
        }

        self.problems.extend(report.problems);
    }

    fn skip(&mut self, problem: Problem) {
        self.skipped_files += 1;
        self.problems.push(problem);
    }

    /// The number of descriptors that were attempted.
    pub fn attempted(&self) -> usize {
        self.registered + self.duplicate + self.failed + self.aborted
    }
}

/// Registers every descriptor of `kind` in `dir`.
pub fn load_category(
    registrar: &Registrar,
    kind: DescriptorKind,
    dir: &Path,
    paths: &SearchPaths,
    summary: &mut LoadSummary,
) {
    let files = match list_descriptor_files(dir) {
        Ok(files) => files,

        Err(err) => {
            log::warn!("Unable to load {} entries: {:#}", kind, err);
            return;
        }
    };

    if files.is_empty() {
        log::warn!("No {} entries found in {:?}", kind, dir);
        return;
    }

    log::info!("Loading {} {} entries from {:?}", files.len(), kind, dir);

    for path in files {
        match read_descriptor(kind, &path) {
            Ok(descriptor) => summary.record(registrar.register(&descriptor, paths)),

            Err(problem) => {
                log::error!("{}", problem);
                summary.skip(problem);
            }
        }
    }
}

/// Registers everything in `root`, PDA entries first. `mod_roots` add folders to the asset search.
pub fn load_root(
    registrar: &Registrar,
    root: &ContentRoot,
    mod_roots: &[ContentRoot],
    summary: &mut LoadSummary,
) {
    log::info!("Loading content from {}", root.name);

    let paths = root.search_paths(mod_roots);

    for (kind, dir) in root.categories() {
        load_category(registrar, kind, dir, &paths, summary);
    }
}

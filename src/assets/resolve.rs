//! Finding assets, either as loose files or inside bundles.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use eyre::Context;

use super::{
    bundle::AssetBundle, AssetCache, AssetKind, AssetReference, AssetSource, SharedAsset,
};
use crate::problem::Problem;

/// The result of looking for an asset. Not finding one is a normal outcome: assets are optional,
/// and callers carry on without them.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Found(SharedAsset),
    NotFound,
}

impl Resolution {
    pub fn found(self) -> Option<SharedAsset> {
        match self {
            Resolution::Found(asset) => Some(asset),
            Resolution::NotFound => None,
        }
    }
}

/// Where a descriptor's assets should be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Loose files in the candidate directories.
    Fallback,

    /// Entries inside the bundle at this path.
    Archive(PathBuf),
}

/// Searches `candidates` in order for `key` with `kind`'s extension, decoding the first file
/// found. Later directories are not consulted once a file exists, even if it fails to decode.
pub fn find_first(key: &str, kind: AssetKind, candidates: &[PathBuf]) -> Result<Resolution, Problem> {
    let file_name = kind.file_name(key);

    let path = match candidates
        .iter()
        .map(|dir| dir.join(&file_name))
        .find(|path| path.is_file())
    {
        Some(path) => path,
        None => return Ok(Resolution::NotFound),
    };

    let decoded = std::fs::read(&path)
        .wrap_err("failed to read file")
        .and_then(|bytes| kind.decode(key, bytes));

    match decoded {
        Ok(asset) => {
            log::debug!("Loaded '{}' from {:?}", file_name, path);

            Ok(Resolution::Found(Arc::new(AssetReference {
                asset,
                source: AssetSource::File(path),
            })))
        }

        Err(err) => Err(Problem::DecodeFailure {
            key: key.to_string(),
            source_desc: AssetSource::File(path).to_string(),
            reason: format!("{:#}", err),
        }),
    }
}

/// Resolves assets with either strategy. Loose files go through the shared [`AssetCache`];
/// bundles are opened once and kept open for the rest of the run.
pub struct Resolver {
    cache: AssetCache,
    bundles: Mutex<HashMap<PathBuf, AssetBundle>>,
}

impl Resolver {
    pub fn new() -> Resolver {
        Resolver {
            cache: AssetCache::new(),
            bundles: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &AssetCache {
        &self.cache
    }

    /// Makes sure everything `strategy` needs is available. For the archive strategy this opens
    /// the bundle, and failing to do so is the one hard failure resolution can produce.
    pub fn prepare(&self, strategy: &Strategy) -> Result<(), Problem> {
        match strategy {
            Strategy::Fallback => Ok(()),
            Strategy::Archive(path) => self.with_bundle(path, |_| ()),
        }
    }

    /// Looks for `key` using `strategy`. `candidates` are only used by the fallback strategy.
    pub fn resolve(
        &self,
        strategy: &Strategy,
        key: &str,
        kind: AssetKind,
        candidates: &[PathBuf],
    ) -> Result<Resolution, Problem> {
        if key.trim().is_empty() {
            return Ok(Resolution::NotFound);
        }

        match strategy {
            Strategy::Fallback => self.cache.get_or_resolve(key, kind, candidates),
            Strategy::Archive(path) => self.resolve_in_bundle(path, key, kind),
        }
    }

    fn resolve_in_bundle(
        &self,
        bundle_path: &Path,
        key: &str,
        kind: AssetKind,
    ) -> Result<Resolution, Problem> {
        let entry = kind.file_name(key);

        let read = self.with_bundle(bundle_path, |bundle| bundle.read(&entry))?;

        let source = AssetSource::Bundle {
            bundle: bundle_path.to_path_buf(),
            entry: entry.clone(),
        };

        let bytes = match read {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Ok(Resolution::NotFound),

            Err(err) => {
                return Err(Problem::DecodeFailure {
                    key: key.to_string(),
                    source_desc: source.to_string(),
                    reason: format!("{:#}", err),
                })
            }
        };

        match kind.decode(key, bytes) {
            Ok(asset) => Ok(Resolution::Found(Arc::new(AssetReference { asset, source }))),

            Err(err) => Err(Problem::DecodeFailure {
                key: key.to_string(),
                source_desc: source.to_string(),
                reason: format!("{:#}", err),
            }),
        }
    }

    /// Runs `action` on the bundle at `path`, opening it first if this is the first use.
    fn with_bundle<T>(
        &self,
        path: &Path,
        action: impl FnOnce(&mut AssetBundle) -> T,
    ) -> Result<T, Problem> {
        let mut bundles = self.bundles.lock().unwrap_or_else(|poison| poison.into_inner());

        if !bundles.contains_key(path) {
            let bundle = AssetBundle::open(path).map_err(|err| Problem::ArchiveLoadFailure {
                bundle: path.to_path_buf(),
                reason: format!("{:#}", err),
            })?;

            log::info!("Opened bundle {:?} ({} entries)", path, bundle.len());
            bundles.insert(path.to_path_buf(), bundle);
        }

        // The bundle was either already present or has just been inserted.
        match bundles.get_mut(path) {
            Some(bundle) => Ok(action(bundle)),
            None => Err(Problem::ArchiveLoadFailure {
                bundle: path.to_path_buf(),
                reason: "bundle vanished from the open set".to_string(),
            }),
        }
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Resolver::new()
    }
}

//! Memoisation of loose-file assets.

use std::{path::PathBuf, sync::Mutex};

use cached::{Cached, UnboundCache};

use super::{resolve, AssetKind, Resolution, SharedAsset};
use crate::problem::Problem;

/// Remembers every loose-file asset that has been resolved, keyed by file name (key plus
/// extension). Assets don't change while the game is running, so nothing is ever evicted.
///
/// Only successful lookups are stored. A miss is retried the next time it's requested, because a
/// later caller may offer different candidate directories.
pub struct AssetCache {
    store: Mutex<UnboundCache<String, SharedAsset>>,
}

impl AssetCache {
    pub fn new() -> AssetCache {
        AssetCache {
            store: Mutex::new(UnboundCache::new()),
        }
    }

    fn cache_key(key: &str, kind: AssetKind) -> String {
        kind.file_name(key)
    }

    /// Returns the cached asset for `key`, if there is one. Never touches the disk.
    pub fn get(&self, key: &str, kind: AssetKind) -> Option<SharedAsset> {
        let mut store = self.store.lock().unwrap_or_else(|poison| poison.into_inner());
        store.cache_get(&Self::cache_key(key, kind)).cloned()
    }

    /// Returns the cached asset for `key` or searches `candidates` for it, caching the result if
    /// it's found.
    pub fn get_or_resolve(
        &self,
        key: &str,
        kind: AssetKind,
        candidates: &[PathBuf],
    ) -> Result<Resolution, Problem> {
        if let Some(asset) = self.get(key, kind) {
            log::debug!("Cache hit for '{}'", Self::cache_key(key, kind));
            return Ok(Resolution::Found(asset));
        }

        let resolution = resolve::find_first(key, kind, candidates)?;

        if let Resolution::Found(asset) = &resolution {
            let mut store = self.store.lock().unwrap_or_else(|poison| poison.into_inner());
            store.cache_set(Self::cache_key(key, kind), asset.clone());
        }

        Ok(resolution)
    }

    /// The number of assets held.
    pub fn len(&self) -> usize {
        self.store
            .lock()
            .unwrap_or_else(|poison| poison.into_inner())
            .cache_size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for AssetCache {
    fn default() -> Self {
        AssetCache::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::png;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn second_lookup_does_not_touch_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("badge.png");
        std::fs::write(&path, png::header_bytes(4, 4)).unwrap();

        let cache = AssetCache::new();
        let candidates = vec![dir.path().to_path_buf()];

        let first = match cache.get_or_resolve("badge", AssetKind::Image, &candidates).unwrap() {
            Resolution::Found(asset) => asset,
            Resolution::NotFound => panic!("asset should have been found"),
        };

        // With the file gone, only the cache can answer.
        std::fs::remove_file(&path).unwrap();

        let second = match cache.get_or_resolve("badge", AssetKind::Image, &candidates).unwrap() {
            Resolution::Found(asset) => asset,
            Resolution::NotFound => panic!("asset should have been cached"),
        };

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn misses_are_not_remembered() {
        let dir = TempDir::new().unwrap();
        let cache = AssetCache::new();
        let candidates = vec![dir.path().to_path_buf()];

        assert_eq!(
            cache.get_or_resolve("late", AssetKind::Image, &candidates).unwrap(),
            Resolution::NotFound
        );

        std::fs::write(dir.path().join("late.png"), png::header_bytes(1, 1)).unwrap();

        assert!(matches!(
            cache.get_or_resolve("late", AssetKind::Image, &candidates).unwrap(),
            Resolution::Found(_)
        ));
    }

    #[test]
    fn kinds_are_cached_separately() {
        let cache = AssetCache::new();
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("log.png"), png::header_bytes(2, 2)).unwrap();

        let candidates = vec![dir.path().to_path_buf()];
        cache.get_or_resolve("log", AssetKind::Image, &candidates).unwrap();

        assert!(cache.get("log", AssetKind::Image).is_some());
        assert!(cache.get("log", AssetKind::Audio).is_none());
    }
}

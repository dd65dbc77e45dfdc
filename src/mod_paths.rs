//! Folders that other mods contribute content from.

use std::{
    path::{Path, PathBuf},
    sync::RwLock,
};

/// Mod folders registered by third-party mods. Each folder is searched for loose assets and has
/// its own descriptors loaded, using the same `Assets/PDA` and `Assets/VoiceLogs` layout as ours.
///
/// Paths are only ever added, and each one is only kept once.
#[derive(Default)]
pub struct ModPathRegistry {
    paths: RwLock<Vec<PathBuf>>,
}

impl ModPathRegistry {
    pub fn new() -> ModPathRegistry {
        ModPathRegistry::default()
    }

    /// Registers the mod folder at `path`. Returns `false` if the folder doesn't exist or was
    /// already registered.
    pub fn register(&self, path: impl AsRef<Path>) -> bool {
        let path = path.as_ref();

        if path.as_os_str().is_empty() || !path.is_dir() {
            log::warn!("Invalid or non-existent mod path: {:?}", path);
            return false;
        }

        let mut paths = self.paths.write().unwrap_or_else(|poison| poison.into_inner());

        if paths.iter().any(|existing| existing == path) {
            log::debug!("Mod path {:?} is already registered", path);
            return false;
        }

        paths.push(path.to_path_buf());
        log::info!("Registered mod path: {:?}", path);

        true
    }

    /// Returns a copy of the registered paths, in registration order.
    pub fn list(&self) -> Vec<PathBuf> {
        self.paths
            .read()
            .unwrap_or_else(|poison| poison.into_inner())
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn registers_existing_folders_once() {
        let dir = TempDir::new().unwrap();
        let registry = ModPathRegistry::new();

        assert!(registry.register(dir.path()));
        assert!(!registry.register(dir.path()));
        assert_eq!(registry.list(), vec![dir.path().to_path_buf()]);
    }

    #[test]
    fn refuses_missing_folders_and_files() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("readme.txt");
        std::fs::write(&file, "hi").unwrap();

        let registry = ModPathRegistry::new();

        assert!(!registry.register(dir.path().join("absent")));
        assert!(!registry.register(&file));
        assert!(!registry.register(""));
        assert!(registry.list().is_empty());
    }

    #[test]
    fn list_is_a_copy() {
        let first = TempDir::new().unwrap();
        let second = TempDir::new().unwrap();
        let registry = ModPathRegistry::new();
        registry.register(first.path());

        let snapshot = registry.list();
        registry.register(second.path());

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.list().len(), 2);
    }
}

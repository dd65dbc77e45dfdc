//! Soft dependencies: other mods our content is written to work alongside.
//!
//! Missing soft dependencies never stop loading. They're only reported, so that anyone reading the
//! log knows why some content might not behave as intended.

use std::path::Path;

use eyre::{Context, Result};

use crate::{descriptor::SoftDependencyList, host::Host, loader};

/// What was found for one listed mod.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyStatus {
    pub id: String,
    pub loaded: bool,
}

fn read_manifest(path: &Path) -> Result<SoftDependencyList> {
    let json = std::fs::read_to_string(path).wrap_err("failed to read file")?;
    serde_json::from_str(&json).wrap_err("failed to parse file")
}

/// Checks every manifest in `dir` against the plugins the host has loaded.
pub fn check(host: &dyn Host, dir: &Path) -> Vec<DependencyStatus> {
    let files = match loader::list_descriptor_files(dir) {
        Ok(files) => files,

        Err(err) => {
            log::warn!("Soft dependency folder could not be read: {:#}", err);
            return vec![];
        }
    };

    let mut statuses = vec![];

    for path in files {
        let manifest = match read_manifest(&path) {
            Ok(manifest) => manifest,

            Err(err) => {
                log::error!("Error reading soft dependency file {:?}: {:#}", path, err);
                continue;
            }
        };

        for id in manifest.mods {
            let loaded = host.is_plugin_loaded(&id);

            if loaded {
                log::info!("Soft dependency {} is loaded.", id);
            } else {
                log::warn!(
                    "Soft dependency {} is not loaded. Some content may not work as intended.",
                    id
                );
            }

            statuses.push(DependencyStatus { id, loaded });
        }
    }

    statuses
}

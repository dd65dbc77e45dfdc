//! The JSON files that describe content.
//!
//! There are two kinds of descriptor: PDA entries, which become encyclopedia entries, and audio
//! logs, which also carry a sound. Which kind a file holds is decided by the folder it's found in,
//! once, when it's parsed.
//!
//! Every field is optional in the JSON and defaults to empty (or `false`), apart from `key`,
//! which must be present and non-empty.

use eyre::{eyre, Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt::Display,
    path::Path,
};

use crate::assets::Strategy;

/// An encyclopedia entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PdaEntry {
    pub key: String,

    /// Slash-separated databank location, such as `"Lifeforms/Fauna/Leviathans"`.
    pub path: String,

    pub title: String,
    pub description: String,

    /// The large image shown with the entry.
    pub image: String,

    /// The small image shown in the unlock notification.
    #[serde(rename = "popupImage")]
    pub popup_image: String,

    #[serde(rename = "techType")]
    pub tech_type: String,

    #[serde(rename = "bundlename")]
    pub bundle_name: String,

    #[serde(rename = "usefallback")]
    pub use_fallback: bool,
}

/// A PDA audio log, which is also listed in the encyclopedia.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioLogEntry {
    pub key: String,
    pub path: String,
    pub title: String,

    /// Used both as the entry description and as the subtitle for the sound.
    pub description: String,

    pub image: String,

    #[serde(rename = "popupImage")]
    pub popup_image: String,

    #[serde(rename = "techType")]
    pub tech_type: String,

    /// Overrides the sound id. If empty, `"{key}AudioLog"` is used.
    #[serde(rename = "soundid")]
    pub sound_id: String,

    /// The sound asset, with or without its `.wav` extension.
    #[serde(rename = "soundname")]
    pub sound_name: String,

    #[serde(rename = "bundlename")]
    pub bundle_name: String,

    #[serde(rename = "usefallback")]
    pub use_fallback: bool,
}

impl AudioLogEntry {
    /// The id the sound is registered under.
    pub fn sound_id(&self) -> String {
        if self.sound_id.trim().is_empty() {
            format!("{}AudioLog", self.key)
        } else {
            self.sound_id.clone()
        }
    }

    /// The sound asset key, without any `.wav` extension.
    pub fn sound_key(&self) -> &str {
        let name = self.sound_name.trim();

        match name.len().checked_sub(4) {
            Some(stem_len)
                if name.is_char_boundary(stem_len)
                    && name[stem_len..].eq_ignore_ascii_case(".wav") =>
            {
                &name[..stem_len]
            }
            _ => name,
        }
    }
}

/// Which kind of descriptor a file holds.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum DescriptorKind {
    Pda,
    AudioLog,
}

impl Display for DescriptorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DescriptorKind::Pda => write!(f, "PDA"),
            DescriptorKind::AudioLog => write!(f, "audio log"),
        }
    }
}

/// A parsed descriptor of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Descriptor {
    Pda(PdaEntry),
    AudioLog(AudioLogEntry),
}

impl Descriptor {
    /// Parses `json` as a descriptor of `kind`.
    pub fn parse(kind: DescriptorKind, json: &str) -> Result<Descriptor> {
        let descriptor = match kind {
            DescriptorKind::Pda => {
                Descriptor::Pda(serde_json::from_str(json).wrap_err("invalid PDA entry")?)
            }

            DescriptorKind::AudioLog => {
                Descriptor::AudioLog(serde_json::from_str(json).wrap_err("invalid audio log")?)
            }
        };

        if descriptor.key().trim().is_empty() {
            return Err(eyre!("descriptor has no key"));
        }

        Ok(descriptor)
    }

    pub fn kind(&self) -> DescriptorKind {
        match self {
            Descriptor::Pda(_) => DescriptorKind::Pda,
            Descriptor::AudioLog(_) => DescriptorKind::AudioLog,
        }
    }

    pub fn key(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.key,
            Descriptor::AudioLog(entry) => &entry.key,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.path,
            Descriptor::AudioLog(entry) => &entry.path,
        }
    }

    pub fn title(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.title,
            Descriptor::AudioLog(entry) => &entry.title,
        }
    }

    pub fn description(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.description,
            Descriptor::AudioLog(entry) => &entry.description,
        }
    }

    pub fn image(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.image,
            Descriptor::AudioLog(entry) => &entry.image,
        }
    }

    pub fn popup_image(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.popup_image,
            Descriptor::AudioLog(entry) => &entry.popup_image,
        }
    }

    pub fn tech_type(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.tech_type,
            Descriptor::AudioLog(entry) => &entry.tech_type,
        }
    }

    fn bundle_name(&self) -> &str {
        match self {
            Descriptor::Pda(entry) => &entry.bundle_name,
            Descriptor::AudioLog(entry) => &entry.bundle_name,
        }
    }

    fn use_fallback(&self) -> bool {
        match self {
            Descriptor::Pda(entry) => entry.use_fallback,
            Descriptor::AudioLog(entry) => entry.use_fallback,
        }
    }

    /// Returns how this descriptor's assets should be loaded. Bundle names are relative to
    /// `bundle_dir`.
    pub fn strategy(&self, bundle_dir: &Path) -> Strategy {
        if self.use_fallback() {
            Strategy::Fallback
        } else {
            Strategy::Archive(bundle_dir.join(self.bundle_name()))
        }
    }
}

/// A soft-dependency manifest: mods that our content works best with, but doesn't need.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SoftDependencyList {
    #[serde(rename = "Mods", default)]
    pub mods: Vec<String>,
}

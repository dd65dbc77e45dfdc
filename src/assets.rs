//! Loading of the images and sounds that descriptors refer to.
//!
//! Assets come either from loose files in a list of candidate directories or from a packed
//! archive bundle. Whichever way they're found, the decoded result is wrapped in an
//! [`AssetReference`] that remembers where it came from and is shared by every consumer.

pub mod bundle;
pub mod cache;
pub mod png;
pub mod resolve;
pub mod wav;

use std::{
    fmt::Display,
    path::{Path, PathBuf},
    sync::Arc,
};

use eyre::Result;

pub use cache::AssetCache;
pub use png::Image;
pub use resolve::{Resolution, Resolver, Strategy};
pub use wav::AudioClip;

/// The two kinds of artifact that can be requested. The kind decides both the file extension that
/// is searched for and the decoder that is used; file contents are never sniffed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum AssetKind {
    Image,
    Audio,
}

impl AssetKind {
    /// The extension (without a dot) that files of this kind use.
    pub fn extension(self) -> &'static str {
        match self {
            AssetKind::Image => "png",
            AssetKind::Audio => "wav",
        }
    }

    /// Returns the file name that an asset with `key` would have.
    pub fn file_name(self, key: &str) -> String {
        format!("{}.{}", key, self.extension())
    }

    /// Decodes `bytes` as this kind of asset. `name` is only used for labelling the result.
    pub fn decode(self, name: &str, bytes: Vec<u8>) -> Result<Asset> {
        Ok(match self {
            AssetKind::Image => Asset::Image(Image::decode(name, bytes)?),
            AssetKind::Audio => Asset::Audio(AudioClip::decode(name, &bytes)?),
        })
    }
}

/// A decoded asset.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    Image(Image),
    Audio(AudioClip),
}

impl Asset {
    pub fn as_image(&self) -> Option<&Image> {
        match self {
            Asset::Image(image) => Some(image),
            Asset::Audio(_) => None,
        }
    }

    pub fn as_audio(&self) -> Option<&AudioClip> {
        match self {
            Asset::Audio(clip) => Some(clip),
            Asset::Image(_) => None,
        }
    }
}

/// Where an asset was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetSource {
    /// A loose file on disk.
    File(PathBuf),

    /// An entry inside an archive bundle.
    Bundle { bundle: PathBuf, entry: String },
}

impl Display for AssetSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetSource::File(path) => write!(f, "file {:?}", path),
            AssetSource::Bundle { bundle, entry } => {
                write!(f, "entry \"{}\" of bundle {:?}", entry, bundle)
            }
        }
    }
}

/// A decoded asset paired with the place it was found.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetReference {
    pub asset: Asset,
    pub source: AssetSource,
}

impl AssetReference {
    pub fn image(&self) -> Option<&Image> {
        self.asset.as_image()
    }

    pub fn audio(&self) -> Option<&AudioClip> {
        self.asset.as_audio()
    }

    /// Returns the loose-file path this asset came from, if it didn't come from a bundle.
    pub fn file_path(&self) -> Option<&Path> {
        match &self.source {
            AssetSource::File(path) => Some(path),
            AssetSource::Bundle { .. } => None,
        }
    }
}

/// Shared handle to a resolved asset.
pub type SharedAsset = Arc<AssetReference>;

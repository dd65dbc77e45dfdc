//! Packed asset bundles.
//!
//! A bundle is a single file holding many assets. It starts with an index that maps entry names
//! to regions of the file, followed by the raw entry data:
//!
//! ```text
//! "PDAB"              magic
//! u32                 entry count
//! entry * count       u32 offset, u32 size, u16 name length, name bytes (UTF-8)
//! ...                 entry data, at the offsets given in the index
//! ```
//!
//! All integers are little-endian and offsets are measured from the start of the file.

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use case_insensitive_hashmap::CaseInsensitiveHashMap as UnicaseHashMap;
use eyre::{eyre, Context, Result};
use std::{
    fs::File,
    io::{BufReader, BufWriter, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

pub const MAGIC: &[u8; 4] = b"PDAB";

/// An area within a bundle file.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct BundleRegion {
    /// The offset of this region from the beginning of the file in bytes.
    offset: u32,

    /// The size of this region in bytes.
    size: u32,
}

/// Refers to an entry in a bundle's index.
struct BundleEntry {
    /// The name of this entry, including its extension.
    name: String,

    /// The area of the bundle file that contains this entry's data.
    region: BundleRegion,
}

impl BundleEntry {
    /// Reads a single index entry from `reader`.
    fn read(reader: &mut impl Read) -> Result<BundleEntry> {
        let offset = reader.read_u32::<LE>().wrap_err("offset")?;
        let size = reader.read_u32::<LE>().wrap_err("size")?;

        let name = String::from_utf8({
            let name_len = reader.read_u16::<LE>().wrap_err("name length")?;

            let mut name_bytes = vec![0u8; name_len as usize];
            reader.read_exact(&mut name_bytes).wrap_err("name")?;

            name_bytes
        })?;

        Ok(BundleEntry {
            name,
            region: BundleRegion { offset, size },
        })
    }

    /// Destructures the entry into its name and data region.
    fn into_pair(self) -> (String, BundleRegion) {
        (self.name, self.region)
    }
}

/// An open bundle file. Entry data is only read when it is asked for.
pub struct AssetBundle {
    path: PathBuf,

    /// The entries in this bundle, keyed by name.
    entries: UnicaseHashMap<BundleRegion>,

    file: File,
}

impl AssetBundle {
    /// Opens the bundle at `path` and reads its index.
    pub fn open(path: impl AsRef<Path>) -> Result<AssetBundle> {
        let path = path.as_ref();

        let file = File::open(path).wrap_err("failed to open bundle file")?;
        let file_len = file.metadata().wrap_err("failed to stat bundle file")?.len();

        // Use a buffered reader for the index because it's made of lots of small reads.
        let mut reader = BufReader::new(file.try_clone().wrap_err("failed to clone handle")?);

        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic).wrap_err("magic")?;

        if &magic != MAGIC {
            return Err(eyre!("not an asset bundle (bad magic {:?})", magic));
        }

        let entry_count = reader.read_u32::<LE>().wrap_err("entry count")?;
        let mut entries = Vec::with_capacity(entry_count.min(4096) as usize);

        for _ in 0..entry_count {
            let entry = BundleEntry::read(&mut reader).wrap_err("error reading index entry")?;

            if entry.region.offset as u64 + entry.region.size as u64 > file_len {
                return Err(eyre!(
                    "entry \"{}\" extends past the end of the bundle",
                    entry.name
                ));
            }

            entries.push(entry);
        }

        Ok(AssetBundle {
            path: path.to_path_buf(),
            entries: UnicaseHashMap::from_iter(entries.into_iter().map(BundleEntry::into_pair)),
            file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.entries.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the region holding the entry called `name`. Names are compared case-insensitively.
    pub fn region(&self, name: impl AsRef<str>) -> Option<BundleRegion> {
        self.entries.get(name.as_ref()).copied()
    }

    /// Reads the data of the entry called `name`, or returns `None` if there is no such entry.
    pub fn read(&mut self, name: impl AsRef<str>) -> Result<Option<Vec<u8>>> {
        let region = match self.region(name) {
            Some(region) => region,
            None => return Ok(None),
        };

        let mut buf = vec![0u8; region.size as usize];

        self.file
            .seek(SeekFrom::Start(region.offset as u64))
            .wrap_err("error while seeking")?;

        self.file
            .read_exact(&mut buf)
            .wrap_err("error while reading")?;

        Ok(Some(buf))
    }
}

/// Writes a bundle containing `entries` to `path`.
pub fn pack<'a>(
    path: impl AsRef<Path>,
    entries: impl IntoIterator<Item = (&'a str, &'a [u8])>,
) -> Result<()> {
    let entries: Vec<_> = entries.into_iter().collect();

    let index_len: usize = entries
        .iter()
        .map(|(name, _)| 4 + 4 + 2 + name.len())
        .sum();

    let mut offset = (MAGIC.len() + 4 + index_len) as u32;
    let mut writer = BufWriter::new(File::create(path).wrap_err("failed to create bundle")?);

    writer.write_all(MAGIC)?;
    writer.write_u32::<LE>(entries.len() as u32)?;

    for (name, data) in &entries {
        let name_len = u16::try_from(name.len())
            .map_err(|_| eyre!("entry name \"{}\" is too long", name))?;

        writer.write_u32::<LE>(offset)?;
        writer.write_u32::<LE>(data.len() as u32)?;
        writer.write_u16::<LE>(name_len)?;
        writer.write_all(name.as_bytes())?;

        offset += data.len() as u32;
    }

    for (_, data) in &entries {
        writer.write_all(data)?;
    }

    writer.flush().wrap_err("failed to flush bundle")
}

//! Reads enough of a PNG file to validate it and learn its dimensions.
//!
//! Pixel decoding is left to the host, which uploads the encoded bytes straight into a texture.

use std::io::{Cursor, Read};

use byteorder::{ReadBytesExt, BE};
use eyre::{eyre, Context, Result};

/// The eight bytes every PNG file starts with.
pub const SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// An encoded image along with the dimensions from its header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub name: String,
    pub width: u32,
    pub height: u32,

    /// The complete PNG file.
    pub data: Vec<u8>,
}

impl Image {
    /// Checks that `data` is a PNG file and reads its `IHDR` chunk.
    pub fn decode(name: impl Into<String>, data: Vec<u8>) -> Result<Image> {
        let mut reader = Cursor::new(data.as_slice());

        let mut signature = [0u8; 8];
        reader
            .read_exact(&mut signature)
            .wrap_err("file is too short for a PNG signature")?;

        if signature != SIGNATURE {
            return Err(eyre!("missing PNG signature"));
        }

        // The first chunk must be the image header.
        let chunk_len = reader.read_u32::<BE>().wrap_err("header chunk length")?;

        let mut chunk_type = [0u8; 4];
        reader
            .read_exact(&mut chunk_type)
            .wrap_err("header chunk type")?;

        if &chunk_type != b"IHDR" || chunk_len < 8 {
            return Err(eyre!("first chunk is not a valid IHDR chunk"));
        }

        let width = reader.read_u32::<BE>().wrap_err("image width")?;
        let height = reader.read_u32::<BE>().wrap_err("image height")?;

        if width == 0 || height == 0 {
            return Err(eyre!("image has zero area ({}x{})", width, height));
        }

        Ok(Image {
            name: name.into(),
            width,
            height,
            data,
        })
    }
}

/// Builds the smallest byte sequence [`Image::decode`] accepts. Used to generate fixtures.
#[cfg(test)]
pub fn header_bytes(width: u32, height: u32) -> Vec<u8> {
    let mut data = SIGNATURE.to_vec();
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());

    // Bit depth, colour type, compression, filter, interlace, then a CRC we never check.
    data.extend_from_slice(&[8, 6, 0, 0, 0]);
    data.extend_from_slice(&[0, 0, 0, 0]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dimensions() {
        let image = Image::decode("icon", header_bytes(256, 128)).unwrap();

        assert_eq!((image.width, image.height), (256, 128));
        assert_eq!(image.data.len(), 33);
    }

    #[test]
    fn rejects_other_formats() {
        assert!(Image::decode("jpeg", vec![0xff, 0xd8, 0xff, 0xe0, 0, 0, 0, 0, 0, 0]).is_err());
        assert!(Image::decode("empty", vec![]).is_err());
    }

    #[test]
    fn rejects_truncated_header() {
        let mut data = header_bytes(16, 16);
        data.truncate(20);

        assert!(Image::decode("cut", data).is_err());
    }

    #[test]
    fn rejects_zero_area() {
        assert!(Image::decode("flat", header_bytes(0, 10)).is_err());
    }
}

//! Minimal reader for 16-bit PCM WAV files.
//!
//! Only the canonical 44-byte header layout is understood: the channel count and sample rate are
//! read from their fixed offsets and everything after the header is taken to be little-endian
//! `i16` sample data. Files with extra chunks before `data` will decode with a little noise at the
//! start, which matches what the game's own loader does.

use std::io::Cursor;

use byteorder::{ReadBytesExt, WriteBytesExt, LE};
use eyre::{eyre, Context, Result};

/// Size of the canonical WAV header.
pub const HEADER_LEN: usize = 44;

const CHANNELS_OFFSET: u64 = 22;
const SAMPLE_RATE_OFFSET: u64 = 24;

/// Decoded PCM audio. Samples are interleaved and normalised to `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl AudioClip {
    /// Decodes the WAV file in `data`.
    pub fn decode(name: impl Into<String>, data: &[u8]) -> Result<AudioClip> {
        if data.len() < HEADER_LEN {
            return Err(eyre!(
                "WAV data is {} bytes long, shorter than the {} byte header",
                data.len(),
                HEADER_LEN
            ));
        }

        let mut reader = Cursor::new(data);

        reader.set_position(CHANNELS_OFFSET);
        let channels = reader.read_u16::<LE>().wrap_err("channel count")?;

        reader.set_position(SAMPLE_RATE_OFFSET);
        let sample_rate = reader.read_u32::<LE>().wrap_err("sample rate")?;

        if channels == 0 {
            return Err(eyre!("WAV header declares zero channels"));
        }

        // A trailing odd byte can't form a sample, so it's dropped.
        let payload = &data[HEADER_LEN..];
        let mut samples = Vec::with_capacity(payload.len() / 2);
        let mut reader = Cursor::new(payload);

        for _ in 0..payload.len() / 2 {
            let sample = reader.read_i16::<LE>().wrap_err("sample data")?;
            samples.push(sample as f32 / 32768.0);
        }

        Ok(AudioClip {
            name: name.into(),
            sample_rate,
            channels,
            samples,
        })
    }

    /// The number of sample frames (samples per channel).
    pub fn frames(&self) -> usize {
        self.samples.len() / self.channels.max(1) as usize
    }

    /// Length of the clip in seconds.
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }

        self.frames() as f32 / self.sample_rate as f32
    }

    /// Encodes the clip back into a canonical 44-byte-header PCM WAV file.
    pub fn to_wav(&self) -> Result<Vec<u8>> {
        let data_len = u32::try_from(self.samples.len())
            .ok()
            .and_then(|count| count.checked_mul(2))
            .filter(|len| *len <= u32::MAX - 36)
            .ok_or_else(|| eyre!("{} samples is too many for a WAV file", self.samples.len()))?;

        let block_align = self
            .channels
            .checked_mul(2)
            .ok_or_else(|| eyre!("{} channels is too many for a WAV file", self.channels))?;

        let byte_rate = self
            .sample_rate
            .checked_mul(u32::from(block_align))
            .ok_or_else(|| eyre!("sample rate {} is too high to encode", self.sample_rate))?;

        let mut out = Vec::with_capacity(HEADER_LEN + data_len as usize);

        out.extend_from_slice(b"RIFF");
        out.write_u32::<LE>(36 + data_len)?;
        out.extend_from_slice(b"WAVEfmt ");
        out.write_u32::<LE>(16)?;
        out.write_u16::<LE>(1)?;
        out.write_u16::<LE>(self.channels)?;
        out.write_u32::<LE>(self.sample_rate)?;
        out.write_u32::<LE>(byte_rate)?;
        out.write_u16::<LE>(block_align)?;
        out.write_u16::<LE>(16)?;
        out.extend_from_slice(b"data");
        out.write_u32::<LE>(data_len)?;

        for sample in &self.samples {
            let scaled = (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32);
            out.write_i16::<LE>(scaled as i16)?;
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Builds a WAV file holding `samples` with the given format.
    fn synthesize(sample_rate: u32, channels: u16, samples: &[i16]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data[0..4].copy_from_slice(b"RIFF");
        data[22..24].copy_from_slice(&channels.to_le_bytes());
        data[24..28].copy_from_slice(&sample_rate.to_le_bytes());

        for sample in samples {
            data.extend_from_slice(&sample.to_le_bytes());
        }

        data
    }

    #[test]
    fn reads_header_fields_and_frames() {
        let samples: Vec<i16> = (0..200).map(|i| (i * 100 - 10_000) as i16).collect();
        let clip = AudioClip::decode("voice", &synthesize(22_050, 2, &samples)).unwrap();

        assert_eq!(clip.sample_rate, 22_050);
        assert_eq!(clip.channels, 2);
        assert_eq!(clip.samples.len(), 200);
        assert_eq!(clip.frames(), 100);
        assert!(clip.samples.iter().all(|s| (-1.0..=1.0).contains(s)));
    }

    #[test]
    fn normalises_extremes() {
        let clip = AudioClip::decode("edges", &synthesize(8_000, 1, &[i16::MIN, 0, i16::MAX])).unwrap();

        assert_eq!(clip.samples[0], -1.0);
        assert_eq!(clip.samples[1], 0.0);
        assert!(clip.samples[2] < 1.0 && clip.samples[2] > 0.999);
    }

    #[test]
    fn rejects_short_files() {
        assert!(AudioClip::decode("short", &[0u8; 43]).is_err());
        assert!(AudioClip::decode("empty", &[]).is_err());
    }

    #[test]
    fn rejects_zero_channels() {
        assert!(AudioClip::decode("silent", &synthesize(44_100, 0, &[1, 2])).is_err());
    }

    #[test]
    fn header_only_file_is_empty_clip() {
        let clip = AudioClip::decode("blank", &synthesize(44_100, 1, &[])).unwrap();
        assert!(clip.samples.is_empty());
        assert_eq!(clip.duration_secs(), 0.0);
    }

    #[test]
    fn ignores_trailing_odd_byte() {
        let mut data = synthesize(16_000, 1, &[100, 200, 300]);
        data.push(0x7f);

        assert_eq!(AudioClip::decode("odd", &data).unwrap().samples.len(), 3);
    }

    #[test]
    fn encoding_preserves_format_and_sample_count() {
        let samples: Vec<i16> = (0..96).map(|i| (i * 331) as i16).collect();
        let clip = AudioClip::decode("loop", &synthesize(48_000, 3, &samples)).unwrap();

        let encoded = clip.to_wav().unwrap();
        assert_eq!(encoded.len(), HEADER_LEN + samples.len() * 2);

        let again = AudioClip::decode("loop", &encoded).unwrap();
        assert_eq!(again.sample_rate, 48_000);
        assert_eq!(again.channels, 3);
        assert_eq!(again.frames(), 32);
        assert_eq!(again.samples, clip.samples);
    }

    #[test]
    fn encoding_rejects_unrepresentable_formats() {
        let mut data = synthesize(44_100, 40_000, &[1, 2, 3, 4]);
        let clip = AudioClip::decode("wide", &data).unwrap();
        assert!(clip.to_wav().is_err());

        data[22..24].copy_from_slice(&2u16.to_le_bytes());
        data[24..28].copy_from_slice(&u32::MAX.to_le_bytes());
        let fast = AudioClip::decode("fast", &data).unwrap();
        assert!(fast.to_wav().is_err());
    }
}

//! STREAMINFO metadata block.
//!
//! The mandatory first metadata block. Its 34-byte body describes the whole
//! stream:
//!
//! | Field              | Bits | Stored as        |
//! |--------------------|------|------------------|
//! | minimum_blocksize  | 16   | samples          |
//! | maximum_blocksize  | 16   | samples          |
//! | minimum_frame_size | 24   | bytes, 0 unknown |
//! | maximum_frame_size | 24   | bytes, 0 unknown |
//! | sample_rate        | 20   | Hz, nonzero      |
//! | channel_count      | 3    | value - 1        |
//! | bits_per_sample    | 5    | value - 1        |
//! | sample_count       | 36   | 0 unknown        |
//! | md5_checksum       | 128  | raw bytes        |

use std::fmt::Display;
use std::io;
use std::time::Duration;

use anyhow::{Result, anyhow, bail};
use log::Level::Warn;
use log::debug;

use crate::log_or_err;
use crate::process::decode::DecoderState;
use crate::utils::bitstream_io::BitstreamIoReader;
use crate::utils::errors::{MetadataError, StreamInfoError};

/// Body length of a STREAMINFO block, in bytes.
pub const STREAMINFO_LENGTH: u32 = 34;

pub const MD5_CHECKSUM_SIZE: usize = 16;

/// Smallest block size a conforming encoder may announce, except for the
/// last frame of a stream.
pub const MIN_BLOCKSIZE: u16 = 16;

pub const MIN_BITS_PER_SAMPLE: u8 = 4;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamInfo {
    pub minimum_blocksize: u16,
    pub maximum_blocksize: u16,
    pub minimum_frame_size: u32,
    pub maximum_frame_size: u32,
    pub sample_rate: u32,
    pub channel_count: u8,
    pub bits_per_sample: u8,
    pub sample_count: u64,
    pub md5_checksum: [u8; MD5_CHECKSUM_SIZE],
}

impl StreamInfo {
    /// Decodes a STREAMINFO body of `length` bytes.
    ///
    /// The cursor is left byte-aligned right after the body, including any
    /// excess bytes a lenient decoder tolerates.
    pub fn read<R: io::Read + io::Seek>(
        state: &DecoderState,
        reader: &mut BitstreamIoReader<R>,
        length: u32,
    ) -> Result<Self> {
        debug!("Parse STREAMINFO metadata block");

        if length < STREAMINFO_LENGTH {
            bail!(MetadataError::from(StreamInfoError::InvalidLength(length)));
        }

        if length > STREAMINFO_LENGTH {
            log_or_err!(
                state,
                Warn,
                anyhow!(MetadataError::from(StreamInfoError::InvalidLength(length)))
            );
        }

        let minimum_blocksize = reader.get_n(16).map_err(truncated)? as u16;
        debug!("Minimum blocksize: {minimum_blocksize} samples");

        let maximum_blocksize = reader.get_n(16).map_err(truncated)? as u16;
        debug!("Maximum blocksize: {maximum_blocksize} samples");

        let minimum_frame_size = reader.get_n(24).map_err(truncated)?;
        debug!("Minimum frame size: {minimum_frame_size} bytes");

        let maximum_frame_size = reader.get_n(24).map_err(truncated)?;
        debug!("Maximum frame size: {maximum_frame_size} bytes");

        let sample_rate = reader.get_n(20).map_err(truncated)?;
        if sample_rate == 0 {
            bail!(MetadataError::from(StreamInfoError::InvalidSampleRate));
        }
        debug!("Sample rate: {sample_rate} Hz");

        let channel_count = reader.get_n(3).map_err(truncated)? as u8 + 1;
        debug!("Channel count: {channel_count}");

        let bits_per_sample = reader.get_n(5).map_err(truncated)? as u8 + 1;
        debug!("Bits per sample: {bits_per_sample}");

        let sample_count_hi = reader.get_n(4).map_err(truncated)?;
        let sample_count_lo = reader.get_n(32).map_err(truncated)?;
        let sample_count = (u64::from(sample_count_hi) << 32) | u64::from(sample_count_lo);
        debug!("Sample count: {sample_count}");

        let mut md5_checksum = [0u8; MD5_CHECKSUM_SIZE];
        reader.get_bytes(&mut md5_checksum).map_err(truncated)?;

        let si = Self {
            minimum_blocksize,
            maximum_blocksize,
            minimum_frame_size,
            maximum_frame_size,
            sample_rate,
            channel_count,
            bits_per_sample,
            sample_count,
            md5_checksum,
        };
        debug!("MD5: {}", si.md5_hex());

        si.validate(state)?;

        if length > STREAMINFO_LENGTH {
            reader
                .skip(u64::from(length - STREAMINFO_LENGTH))
                .map_err(truncated)?;
        }

        Ok(si)
    }

    fn validate(&self, state: &DecoderState) -> Result<()> {
        if self.minimum_blocksize < MIN_BLOCKSIZE {
            log_or_err!(
                state,
                Warn,
                anyhow!(MetadataError::from(StreamInfoError::BlockSizeTooSmall(
                    self.minimum_blocksize
                )))
            );
        }

        if self.minimum_blocksize > self.maximum_blocksize {
            log_or_err!(
                state,
                Warn,
                anyhow!(MetadataError::from(StreamInfoError::InconsistentBlockSize {
                    min: self.minimum_blocksize,
                    max: self.maximum_blocksize,
                }))
            );
        }

        if let (Some(min), Some(max)) = self.frame_size_bounds() {
            if min > max {
                log_or_err!(
                    state,
                    Warn,
                    anyhow!(MetadataError::from(StreamInfoError::InconsistentFrameSize {
                        min,
                        max
                    }))
                );
            }
        }

        if self.bits_per_sample < MIN_BITS_PER_SAMPLE {
            log_or_err!(
                state,
                Warn,
                anyhow!(MetadataError::from(StreamInfoError::BitsPerSampleTooSmall(
                    self.bits_per_sample
                )))
            );
        }

        Ok(())
    }

    /// Frame size bounds, `None` where the encoder did not record them.
    pub fn frame_size_bounds(&self) -> (Option<u32>, Option<u32>) {
        let known = |size: u32| (size != 0).then_some(size);
        (
            known(self.minimum_frame_size),
            known(self.maximum_frame_size),
        )
    }

    /// Total play time, `None` if the sample count is unknown.
    pub fn duration(&self) -> Option<Duration> {
        if self.sample_count == 0 || self.sample_rate == 0 {
            return None;
        }

        let rate = u64::from(self.sample_rate);
        let secs = self.sample_count / rate;
        let nanos = (self.sample_count % rate) * 1_000_000_000 / rate;

        Some(Duration::new(secs, nanos as u32))
    }

    pub fn has_md5(&self) -> bool {
        self.md5_checksum.iter().any(|&b| b != 0)
    }

    pub fn md5_hex(&self) -> String {
        self.md5_checksum
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

impl Display for StreamInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} Hz, {} ch, {} bit, {} samples",
            self.sample_rate, self.channel_count, self.bits_per_sample, self.sample_count
        )
    }
}

fn truncated(err: io::Error) -> MetadataError {
    StreamInfoError::Truncated(err).into()
}

/// Packs `si` back into a 34-byte STREAMINFO body for test fixtures.
#[cfg(test)]
pub(crate) fn encode_body(si: &StreamInfo) -> Vec<u8> {
    use bitstream_io::{BigEndian, BitWrite, BitWriter};

    let mut data = Vec::new();
    {
        let mut writer = BitWriter::endian(&mut data, BigEndian);
        let fields: [(u32, u32); 9] = [
            (16, u32::from(si.minimum_blocksize)),
            (16, u32::from(si.maximum_blocksize)),
            (24, si.minimum_frame_size),
            (24, si.maximum_frame_size),
            (20, si.sample_rate),
            (3, u32::from(si.channel_count - 1)),
            (5, u32::from(si.bits_per_sample - 1)),
            (4, (si.sample_count >> 32) as u32),
            (32, si.sample_count as u32),
        ];
        for (bits, value) in fields {
            writer.write_var::<u32>(bits, value).unwrap();
        }
        writer.write_bytes(&si.md5_checksum).unwrap();
    }

    data
}

//! Metadata block headers.
//!
//! Every metadata block starts with a 4-byte header: one bit flagging the
//! last block before audio frames, a 7-bit block type and a 24-bit
//! big-endian body length. The length excludes the header itself.

use std::fmt::Display;
use std::io;

use anyhow::Result;
use log::trace;

use crate::utils::bitstream_io::BitstreamIoReader;
use crate::utils::errors::MetadataError;

/// Size of a metadata block header on the wire, in bytes.
pub const BLOCK_HEADER_BYTES: u64 = 4;

/// Metadata block types the decoder knows how to handle.
///
/// Codes without a dedicated variant are carried in
/// [`BlockType::Unsupported`] so they can be reported verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockType {
    StreamInfo,
    Padding,
    VorbisComment,
    Unsupported(u8),
}

impl BlockType {
    pub fn code(&self) -> u8 {
        match self {
            BlockType::StreamInfo => 0,
            BlockType::Padding => 1,
            BlockType::VorbisComment => 4,
            BlockType::Unsupported(code) => *code,
        }
    }
}

impl From<u8> for BlockType {
    fn from(code: u8) -> Self {
        match code {
            0 => BlockType::StreamInfo,
            1 => BlockType::Padding,
            4 => BlockType::VorbisComment,
            code => BlockType::Unsupported(code),
        }
    }
}

impl Display for BlockType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockType::StreamInfo => write!(f, "STREAMINFO"),
            BlockType::Padding => write!(f, "PADDING"),
            BlockType::VorbisComment => write!(f, "VORBIS_COMMENT"),
            BlockType::Unsupported(code) => write!(f, "type {code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataBlockHeader {
    pub last: bool,
    pub block_type: BlockType,
    /// Body length in bytes.
    pub length: u32,
}

impl MetadataBlockHeader {
    pub fn read<R: io::Read + io::Seek>(reader: &mut BitstreamIoReader<R>) -> Result<Self> {
        let block_info = reader.get_n(8).map_err(MetadataError::TruncatedHeader)?;
        let length = reader.get_n(24).map_err(MetadataError::TruncatedHeader)?;

        let header = Self {
            last: block_info & 0x80 != 0,
            block_type: BlockType::from((block_info & 0x7F) as u8),
            length,
        };

        trace!(
            "Metadata block header: {}, length {}, last {}",
            header.block_type, header.length, header.last
        );

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::bitstream_io::BsIoSliceReader;

    #[test]
    fn block_type_codes_round_trip() {
        for code in 0..=127u8 {
            assert_eq!(BlockType::from(code).code(), code);
        }

        assert_eq!(BlockType::from(0), BlockType::StreamInfo);
        assert_eq!(BlockType::from(1), BlockType::Padding);
        assert_eq!(BlockType::from(4), BlockType::VorbisComment);
        assert_eq!(BlockType::from(3), BlockType::Unsupported(3));
    }

    #[test]
    fn reads_last_flag_type_and_length() -> Result<()> {
        let mut reader = BsIoSliceReader::from_slice(&[0x84, 0x01, 0x02, 0x03])?;
        let header = MetadataBlockHeader::read(&mut reader)?;

        assert!(header.last);
        assert_eq!(header.block_type, BlockType::VorbisComment);
        assert_eq!(header.length, 0x010203);
        assert_eq!(reader.position(), BLOCK_HEADER_BYTES * 8);

        Ok(())
    }

    #[test]
    fn short_header_is_truncated() -> Result<()> {
        let mut reader = BsIoSliceReader::from_slice(&[0x01, 0x00])?;
        let err = MetadataBlockHeader::read(&mut reader).unwrap_err();

        assert!(matches!(
            err.downcast_ref::<MetadataError>(),
            Some(MetadataError::TruncatedHeader(_))
        ));

        Ok(())
    }
}

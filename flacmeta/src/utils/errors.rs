use std::io;

use crate::structs::block_header::BlockType;

#[macro_export]
macro_rules! log_or_err {
    ($state:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $state.fail_level {
            return Err($err);
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum MetadataError {
    #[error("I/O failure: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid stream signature. Read {0:02X?}, expected \"fLaC\"")]
    InvalidSignature([u8; 4]),

    #[error("Truncated metadata block header: {0}")]
    TruncatedHeader(#[source] io::Error),

    #[error("STREAMINFO is not the first metadata block. Found {0}")]
    MissingStreamInfo(BlockType),

    #[error("Invalid STREAMINFO block: {0}")]
    InvalidStreamInfo(#[source] StreamInfoError),

    #[error("Unsupported metadata block type: {0}")]
    UnsupportedBlockType(u8),

    #[error("STREAMINFO must occur exactly once, found another one in block {0}")]
    DuplicateStreamInfo(usize),

    #[error("Decoder has already finished")]
    DecoderFinished,
}

#[derive(thiserror::Error, Debug)]
pub enum StreamInfoError {
    #[error("sample rate must be nonzero")]
    InvalidSampleRate,

    #[error("block body ended early: {0}")]
    Truncated(#[source] io::Error),

    #[error("block length must be 34 bytes. Read {0}")]
    InvalidLength(u32),

    #[error("minimum_blocksize must be at least 16 samples. Read {0}")]
    BlockSizeTooSmall(u16),

    #[error("minimum_blocksize exceeds maximum_blocksize ({min} > {max})")]
    InconsistentBlockSize { min: u16, max: u16 },

    #[error("minimum_frame_size exceeds maximum_frame_size ({min} > {max})")]
    InconsistentFrameSize { min: u32, max: u32 },

    #[error("bits_per_sample must be at least 4. Read {0}")]
    BitsPerSampleTooSmall(u8),
}

impl From<StreamInfoError> for MetadataError {
    fn from(err: StreamInfoError) -> Self {
        MetadataError::InvalidStreamInfo(err)
    }
}

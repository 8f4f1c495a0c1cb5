use std::io;

use anyhow::{Result, anyhow, bail};
use log::Level::Warn;
use log::{debug, trace};

use crate::log_or_err;
use crate::structs::block_header::{BlockType, MetadataBlockHeader};
use crate::structs::stream_info::StreamInfo;
use crate::utils::bitstream_io::BitstreamIoReader;
use crate::utils::errors::MetadataError;

/// Stream signature, the ASCII bytes `fLaC` read as a big-endian word.
pub const FLAC_SIGNATURE: u32 = 0x66_4C_61_43;

/// Walks the metadata blocks at the head of a FLAC stream.
///
/// The decoder owns its reader for its whole lifetime. Each call to
/// [`step`](Self::step) performs one state transition; [`decode`](Self::decode)
/// runs them until the last metadata block has been handled.
pub struct MetadataDecoder<R: io::Read + io::Seek> {
    reader: BitstreamIoReader<R>,
    state: DecoderState,
    stage: Stage,
}

/// Position of a [`MetadataDecoder`] in the header walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ValidatingSignature,
    ReadingBlockHeader,
    DispatchingBlock(MetadataBlockHeader),
    Done,
    Failed,
}

/// Decoded container header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Metadata {
    pub stream_info: StreamInfo,
    /// Number of metadata blocks walked, including STREAMINFO.
    pub block_count: usize,
    /// Absolute byte offset of the first audio frame.
    pub audio_offset: u64,
}

#[derive(Debug, Clone)]
pub struct DecoderState {
    pub fail_level: log::Level,
    pub block_count: usize,
    pub stream_info: Option<StreamInfo>,
}

impl Default for DecoderState {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
            block_count: 0,
            stream_info: None,
        }
    }
}

impl<R> MetadataDecoder<R>
where
    R: io::Read + io::Seek,
{
    /// Takes ownership of an open stream positioned at the signature.
    pub fn new(read: R) -> Result<Self> {
        let reader = BitstreamIoReader::new(read).map_err(MetadataError::Io)?;

        Ok(Self {
            reader,
            state: DecoderState::default(),
            stage: Stage::ValidatingSignature,
        })
    }

    /// Sets the failure level for validation findings.
    ///
    /// - `log::Level::Error`: only fail on Error level findings (default)
    /// - `log::Level::Warn`: fail on Warning level and above (strict mode)
    pub fn set_fail_level(&mut self, level: log::Level) {
        self.state.fail_level = level;
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn blocks_read(&self) -> usize {
        self.state.block_count
    }

    /// Runs the header walk to completion.
    pub fn decode(&mut self) -> Result<Metadata> {
        loop {
            if let Some(metadata) = self.step()? {
                return Ok(metadata);
            }
        }
    }

    /// Performs a single state transition.
    ///
    /// Returns the decoded header once the last metadata block has been
    /// handled. Any error moves the decoder to [`Stage::Failed`]; stepping a
    /// finished decoder is an error.
    pub fn step(&mut self) -> Result<Option<Metadata>> {
        if matches!(self.stage, Stage::Done | Stage::Failed) {
            bail!(MetadataError::DecoderFinished);
        }

        let result = self.advance();
        if result.is_err() {
            self.stage = Stage::Failed;
        }

        result
    }

    fn advance(&mut self) -> Result<Option<Metadata>> {
        match self.stage {
            Stage::ValidatingSignature => {
                self.validate_signature()?;
                self.stage = Stage::ReadingBlockHeader;
            }
            Stage::ReadingBlockHeader => {
                let header = MetadataBlockHeader::read(&mut self.reader)?;
                self.stage = Stage::DispatchingBlock(header);
            }
            Stage::DispatchingBlock(header) => {
                self.dispatch(&header)?;
                self.state.block_count += 1;

                if header.last {
                    let metadata = self.metadata()?;
                    debug!(
                        "Metadata ends after {} blocks, audio frames start at byte {}",
                        metadata.block_count, metadata.audio_offset
                    );
                    self.stage = Stage::Done;
                    return Ok(Some(metadata));
                }

                self.stage = Stage::ReadingBlockHeader;
            }
            Stage::Done | Stage::Failed => bail!(MetadataError::DecoderFinished),
        }

        Ok(None)
    }

    /// A stream ending inside the signature cannot be FLAC; the bytes present
    /// are reported zero-padded.
    fn validate_signature(&mut self) -> Result<()> {
        let mut signature = [0u8; 4];

        for (read, byte) in signature.iter_mut().enumerate() {
            match self.reader.get_n(8) {
                Ok(value) => *byte = value as u8,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                    debug!("Stream ends after {read} signature bytes");
                    bail!(MetadataError::InvalidSignature(signature));
                }
                Err(e) => bail!(MetadataError::Io(e)),
            }
        }

        if u32::from_be_bytes(signature) != FLAC_SIGNATURE {
            bail!(MetadataError::InvalidSignature(signature));
        }

        Ok(())
    }

    fn dispatch(&mut self, header: &MetadataBlockHeader) -> Result<()> {
        let index = self.state.block_count;

        match header.block_type {
            BlockType::StreamInfo => {
                if self.state.stream_info.is_some() {
                    log_or_err!(
                        self.state,
                        Warn,
                        anyhow!(MetadataError::DuplicateStreamInfo(index))
                    );
                    self.skip_block(header)?;
                } else {
                    let si = StreamInfo::read(&self.state, &mut self.reader, header.length)?;
                    self.state.stream_info = Some(si);
                }
            }
            BlockType::Padding | BlockType::VorbisComment => {
                if index == 0 {
                    bail!(MetadataError::MissingStreamInfo(header.block_type));
                }
                self.skip_block(header)?;
            }
            BlockType::Unsupported(code) => bail!(MetadataError::UnsupportedBlockType(code)),
        }

        Ok(())
    }

    fn skip_block(&mut self, header: &MetadataBlockHeader) -> Result<()> {
        self.reader
            .skip(u64::from(header.length))
            .map_err(MetadataError::Io)?;
        trace!("Skipped {} block of {} bytes", header.block_type, header.length);

        Ok(())
    }

    fn metadata(&self) -> Result<Metadata> {
        let stream_info = self
            .state
            .stream_info
            .ok_or(MetadataError::MissingStreamInfo(BlockType::StreamInfo))?;

        Ok(Metadata {
            stream_info,
            block_count: self.state.block_count,
            audio_offset: self.reader.stream_position(),
        })
    }
}

/// Decodes the container header of `read` with default settings.
pub fn read_metadata<R: io::Read + io::Seek>(read: R) -> Result<Metadata> {
    MetadataDecoder::new(read)?.decode()
}

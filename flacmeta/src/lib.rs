#![doc = include_str!("../README.md")]
//!
//! ## Technical Overview
//!
//! Reader for the container header of FLAC files. No audio frames are decoded.
//!
//! ### Header Organization
//!
//! **Signature**: the four ASCII bytes `fLaC`.
//! **Metadata blocks**: a chain of length-prefixed blocks, each with a
//! last-block flag, a 7-bit type and a 24-bit body length. The chain must
//! open with STREAMINFO and ends at the first block flagged as last.
//!
//! ### Block Types
//!
//! - STREAMINFO (0): decoded into [`structs::stream_info::StreamInfo`]
//! - PADDING (1): skipped
//! - VORBIS_COMMENT (4): skipped
//! - anything else: rejected
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io::BufReader;
//!
//! use flacmeta::process::decode::MetadataDecoder;
//!
//! let file = BufReader::new(File::open("input.flac")?);
//! let mut decoder = MetadataDecoder::new(file)?;
//!
//! // Fail on warnings as well as errors
//! decoder.set_fail_level(log::Level::Warn);
//!
//! let metadata = decoder.decode()?;
//! let info = &metadata.stream_info;
//! println!("{} Hz, {} channels", info.sample_rate, info.channel_count);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Header processing.
///
/// **Decoding** ([`process::decode`]): signature check and metadata block walk.
pub mod process;

/// Data structures representing header components.
///
/// - **Block headers** ([`structs::block_header`]): last flag, type and length
/// - **Stream parameters** ([`structs::stream_info`]): the STREAMINFO record
pub mod structs;

/// Utility functions and supporting infrastructure.
///
/// - **Bitstream I/O** ([`utils::bitstream_io`]): MSB-first bit reading
/// - **Error Handling** ([`utils::errors`]): Error types
pub mod utils;

pub use process::decode::{Metadata, MetadataDecoder, read_metadata};
pub use structs::stream_info::StreamInfo;
pub use utils::errors::{MetadataError, StreamInfoError};

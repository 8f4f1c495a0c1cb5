//! Utility functions and supporting infrastructure.
//!
//! Provides the bit reader and the error taxonomy shared by the header
//! structures and the decoder.

pub mod bitstream_io;
pub mod errors;

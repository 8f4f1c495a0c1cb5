//! Data structures representing container header components.
//!
//! Contains the metadata block header shared by every block and the
//! STREAMINFO record decoded from the mandatory first block.

pub mod block_header;
pub mod stream_info;

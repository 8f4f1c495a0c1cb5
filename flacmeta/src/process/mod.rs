/// Metadata block walking.
///
/// Provides the [`MetadataDecoder`](decode::MetadataDecoder) that validates the
/// stream signature, iterates metadata blocks and yields a
/// [`Metadata`](decode::Metadata) holding the decoded STREAMINFO.
pub mod decode;

/// A complete container header: signature, a STREAMINFO block (44.1 kHz,
/// 2 channels, 16 bits, 441000 samples) and a trailing 10-byte padding block.
pub const EXAMPLE_HEADER: &[u8] = &[
    0x66, 0x4C, 0x61, 0x43, 0x00, 0x00, 0x00, 0x22, 0x10, 0x00, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00,
    0x00, 0x00, 0x0A, 0xC4, 0x42, 0xF0, 0x00, 0x06, 0xBA, 0xA8, 0xD4, 0x1D, 0x8C, 0xD9, 0x8F, 0x00,
    0xB2, 0x04, 0xE9, 0x80, 0x09, 0x98, 0xEC, 0xF8, 0x42, 0x7E, 0x81, 0x00, 0x00, 0x0A, 0x00, 0x00,
    0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
];

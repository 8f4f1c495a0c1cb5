//! Bitstream I/O utilities for header parsing.
//!
//! Presents a byte-addressed seekable stream as an MSB-first bit stream.
//! Every field in the FLAC container header is big-endian and at most 32 bits
//! wide, so reads are served by a single bounded primitive, [`get_n`].
//!
//! [`get_n`]: BitstreamIoReader::get_n

use std::io;
use std::io::SeekFrom;

/// Widest field a single [`BitstreamIoReader::get_n`] call may return.
pub const MAX_READ_BITS: u32 = 32;

/// The byte currently being consumed and how many of its high-order bits
/// have been handed out already.
///
/// An offset of 8 marks an exhausted byte: the next byte is fetched only when
/// another bit is requested, so reads ending on the last byte of a stream
/// succeed.
#[derive(Debug, Clone, Copy)]
struct BitCursor {
    current: u8,
    bit_offset: u32,
}

impl BitCursor {
    const EXHAUSTED: Self = Self {
        current: 0,
        bit_offset: 8,
    };

    fn fresh(byte: u8) -> Self {
        Self {
            current: byte,
            bit_offset: 0,
        }
    }

    fn bits_left(&self) -> u32 {
        8 - self.bit_offset
    }
}

#[derive(Debug)]
pub struct BitstreamIoReader<R: io::Read + io::Seek> {
    read: R,
    cursor: BitCursor,
    /// Absolute offset of the byte following `cursor.current`.
    next_byte_pos: u64,
    start: u64,
    end: u64,
}

pub type BsIoSliceReader<'a> = BitstreamIoReader<io::Cursor<&'a [u8]>>;

impl<R> BitstreamIoReader<R>
where
    R: io::Read + io::Seek,
{
    /// Wraps `read` at its current position and primes the cursor with the
    /// first byte. Fails if the stream is empty or unreadable.
    pub fn new(mut read: R) -> io::Result<Self> {
        let start = read.stream_position()?;
        let end = read.seek(SeekFrom::End(0))?;
        read.seek(SeekFrom::Start(start))?;

        let mut reader = Self {
            read,
            cursor: BitCursor::EXHAUSTED,
            next_byte_pos: start,
            start,
            end,
        };
        reader.fetch()?;

        Ok(reader)
    }

    #[inline(always)]
    pub fn get(&mut self) -> io::Result<bool> {
        self.get_n(1).map(|bit| bit == 1)
    }

    /// Reads the next `n` bits, most significant first, as an unsigned value.
    ///
    /// On failure the cursor position is unspecified and the caller should
    /// abandon the stream.
    #[inline(always)]
    pub fn get_n(&mut self, n: u32) -> io::Result<u32> {
        if n > MAX_READ_BITS {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("get_n({n}): at most {MAX_READ_BITS} bits per read"),
            ));
        }

        match self.accumulate(n) {
            Ok(val) => Ok(val),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!("get_n({}): out of bounds bits at {}", n, self.position()),
            )),
            Err(e) => Err(e),
        }
    }

    /// Fills `buf` one byte (8 bits) at a time, preserving stream order.
    pub fn get_bytes(&mut self, buf: &mut [u8]) -> io::Result<()> {
        for byte in buf.iter_mut() {
            *byte = self.get_n(8)? as u8;
        }

        Ok(())
    }

    /// Advances the stream by `byte_count` bytes.
    ///
    /// The cursor must be byte-aligned. Skipping to exactly the end of the
    /// stream is allowed; skipping beyond it is not.
    pub fn skip(&mut self, byte_count: u64) -> io::Result<()> {
        if !self.is_aligned() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!(
                    "skip({byte_count}): cursor not byte-aligned at bit {}",
                    self.position()
                ),
            ));
        }

        if byte_count == 0 {
            return Ok(());
        }

        if byte_count > self.available() >> 3 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                format!(
                    "skip({byte_count}): out of bounds bytes at {}",
                    self.stream_position()
                ),
            ));
        }

        let target = self.stream_position() + byte_count;
        self.read.seek(SeekFrom::Start(target))?;
        self.next_byte_pos = target;
        self.cursor = BitCursor::EXHAUSTED;

        Ok(())
    }

    /// Bits consumed since the reader was created.
    #[inline(always)]
    pub fn position(&self) -> u64 {
        ((self.next_byte_pos - self.start) << 3) - u64::from(self.cursor.bits_left())
    }

    /// Absolute offset of the byte holding the next unread bit.
    #[inline(always)]
    pub fn stream_position(&self) -> u64 {
        self.start + (self.position() >> 3)
    }

    /// Bits left before the end of the stream.
    #[inline(always)]
    pub fn available(&self) -> u64 {
        ((self.end - self.start) << 3).saturating_sub(self.position())
    }

    #[inline(always)]
    pub fn is_aligned(&self) -> bool {
        self.cursor.bit_offset == 0 || self.cursor.bit_offset == 8
    }

    fn accumulate(&mut self, n: u32) -> io::Result<u32> {
        let mut remaining = n;
        let mut value = 0u64;

        // Leading bits of a partly consumed byte.
        let left = self.cursor.bits_left();
        if remaining > 0 && left > 0 && left < 8 {
            let take = left.min(remaining);
            value = low_bits(self.cursor.current, left) >> (left - take);
            self.cursor.bit_offset += take;
            remaining -= take;
        }

        while remaining >= 8 {
            self.refill()?;
            value = (value << 8) | u64::from(self.cursor.current);
            self.cursor.bit_offset = 8;
            remaining -= 8;
        }

        // Trailing bits stay in the current byte.
        if remaining > 0 {
            self.refill()?;
            value = (value << remaining) | u64::from(self.cursor.current >> (8 - remaining));
            self.cursor.bit_offset = remaining;
        }

        Ok(value as u32)
    }

    #[inline(always)]
    fn refill(&mut self) -> io::Result<()> {
        if self.cursor.bit_offset == 8 {
            self.fetch()?;
        }

        Ok(())
    }

    fn fetch(&mut self) -> io::Result<()> {
        let mut byte = [0u8; 1];
        self.read.read_exact(&mut byte)?;
        self.cursor = BitCursor::fresh(byte[0]);
        self.next_byte_pos += 1;

        Ok(())
    }
}

impl<'a> BsIoSliceReader<'a> {
    pub fn from_slice(buf: &'a [u8]) -> io::Result<Self> {
        Self::new(io::Cursor::new(buf))
    }
}

#[inline(always)]
fn low_bits(byte: u8, n: u32) -> u64 {
    u64::from(byte) & ((1u64 << n) - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bitstream_io::{BigEndian, BitWrite, BitWriter};

    #[test]
    fn reads_fields_across_byte_boundaries() -> io::Result<()> {
        let data = [0b1011_0011, 0b0101_1100, 0xFF];
        let mut reader = BsIoSliceReader::from_slice(&data)?;

        assert_eq!(reader.get_n(3)?, 0b101);
        assert_eq!(reader.get_n(7)?, 0b10011_01);
        assert_eq!(reader.get_n(6)?, 0b011100);
        assert!(reader.is_aligned());
        assert_eq!(reader.get_n(8)?, 0xFF);
        assert_eq!(reader.position(), 24);

        Ok(())
    }

    #[test]
    fn reads_full_width_from_unaligned_cursor() -> io::Result<()> {
        let data = [0x12, 0x34, 0x56, 0x78, 0x9A];
        let mut reader = BsIoSliceReader::from_slice(&data)?;

        assert_eq!(reader.get_n(4)?, 0x1);
        assert_eq!(reader.get_n(32)?, 0x2345_6789);
        assert_eq!(reader.get_n(4)?, 0xA);

        Ok(())
    }

    #[test]
    fn zero_width_read_consumes_nothing() -> io::Result<()> {
        let mut reader = BsIoSliceReader::from_slice(&[0x80])?;

        assert_eq!(reader.get_n(0)?, 0);
        assert_eq!(reader.position(), 0);
        assert!(reader.get()?);

        Ok(())
    }

    #[test]
    fn rejects_reads_wider_than_32_bits() -> io::Result<()> {
        let mut reader = BsIoSliceReader::from_slice(&[0; 8])?;

        let err = reader.get_n(33).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        Ok(())
    }

    #[test]
    fn read_ending_on_last_byte_succeeds() -> io::Result<()> {
        let mut reader = BsIoSliceReader::from_slice(&[0xAB, 0xCD])?;

        assert_eq!(reader.get_n(16)?, 0xABCD);
        assert_eq!(reader.available(), 0);

        let err = reader.get().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        Ok(())
    }

    #[test]
    fn empty_stream_fails_to_prime() {
        let err = BsIoSliceReader::from_slice(&[]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn skip_advances_by_whole_bytes() -> io::Result<()> {
        let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06];
        let mut reader = BsIoSliceReader::from_slice(&data)?;

        reader.skip(2)?;
        assert_eq!(reader.stream_position(), 2);
        assert_eq!(reader.get_n(8)?, 0x03);

        reader.skip(0)?;
        reader.skip(1)?;
        assert_eq!(reader.get_n(16)?, 0x0506);

        Ok(())
    }

    #[test]
    fn skip_to_exact_end_then_fail_beyond() -> io::Result<()> {
        let data = [0xFF; 4];
        let mut reader = BsIoSliceReader::from_slice(&data)?;

        reader.get_n(8)?;
        let err = reader.skip(4).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        reader.skip(3)?;
        assert_eq!(reader.available(), 0);
        assert!(reader.get_n(1).is_err());

        Ok(())
    }

    #[test]
    fn skip_rejects_misaligned_cursor() -> io::Result<()> {
        let mut reader = BsIoSliceReader::from_slice(&[0xFF; 4])?;

        reader.get_n(3)?;
        let err = reader.skip(1).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

        Ok(())
    }

    #[test]
    fn respects_initial_stream_position() -> io::Result<()> {
        let data = [0x00, 0x00, 0xC0, 0xFF];
        let mut cursor = io::Cursor::new(&data[..]);
        cursor.set_position(2);

        let mut reader = BitstreamIoReader::new(cursor)?;
        assert_eq!(reader.get_n(2)?, 0b11);
        assert_eq!(reader.position(), 2);
        assert_eq!(reader.stream_position(), 2);
        assert_eq!(reader.available(), 14);

        Ok(())
    }

    #[test]
    fn matches_reference_writer_for_every_offset_and_width() -> io::Result<()> {
        let patterns = [0xFFFF_FFFFu32, 0xA5A5_A5A5, 0x8000_0001, 0x1234_5678];

        for offset in 0..8u32 {
            for width in 1..=MAX_READ_BITS {
                for pattern in patterns {
                    let value = if width == 32 {
                        pattern
                    } else {
                        pattern & ((1 << width) - 1)
                    };

                    let mut data = Vec::new();
                    {
                        let mut writer = BitWriter::endian(&mut data, BigEndian);
                        if offset > 0 {
                            writer.write_var::<u32>(offset, (1 << offset) - 1)?;
                        }
                        writer.write_var::<u32>(width, value)?;
                        writer.write_var::<u8>(7, 0x55)?;
                        writer.byte_align()?;
                    }

                    let mut reader = BsIoSliceReader::from_slice(&data)?;
                    reader.get_n(offset)?;
                    assert_eq!(
                        reader.get_n(width)?,
                        value,
                        "offset {offset}, width {width}, pattern {pattern:#X}"
                    );
                    assert_eq!(reader.get_n(7)?, 0x55);
                }
            }
        }

        Ok(())
    }
}

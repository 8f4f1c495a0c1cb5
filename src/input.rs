use std::fmt::Display;
use std::fs::File;
use std::io::{self, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Context attached to failures to acquire the input stream.
#[derive(Debug)]
pub struct OpenError(pub PathBuf);

impl Display for OpenError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Couldn't open {}", self.0.display())
    }
}

trait ReadSeek: Read + Seek {}

impl<T: Read + Seek> ReadSeek for T {}

/// Unified seekable input over a file or a pipe.
///
/// The header reader measures the stream and seeks over skipped blocks, so
/// pipe input is read to the end and held in memory before decoding starts.
/// Memory use for `-` therefore grows with the whole piped file, not only
/// its header; pass a path for large inputs.
pub struct InputReader {
    reader: Box<dyn ReadSeek>,
    is_pipe: bool,
}

impl InputReader {
    /// Create a new InputReader from a path
    /// Use "-" for stdin pipe input
    pub fn new<P: AsRef<Path>>(input_path: P) -> Result<Self> {
        let input_path = input_path.as_ref();
        let is_pipe = input_path.to_string_lossy() == "-";

        let reader: Box<dyn ReadSeek> = if is_pipe {
            let buffered = buffer_pipe(io::stdin().lock())
                .with_context(|| OpenError(input_path.to_path_buf()))?;
            Box::new(buffered)
        } else {
            let file =
                File::open(input_path).with_context(|| OpenError(input_path.to_path_buf()))?;
            Box::new(BufReader::new(file))
        };

        Ok(Self { reader, is_pipe })
    }

    /// Check if this is pipe input
    pub fn is_pipe(&self) -> bool {
        self.is_pipe
    }
}

fn buffer_pipe(mut pipe: impl Read) -> io::Result<Cursor<Vec<u8>>> {
    let mut data = Vec::new();
    pipe.read_to_end(&mut data)?;
    log::debug!("Buffered {} bytes of piped input", data.len());

    Ok(Cursor::new(data))
}

impl Read for InputReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.reader.read(buf)
    }
}

impl Seek for InputReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.reader.seek(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_io_error() {
        let err = InputReader::new("/nonexistent/dir/missing.flac")
            .err()
            .expect("opening a missing file should fail");

        assert!(err.downcast_ref::<OpenError>().is_some());
        assert_eq!(
            err.to_string(),
            "Couldn't open /nonexistent/dir/missing.flac"
        );

        let io_err = err.downcast_ref::<io::Error>().unwrap();
        assert_eq!(io_err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn piped_input_is_buffered_and_seekable() -> Result<()> {
        let mut buffered = buffer_pipe(&b"fLaC\x80\0\0\x22"[..])?;
        assert_eq!(buffered.get_ref().len(), 8);

        buffered.seek(SeekFrom::Start(4))?;
        let mut header = [0u8; 4];
        buffered.read_exact(&mut header)?;
        assert_eq!(header, [0x80, 0, 0, 0x22]);

        Ok(())
    }

    #[test]
    fn reads_and_seeks_a_file() -> Result<()> {
        let mut input = InputReader::new(file!())?;
        assert!(!input.is_pipe());

        let mut head = [0u8; 4];
        input.read_exact(&mut head)?;
        assert_eq!(&head, b"use ");

        input.seek(SeekFrom::Start(1))?;
        input.read_exact(&mut head[..2])?;
        assert_eq!(&head[..2], b"se");

        Ok(())
    }
}

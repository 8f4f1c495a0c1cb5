use std::io::{self, Write};
use std::path::Path;

use anyhow::{Context, Result};
use log::Level;
use serde::Serialize;

use super::command::{Cli, ReportFormat};
use crate::input::InputReader;
use crate::timestamp::time_str;
use flacmeta::process::decode::{Metadata, MetadataDecoder};

pub fn cmd_info(cli: &Cli) -> Result<()> {
    log::info!("Reading FLAC header: {}", cli.input.display());

    let input = InputReader::new(&cli.input)?;
    if input.is_pipe() {
        log::debug!("Input buffered from stdin");
    }

    // Configure fail level based on strict mode
    let fail_level = if cli.strict { Level::Warn } else { Level::Error };

    let metadata = decode(input, fail_level)
        .with_context(|| format!("Couldn't decode the header of {}", cli.input.display()))?;
    log::info!("{}", metadata.stream_info);

    let report = StreamReport::new(&cli.input, &metadata);

    let mut out = io::stdout().lock();
    match cli.format {
        ReportFormat::Text => report.write_text(&mut out)?,
        ReportFormat::Yaml => out.write_all(report.to_yaml()?.as_bytes())?,
    }

    Ok(())
}

fn decode(input: InputReader, fail_level: Level) -> Result<Metadata> {
    let mut decoder = MetadataDecoder::new(input)?;
    decoder.set_fail_level(fail_level);
    decoder.decode()
}

#[derive(Debug, Serialize)]
struct StreamReport {
    input: String,
    sample_rate: u32,
    channels: u8,
    bits_per_sample: u8,
    minimum_blocksize: u16,
    maximum_blocksize: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    minimum_frame_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    maximum_frame_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    total_samples: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    md5: Option<String>,
    metadata_blocks: usize,
    audio_offset: u64,
}

impl StreamReport {
    fn new(input: &Path, metadata: &Metadata) -> Self {
        let si = &metadata.stream_info;
        let (minimum_frame_size, maximum_frame_size) = si.frame_size_bounds();

        Self {
            input: input.display().to_string(),
            sample_rate: si.sample_rate,
            channels: si.channel_count,
            bits_per_sample: si.bits_per_sample,
            minimum_blocksize: si.minimum_blocksize,
            maximum_blocksize: si.maximum_blocksize,
            minimum_frame_size,
            maximum_frame_size,
            total_samples: (si.sample_count != 0).then_some(si.sample_count),
            duration: si.duration().map(time_str),
            md5: si.has_md5().then(|| si.md5_hex()),
            metadata_blocks: metadata.block_count,
            audio_offset: metadata.audio_offset,
        }
    }

    fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(self)?)
    }

    fn write_text(&self, out: &mut impl Write) -> io::Result<()> {
        writeln!(out)?;
        writeln!(out, "FLAC Stream Information")?;
        writeln!(out, "=======================")?;
        writeln!(out)?;
        writeln!(out, "Input                       {}", self.input)?;
        writeln!(out)?;

        writeln!(out, "Stream Information")?;
        writeln!(out, "  Sample rate               {} Hz", self.sample_rate)?;
        writeln!(out, "  Channels                  {}", self.channels)?;
        writeln!(out, "  Bits per sample           {}", self.bits_per_sample)?;
        writeln!(
            out,
            "  Block size                {} - {} samples",
            self.minimum_blocksize, self.maximum_blocksize
        )?;
        writeln!(
            out,
            "  Frame size                {} - {} bytes",
            or_unknown(self.minimum_frame_size),
            or_unknown(self.maximum_frame_size)
        )?;
        writeln!(
            out,
            "  Total samples             {}",
            or_unknown(self.total_samples)
        )?;
        writeln!(
            out,
            "  Duration                  {}",
            or_unknown(self.duration.as_ref())
        )?;
        writeln!(
            out,
            "  MD5 signature             {}",
            self.md5.as_deref().unwrap_or("not set")
        )?;
        writeln!(out)?;

        writeln!(out, "Header Summary")?;
        writeln!(out, "  Metadata blocks           {}", self.metadata_blocks)?;
        writeln!(out, "  Audio data offset         {} bytes", self.audio_offset)?;
        writeln!(out)?;

        Ok(())
    }
}

fn or_unknown<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "unknown".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flacmeta::process::EXAMPLE_HEADER;
    use flacmeta::read_metadata;

    fn example_report() -> Result<StreamReport> {
        let metadata = read_metadata(io::Cursor::new(EXAMPLE_HEADER))?;
        Ok(StreamReport::new(Path::new("example.flac"), &metadata))
    }

    #[test]
    fn text_report_lists_stream_parameters() -> Result<()> {
        let mut out = Vec::new();
        example_report()?.write_text(&mut out)?;
        let text = String::from_utf8(out)?;

        assert!(text.contains("  Sample rate               44100 Hz\n"));
        assert!(text.contains("  Channels                  2\n"));
        assert!(text.contains("  Bits per sample           16\n"));
        assert!(text.contains("  Block size                4096 - 4096 samples\n"));
        assert!(text.contains("  Frame size                unknown - unknown bytes\n"));
        assert!(text.contains("  Duration                  00:00:10.000\n"));
        assert!(text.contains("  MD5 signature             d41d8cd98f00b204e9800998ecf8427e\n"));
        assert!(text.contains("  Audio data offset         56 bytes\n"));

        Ok(())
    }

    #[test]
    fn yaml_report_skips_unknown_fields() -> Result<()> {
        let yaml = example_report()?.to_yaml()?;

        assert!(yaml.contains("input: example.flac\n"));
        assert!(yaml.contains("sample_rate: 44100\n"));
        assert!(yaml.contains("total_samples: 441000\n"));
        assert!(yaml.contains("metadata_blocks: 2\n"));
        assert!(!yaml.contains("minimum_frame_size"));

        Ok(())
    }
}

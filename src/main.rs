use std::process::ExitCode;

use clap::Parser as ClapParser;
use clap::error::ErrorKind;

use cli::command::{Cli, LogFormat};
use cli::info::cmd_info;
use input::OpenError;

mod cli;
mod input;
pub(crate) mod timestamp;

const EXIT_USAGE: u8 = 1;
const EXIT_OPEN: u8 = 2;
/// Decoding the header or writing the report failed.
const EXIT_FAILURE: u8 = 3;

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return match e.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::from(EXIT_USAGE),
            };
        }
    };

    if let Err(e) = init_logger(&cli) {
        eprintln!("Error: {e:?}");
        return ExitCode::from(EXIT_FAILURE);
    }

    log::debug!(
        "{} {} ({})",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        option_env!("VERGEN_GIT_DESCRIBE").unwrap_or("unknown revision")
    );

    match cmd_info(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::from(exit_code(&e))
        }
    }
}

fn init_logger(cli: &Cli) -> anyhow::Result<()> {
    let mut env_builder = env_logger::Builder::from_default_env();
    env_builder.filter_level(cli.loglevel.to_level_filter());
    match cli.log_format {
        LogFormat::Plain => {
            env_builder.format_timestamp_secs();
        }
        LogFormat::Json => {
            env_builder.format(|buf, record| {
                use std::io::Write;
                writeln!(buf, "{}", json_record(&buf.timestamp().to_string(), record))
            });
        }
    }

    env_builder.try_init()?;

    Ok(())
}

fn json_record(ts: &str, record: &log::Record) -> serde_json::Value {
    serde_json::json!({
        "ts": ts,
        "lvl": record.level().as_str(),
        "msg": record.args().to_string(),
    })
}

/// Maps a failed run to the process exit status.
fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<OpenError>().is_some() {
        EXIT_OPEN
    } else {
        EXIT_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;
    use flacmeta::MetadataError;
    use std::io;
    use std::path::PathBuf;

    #[test]
    fn exit_codes_follow_failure_class() {
        let open = anyhow::Error::new(io::Error::from(io::ErrorKind::NotFound))
            .context(OpenError(PathBuf::from("missing.flac")));
        assert_eq!(exit_code(&open), EXIT_OPEN);

        let decode: anyhow::Result<()> = Err(MetadataError::InvalidSignature(*b"RIFF").into());
        let decode = decode.context("Couldn't decode the header").unwrap_err();
        assert_eq!(exit_code(&decode), EXIT_FAILURE);

        let report = anyhow::Error::new(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(exit_code(&report), EXIT_FAILURE);
        assert_ne!(exit_code(&report), EXIT_USAGE);
    }

    #[test]
    fn json_log_lines_escape_control_characters() -> anyhow::Result<()> {
        let args = format_args!("bad \u{1b}[31m \"name\"\n");
        let record = log::Record::builder()
            .args(args)
            .level(log::Level::Warn)
            .build();

        let line = json_record("2026-10-18T00:00:00Z", &record).to_string();
        assert!(!line.contains('\u{1b}'));
        assert!(line.contains("\\u001b"));

        let parsed: serde_json::Value = serde_json::from_str(&line)?;
        assert_eq!(parsed["lvl"], "WARN");
        assert_eq!(parsed["msg"], "bad \u{1b}[31m \"name\"\n");

        Ok(())
    }
}

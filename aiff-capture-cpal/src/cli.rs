//! Command-line interface for aiff-recorder
//!
//! Handles argument parsing and logging configuration.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use log::LevelFilter;

use aiff_capture_core::models::config::{output_path_for, RecorderConfig, DEFAULT_FRAMES_PER_BUFFER};

/// Record microphone audio from the command line.
#[derive(Parser, Debug)]
#[command(name = "aiff-recorder")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Increase logging verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Record microphone audio. Press enter to stop.
    Record(RecordArgs),

    /// Print the header fields of a recorded file.
    Inspect {
        /// AIFF file to read
        file: PathBuf,
    },
}

#[derive(clap::Args, Debug)]
pub struct RecordArgs {
    /// Name the output file (".aiff" is appended). Defaults to the current Unix time.
    #[arg(short, long)]
    pub out: Option<String>,

    /// Samples read from the device per tick
    #[arg(long, default_value_t = DEFAULT_FRAMES_PER_BUFFER)]
    pub buffer_frames: usize,

    /// Also write a JSON metadata sidecar next to the recording
    #[arg(long)]
    pub metadata: bool,
}

impl RecordArgs {
    pub fn to_config(&self) -> RecorderConfig {
        RecorderConfig {
            frames_per_buffer: self.buffer_frames,
            write_metadata: self.metadata,
            ..RecorderConfig::new(output_path_for(self.out.as_deref()))
        }
    }
}

impl Args {
    /// Get the log level filter based on verbosity flags
    pub fn log_level(&self) -> LevelFilter {
        if self.quiet {
            LevelFilter::Error
        } else {
            match self.verbose {
                0 => LevelFilter::Info,
                1 => LevelFilter::Debug,
                _ => LevelFilter::Trace,
            }
        }
    }
}

/// Initialize the logging system based on CLI arguments
pub fn init_logging(args: &Args) {
    let mut builder = env_logger::Builder::new();

    // keep dependencies quiet
    builder.filter_level(LevelFilter::Warn);

    for module in ["aiff_recorder", "aiff_capture_core", "aiff_capture_cpal"] {
        builder.filter_module(module, args.log_level());
    }

    builder.format_timestamp_millis().init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn record_defaults() {
        let args = Args::try_parse_from(["aiff-recorder", "record"]).unwrap();
        let Some(Command::Record(record)) = args.command else {
            panic!("expected record subcommand");
        };
        let config = record.to_config();
        assert_eq!(config.frames_per_buffer, 64);
        assert!(!config.write_metadata);
        assert!(config.output_path.to_string_lossy().ends_with(".aiff"));
    }

    #[test]
    fn record_out_name_gets_extension() {
        let args =
            Args::try_parse_from(["aiff-recorder", "record", "-o", "interview", "--metadata"]).unwrap();
        let Some(Command::Record(record)) = args.command else {
            panic!("expected record subcommand");
        };
        let config = record.to_config();
        assert_eq!(config.output_path, Path::new("interview.aiff"));
        assert!(config.write_metadata);
    }

    #[test]
    fn no_subcommand_is_allowed() {
        let args = Args::try_parse_from(["aiff-recorder"]).unwrap();
        assert!(args.command.is_none());
        assert_eq!(args.log_level(), LevelFilter::Info);
    }

    #[test]
    fn verbosity_flags() {
        let args = Args::try_parse_from(["aiff-recorder", "-vv", "record"]).unwrap();
        assert_eq!(args.log_level(), LevelFilter::Trace);

        let args = Args::try_parse_from(["aiff-recorder", "inspect", "x.aiff", "-q"]).unwrap();
        assert_eq!(args.log_level(), LevelFilter::Error);
    }
}

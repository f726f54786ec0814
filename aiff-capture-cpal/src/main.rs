//! aiff-recorder: record the default microphone to a streamed AIFF file.

mod cli;

use std::fs;
use std::io::{self, BufReader};
use std::path::Path;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use log::{error, info, warn};

use aiff_capture_core::processing::aiff_format::{AiffHeader, BYTES_PER_SAMPLE, HEADER_SIZE};
use aiff_capture_core::{spawn_line_watcher, Recorder, ShutdownCoordinator};
use aiff_capture_cpal::{signals, CpalHost};

fn main() -> ExitCode {
    let args = cli::Args::parse();
    cli::init_logging(&args);

    match &args.command {
        None => {
            print_usage();
            ExitCode::SUCCESS
        }
        Some(cli::Command::Record(record)) => run_record(record),
        Some(cli::Command::Inspect { file }) => run_inspect(file),
    }
}

fn print_usage() {
    let _ = cli::Args::command().print_help();
    println!();
}

fn run_record(args: &cli::RecordArgs) -> ExitCode {
    let recorder = match Recorder::new(args.to_config()) {
        Ok(recorder) => recorder,
        Err(e) => {
            error!("{}", e);
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let mut coordinator = ShutdownCoordinator::new();

    if let Err(e) = signals::register_shutdown_signals(coordinator.signal_flag()) {
        error!("{}", e);
        return ExitCode::FAILURE;
    }

    if let Err(e) = spawn_line_watcher(BufReader::new(io::stdin()), coordinator.stop_trigger()) {
        error!("failed to watch stdin: {}", e);
        return ExitCode::FAILURE;
    }

    info!("press enter to stop recording");

    let mut host = CpalHost::new();
    match recorder.run(&mut host, &mut coordinator) {
        Ok(result) => {
            info!(
                "saved {} ({} samples, {:.2}s, sha256 {})",
                result.file_path.display(),
                result.sample_count,
                result.duration_secs,
                result.checksum
            );
            if result.diagnostics.read_errors > 0 || result.diagnostics.write_errors > 0 {
                warn!(
                    "{} read errors and {} write errors during capture",
                    result.diagnostics.read_errors, result.diagnostics.write_errors
                );
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("recording failed: {}", e);
            if e.is_setup_failure() {
                print_usage();
            }
            ExitCode::FAILURE
        }
    }
}

fn run_inspect(path: &Path) -> ExitCode {
    let data = match fs::read(path) {
        Ok(data) => data,
        Err(e) => {
            error!("failed to read {}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let header = match AiffHeader::parse(&data) {
        Ok(header) => header,
        Err(e) => {
            error!("{}: {}", path.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let payload_samples = (data.len() - HEADER_SIZE) / BYTES_PER_SAMPLE;

    println!("file:              {}", path.display());
    println!("channels:          {}", header.channels);
    println!("sample rate:       {} Hz", header.sample_rate);
    println!("bits per sample:   {}", header.bits_per_sample);
    println!("sample count:      {}", header.sample_count);
    println!("duration:          {:.3} s", header.duration_secs());
    println!("total data bytes:  {}", header.total_bytes);
    println!("sound chunk size:  {}", header.sound_chunk_size);
    println!("payload samples:   {}", payload_samples);

    if header.is_placeholder() && payload_samples > 0 {
        warn!("header sizes were never patched");
    } else if !header.is_consistent() {
        warn!("size fields disagree with the sample count");
    } else if payload_samples as u64 != header.sample_count as u32 as u64 {
        warn!("declared sample count differs from payload length");
    }

    ExitCode::SUCCESS
}

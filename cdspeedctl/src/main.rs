mod cli;
mod config;
mod progress;

use cdspeedctl_lib::progress::no_op_progress_callback;
use cdspeedctl_lib::{Error, SetOutcome, Settings, SpeedController, SpeedRequest};
use clap::Parser;
use clap::error::ErrorKind;
use cli::{Cli, MergedConfig, merge_config};
use config::CdSpeedConfig;
use std::process::ExitCode;

/// Process exit statuses.
mod exit {
    pub const SUCCESS: u8 = 0;
    /// Device not ready, or the speed query failed.
    pub const FAILURE: u8 = 1;
    /// Every set attempt failed.
    pub const SET_FAILED: u8 = 2;
    /// EX_USAGE from sysexits.h.
    pub const USAGE: u8 = 64;
}

fn exit_code(err: &Error) -> u8 {
    match err {
        Error::InvalidArgument(_) => exit::USAGE,
        Error::RetriesExhausted { .. }
        | Error::PrimaryInterfaceFailed { .. }
        | Error::FallbackInterfaceFailed { .. } => exit::SET_FAILED,
        Error::DeviceNotReady { .. } | Error::QueryFailed { .. } => exit::FAILURE,
    }
}

/// Help is printed in place of doing anything, so it is a usage exit.
fn parse_exit_code(kind: ErrorKind) -> u8 {
    match kind {
        ErrorKind::DisplayVersion => exit::SUCCESS,
        _ => exit::USAGE,
    }
}

fn build_request(merged: &MergedConfig, settings: &Settings) -> Result<SpeedRequest, Error> {
    let speed = merged
        .speed
        .ok_or_else(|| Error::invalid_argument("--speed must be specified and > 0"))?;
    Ok(SpeedRequest::new(merged.device.clone(), speed)?
        .with_fallback(merged.sg.clone())
        .with_retry(merged.retry, settings)
        .with_verbose(merged.verbose))
}

fn report_success(request: &SpeedRequest, outcome: &SetOutcome) {
    match outcome.reported_speed {
        Some(speed) => println!("Speed set via {}. Current speed: {}", outcome.via, speed),
        None => println!(
            "Speed set to {} via {} (current speed unavailable)",
            request.target_speed(),
            outcome.via
        ),
    }
}

/// Query or set, returning the process exit status.
fn run(merged: &MergedConfig, controller: &SpeedController) -> u8 {
    if merged.current {
        return match controller.run_query(&merged.device) {
            Ok(speed) => {
                println!("Current speed: {}", speed);
                exit::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                exit_code(&e)
            }
        };
    }

    let request = match build_request(merged, controller.settings()) {
        Ok(request) => request,
        Err(e) => {
            eprintln!("Error: {}", e);
            return exit_code(&e);
        }
    };

    match controller.run_set(&request) {
        Ok(outcome) => {
            if !merged.quiet {
                report_success(&request, &outcome);
            }
            exit::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code(&e)
        }
    }
}

fn init_tracing(verbose: bool) {
    // RUST_LOG wins, e.g. RUST_LOG=cdspeedctl_lib=trace shows SG_IO command blocks.
    let fallback = if verbose {
        "cdspeedctl=debug,cdspeedctl_lib=debug"
    } else {
        "off"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let settings = Settings::default();

    let args = match Cli::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return ExitCode::from(parse_exit_code(e.kind()));
        }
    };

    let config = match args.config.as_deref().map(CdSpeedConfig::from_file).transpose() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(exit::USAGE);
        }
    };

    let merged = match merge_config(&args, config, &settings) {
        Ok(merged) => merged,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            return ExitCode::from(exit::USAGE);
        }
    };

    init_tracing(merged.verbose);
    tracing::debug!("effective options: {:?}", merged);

    let progress_callback = if merged.quiet {
        no_op_progress_callback()
    } else {
        progress::create_progress_callback(merged.verbose)
    };
    let controller = SpeedController::new(settings, progress_callback);

    ExitCode::from(run(&merged, &controller))
}

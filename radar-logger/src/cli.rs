//! CLI argument parsing for the data logger.
//!
//! Flags mirror the classic getopt interface: single-letter options with
//! long aliases, a custom `-h`/`-?` help flag and range validation that runs
//! after parsing.

use std::path::PathBuf;

use clap::{ArgAction, CommandFactory, Parser};
use radar_service::ServiceKind;
use radar_sink::Destination;
use thiserror::Error;

use crate::request::{RunRequest, Termination};

/// Default start of the measured range in meters.
pub const DEFAULT_RANGE_START: f32 = 0.07;

/// Default end of the measured range in meters.
pub const DEFAULT_RANGE_END: f32 = 0.5;

/// Default update rate in Hz.
pub const DEFAULT_FREQUENCY: f32 = 10.0;

/// Default number of power bins.
pub const DEFAULT_BIN_COUNT: u8 = 10;

/// Default sensor id.
pub const DEFAULT_SENSOR: u8 = 1;

/// Exclusive upper bound of the update rate in Hz.
pub const MAX_FREQUENCY: f32 = 100_000.0;

/// Largest number of power bins.
pub const MAX_BIN_COUNT: u8 = 32;

/// Largest sensor id.
pub const MAX_SENSOR: u8 = 4;

/// Version string including the build's git hash.
pub const VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")");

/// Errors from CLI argument validation.
#[derive(Debug, Error, PartialEq)]
pub enum CliError {
    #[error("missing service type (-t)")]
    MissingServiceType,

    #[error("service type must be 0, 1 or 2, got {0}")]
    InvalidServiceType(u8),

    #[error("frequency must be in the range (0, 100000), got {0}")]
    InvalidFrequency(f32),

    #[error("gain must be in the range [0, 1], got {0}")]
    InvalidGain(f32),

    #[error("number of bins must be in the range (0, 32], got {0}")]
    InvalidBinCount(u8),

    #[error("running average factor must be in the range [0, 1], got {0}")]
    InvalidRunningAverage(f32),

    #[error("sensor must be in the range (0, 4], got {0}")]
    InvalidSensor(u8),
}

/// Radar data logger - streams power bins, envelope or IQ frames as
/// tab-separated lines.
#[derive(Parser, Debug, Clone, PartialEq)]
#[command(name = "data-logger")]
#[command(version = VERSION, about, long_about = None)]
#[command(disable_help_flag = true)]
pub struct Cli {
    /// Service type: 0 = power bins, 1 = envelope, 2 = iq (required).
    #[arg(short = 't', long = "service-type")]
    pub service_type: Option<u8>,

    /// Number of frames to log. If not specified, runs until Ctrl+C.
    #[arg(short = 'c', long = "sweep-count")]
    pub sweep_count: Option<u16>,

    /// Start of the measured range in meters.
    #[arg(
        short = 'b',
        long = "range-start",
        default_value_t = DEFAULT_RANGE_START,
        allow_negative_numbers = true
    )]
    pub range_start: f32,

    /// End of the measured range in meters.
    #[arg(
        short = 'e',
        long = "range-end",
        default_value_t = DEFAULT_RANGE_END,
        allow_negative_numbers = true
    )]
    pub range_end: f32,

    /// Update rate in Hz.
    #[arg(
        short = 'f',
        long = "frequency",
        default_value_t = DEFAULT_FREQUENCY,
        allow_negative_numbers = true
    )]
    pub frequency: f32,

    /// Receiver gain in [0, 1]. Service default if not specified.
    #[arg(short = 'g', long = "gain", allow_negative_numbers = true)]
    pub gain: Option<f32>,

    /// Number of bins (power bins only).
    #[arg(short = 'n', long = "number-of-bins", default_value_t = DEFAULT_BIN_COUNT)]
    pub number_of_bins: u8,

    /// Output file. Frames go to stdout if not specified.
    #[arg(short = 'o', long = "out")]
    pub out: Option<PathBuf>,

    /// Service profile, 1-based. 0 keeps the service default.
    #[arg(short = 'y', long = "service-profile", default_value_t = 0)]
    pub service_profile: u32,

    /// Running average factor in [0, 1] (envelope only).
    #[arg(short = 'r', long = "running-avg-factor", allow_negative_numbers = true)]
    pub running_avg_factor: Option<f32>,

    /// Sensor id.
    #[arg(short = 's', long = "sensor", default_value_t = DEFAULT_SENSOR)]
    pub sensor: u8,

    /// Verbose output (-v for runtime debug, -vv for trace).
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,

    /// Print usage.
    #[arg(short = 'h', long = "help", short_alias = '?', action = ArgAction::SetTrue)]
    pub help: bool,
}

impl Cli {
    /// Validate the arguments.
    pub fn validate(&self) -> Result<(), CliError> {
        self.service_kind()?;
        if !(self.frequency > 0.0 && self.frequency < MAX_FREQUENCY) {
            return Err(CliError::InvalidFrequency(self.frequency));
        }
        if let Some(gain) = self.gain {
            if !(0.0..=1.0).contains(&gain) {
                return Err(CliError::InvalidGain(gain));
            }
        }
        if self.number_of_bins == 0 || self.number_of_bins > MAX_BIN_COUNT {
            return Err(CliError::InvalidBinCount(self.number_of_bins));
        }
        if let Some(factor) = self.running_avg_factor {
            if !(0.0..=1.0).contains(&factor) {
                return Err(CliError::InvalidRunningAverage(factor));
            }
        }
        if self.sensor == 0 || self.sensor > MAX_SENSOR {
            return Err(CliError::InvalidSensor(self.sensor));
        }
        Ok(())
    }

    fn service_kind(&self) -> Result<ServiceKind, CliError> {
        let index = self.service_type.ok_or(CliError::MissingServiceType)?;
        ServiceKind::from_index(index).ok_or(CliError::InvalidServiceType(index))
    }

    /// Validate and convert into the request driving the run.
    pub fn to_run_request(&self) -> Result<RunRequest, CliError> {
        self.validate()?;
        Ok(RunRequest {
            kind: self.service_kind()?,
            sensor: self.sensor,
            range_start_m: self.range_start,
            range_end_m: self.range_end,
            frequency: self.frequency,
            gain: self.gain,
            profile: self.service_profile,
            running_average: self.running_avg_factor,
            bin_count: self.number_of_bins,
            termination: self
                .sweep_count
                .map_or(Termination::UntilInterrupt, Termination::Count),
            destination: Destination::from_path(self.out.clone()),
        })
    }
}

/// Parse CLI arguments from an iterator (for testing).
pub fn parse_from<I, T>(iter: I) -> Result<Cli, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    Cli::try_parse_from(iter)
}

/// Rendered usage text.
pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_ok(args: &[&str]) -> Cli {
        let mut full = vec!["data-logger"];
        full.extend_from_slice(args);
        parse_from(full).expect("parse")
    }

    // ===========================================
    // Test Category A: Parsing
    // ===========================================

    // --- Defaults ---

    #[test]
    fn test_defaults() {
        let cli = parse_ok(&["-t", "0"]);
        assert_eq!(cli.service_type, Some(0));
        assert_eq!(cli.sweep_count, None);
        assert_eq!(cli.range_start, DEFAULT_RANGE_START);
        assert_eq!(cli.range_end, DEFAULT_RANGE_END);
        assert_eq!(cli.frequency, DEFAULT_FREQUENCY);
        assert_eq!(cli.gain, None);
        assert_eq!(cli.number_of_bins, DEFAULT_BIN_COUNT);
        assert_eq!(cli.out, None);
        assert_eq!(cli.service_profile, 0);
        assert_eq!(cli.running_avg_factor, None);
        assert_eq!(cli.sensor, DEFAULT_SENSOR);
        assert_eq!(cli.verbose, 0);
        assert!(!cli.help);
    }

    #[test]
    fn test_service_type_is_optional_at_parse_time() {
        let cli = parse_ok(&[]);
        assert_eq!(cli.service_type, None);
    }

    // --- Short and long flags ---

    #[test]
    fn test_all_short_flags() {
        let cli = parse_ok(&[
            "-t", "1", "-c", "25", "-b", "0.2", "-e", "0.6", "-f", "50", "-g", "0.4", "-n", "16",
            "-o", "/tmp/frames.tsv", "-y", "3", "-r", "0.9", "-s", "2", "-v",
        ]);
        assert_eq!(cli.service_type, Some(1));
        assert_eq!(cli.sweep_count, Some(25));
        assert_eq!(cli.range_start, 0.2);
        assert_eq!(cli.range_end, 0.6);
        assert_eq!(cli.frequency, 50.0);
        assert_eq!(cli.gain, Some(0.4));
        assert_eq!(cli.number_of_bins, 16);
        assert_eq!(cli.out, Some(PathBuf::from("/tmp/frames.tsv")));
        assert_eq!(cli.service_profile, 3);
        assert_eq!(cli.running_avg_factor, Some(0.9));
        assert_eq!(cli.sensor, 2);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_all_long_flags() {
        let cli = parse_ok(&[
            "--service-type",
            "2",
            "--sweep-count",
            "3",
            "--range-start",
            "0.1",
            "--range-end",
            "0.3",
            "--frequency",
            "20",
            "--gain",
            "0.5",
            "--number-of-bins",
            "8",
            "--out",
            "out.tsv",
            "--service-profile",
            "1",
            "--running-avg-factor",
            "0.25",
            "--sensor",
            "4",
            "--verbose",
        ]);
        assert_eq!(cli.service_type, Some(2));
        assert_eq!(cli.sweep_count, Some(3));
        assert_eq!(cli.range_start, 0.1);
        assert_eq!(cli.range_end, 0.3);
        assert_eq!(cli.frequency, 20.0);
        assert_eq!(cli.gain, Some(0.5));
        assert_eq!(cli.number_of_bins, 8);
        assert_eq!(cli.out, Some(PathBuf::from("out.tsv")));
        assert_eq!(cli.service_profile, 1);
        assert_eq!(cli.running_avg_factor, Some(0.25));
        assert_eq!(cli.sensor, 4);
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_verbose_counts() {
        let cli = parse_ok(&["-t", "0", "-vv"]);
        assert_eq!(cli.verbose, 2);
    }

    #[test]
    fn test_negative_range_values() {
        let cli = parse_ok(&["-t", "0", "-b", "-0.5", "-e", "-0.1"]);
        assert_eq!(cli.range_start, -0.5);
        assert_eq!(cli.range_end, -0.1);
    }

    #[test]
    fn test_help_short() {
        assert!(parse_ok(&["-h"]).help);
    }

    #[test]
    fn test_help_question_mark() {
        assert!(parse_ok(&["-?"]).help);
    }

    #[test]
    fn test_help_long() {
        assert!(parse_ok(&["--help"]).help);
    }

    #[test]
    fn test_unknown_flag_rejected() {
        assert!(parse_from(["data-logger", "-t", "0", "-x"]).is_err());
    }

    #[test]
    fn test_non_numeric_value_rejected() {
        assert!(parse_from(["data-logger", "-t", "zero"]).is_err());
    }

    #[test]
    fn test_sweep_count_overflow_rejected() {
        assert!(parse_from(["data-logger", "-t", "0", "-c", "65536"]).is_err());
    }

    #[test]
    fn test_version_flag() {
        let err = parse_from(["data-logger", "--version"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayVersion);
    }

    // ===========================================
    // Test Category B: Validation
    // ===========================================

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(parse_ok(&["-t", "0"]).validate().is_ok());
    }

    #[test]
    fn test_validate_missing_service_type() {
        assert_eq!(parse_ok(&[]).validate(), Err(CliError::MissingServiceType));
    }

    #[test]
    fn test_validate_invalid_service_type() {
        assert_eq!(
            parse_ok(&["-t", "3"]).validate(),
            Err(CliError::InvalidServiceType(3))
        );
    }

    #[test]
    fn test_validate_frequency_bounds() {
        assert_eq!(
            parse_ok(&["-t", "0", "-f", "0"]).validate(),
            Err(CliError::InvalidFrequency(0.0))
        );
        assert_eq!(
            parse_ok(&["-t", "0", "-f", "100000"]).validate(),
            Err(CliError::InvalidFrequency(100_000.0))
        );
        assert!(parse_ok(&["-t", "0", "-f", "99999"]).validate().is_ok());
        assert!(parse_ok(&["-t", "0", "-f", "-5"]).validate().is_err());
    }

    #[test]
    fn test_validate_gain_bounds() {
        assert!(parse_ok(&["-t", "0", "-g", "0"]).validate().is_ok());
        assert!(parse_ok(&["-t", "0", "-g", "1"]).validate().is_ok());
        assert_eq!(
            parse_ok(&["-t", "0", "-g", "1.5"]).validate(),
            Err(CliError::InvalidGain(1.5))
        );
        assert_eq!(
            parse_ok(&["-t", "0", "-g", "-0.1"]).validate(),
            Err(CliError::InvalidGain(-0.1))
        );
    }

    #[test]
    fn test_validate_bin_count_bounds() {
        assert_eq!(
            parse_ok(&["-t", "0", "-n", "0"]).validate(),
            Err(CliError::InvalidBinCount(0))
        );
        assert_eq!(
            parse_ok(&["-t", "0", "-n", "33"]).validate(),
            Err(CliError::InvalidBinCount(33))
        );
        assert!(parse_ok(&["-t", "0", "-n", "32"]).validate().is_ok());
        assert!(parse_ok(&["-t", "0", "-n", "1"]).validate().is_ok());
    }

    #[test]
    fn test_validate_running_average_bounds() {
        assert!(parse_ok(&["-t", "1", "-r", "0"]).validate().is_ok());
        assert!(parse_ok(&["-t", "1", "-r", "1"]).validate().is_ok());
        assert_eq!(
            parse_ok(&["-t", "1", "-r", "2"]).validate(),
            Err(CliError::InvalidRunningAverage(2.0))
        );
    }

    #[test]
    fn test_validate_sensor_bounds() {
        assert_eq!(
            parse_ok(&["-t", "0", "-s", "0"]).validate(),
            Err(CliError::InvalidSensor(0))
        );
        assert_eq!(
            parse_ok(&["-t", "0", "-s", "5"]).validate(),
            Err(CliError::InvalidSensor(5))
        );
        assert!(parse_ok(&["-t", "0", "-s", "4"]).validate().is_ok());
    }

    #[test]
    fn test_validate_does_not_check_range_order() {
        assert!(parse_ok(&["-t", "0", "-b", "0.5", "-e", "0.2"])
            .validate()
            .is_ok());
    }

    // ===========================================
    // Test Category C: Run request
    // ===========================================

    #[test]
    fn test_to_run_request_until_interrupt() {
        let request = parse_ok(&["-t", "1"]).to_run_request().expect("request");
        assert_eq!(request.kind, ServiceKind::Envelope);
        assert_eq!(request.termination, Termination::UntilInterrupt);
        assert_eq!(request.destination, Destination::Stdout);
        assert_eq!(request, RunRequest::for_kind(ServiceKind::Envelope));
    }

    #[test]
    fn test_to_run_request_fixed_count_and_file() {
        let request = parse_ok(&["-t", "2", "-c", "0", "-o", "iq.tsv", "-y", "4", "-g", "0.3"])
            .to_run_request()
            .expect("request");
        assert_eq!(request.kind, ServiceKind::Iq);
        assert_eq!(request.termination, Termination::Count(0));
        assert_eq!(request.destination, Destination::File(PathBuf::from("iq.tsv")));
        assert_eq!(request.profile, 4);
        assert_eq!(request.gain, Some(0.3));
    }

    #[test]
    fn test_to_run_request_propagates_validation() {
        let result = parse_ok(&["-c", "5"]).to_run_request();
        assert_eq!(result, Err(CliError::MissingServiceType));
    }

    // --- Usage ---

    #[test]
    fn test_usage_lists_flags() {
        let text = usage();
        assert!(text.contains("Usage"));
        assert!(text.contains("--service-type"));
        assert!(text.contains("--running-avg-factor"));
    }

    #[test]
    fn test_version_contains_package_version() {
        assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
    }

    // --- Error messages ---

    #[test]
    fn test_cli_error_display() {
        assert_eq!(
            CliError::InvalidSensor(9).to_string(),
            "sensor must be in the range (0, 4], got 9"
        );
        assert_eq!(
            CliError::MissingServiceType.to_string(),
            "missing service type (-t)"
        );
    }
}

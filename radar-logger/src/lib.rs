//! Radar data logger.
//!
//! This crate provides the command-line data logger: argument parsing and
//! validation, the configuration builder, the per-kind service variants and
//! frame formatting, the acquisition driver and the termination signal.

pub mod acquisition;
pub mod cli;
pub mod commands;
pub mod config;
pub mod exit;
pub mod logger;
pub mod request;
pub mod signal;
pub mod variant;

pub use acquisition::{run_service, AcquisitionError, RunSummary};
pub use cli::{parse_from, usage, Cli, CliError};
pub use commands::{execute_record, CommandError, CommandResult};
pub use config::build_configuration;
pub use logger::{init_logging, LogFacade, Logger, MockLogger, NullLogger, Verbosity};
pub use request::{RunRequest, Termination};
pub use signal::{
    AlwaysTerminate, NeverTerminate, TerminateAfter, TerminationCheck, TerminationSignal,
};
pub use variant::{format_frame, Envelope, Iq, PowerBins, ServiceVariant};

//! Command orchestration.
//!
//! Provides `execute_record`, which runs the whole process sequence for one
//! `RunRequest`.

pub mod record;

pub use record::execute_record;

use radar_service::RuntimeError;
use thiserror::Error;

use crate::acquisition::AcquisitionError;
use crate::cli::CliError;

/// Errors from command execution.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("invalid argument: {0}")]
    InvalidArgument(#[from] CliError),

    #[error("{0}")]
    DriverInitFailed(#[source] RuntimeError),

    #[error("{0}")]
    RuntimeActivationFailed(#[source] RuntimeError),

    #[error(transparent)]
    Acquisition(#[from] AcquisitionError),
}

/// Result of command execution.
pub type CommandResult<T> = Result<T, CommandError>;

//! Exit codes for the data logger.

use crate::acquisition::AcquisitionError;
use crate::commands::CommandError;

/// Exit code constants.
pub mod codes {
    /// Successful execution.
    pub const SUCCESS: i32 = 0;
    /// Invalid or missing arguments, or usage requested.
    pub const INVALID_ARGS: i32 = 1;
    /// Driver layer or sensing runtime could not be brought up.
    pub const RUNTIME_ERROR: i32 = 2;
    /// Service configuration or lifecycle failure.
    pub const SERVICE_ERROR: i32 = 3;
    /// Output could not be opened or written.
    pub const OUTPUT_ERROR: i32 = 4;
}

/// Map a CommandError to an exit code.
pub fn exit_code(error: &CommandError) -> i32 {
    match error {
        CommandError::InvalidArgument(_) => codes::INVALID_ARGS,
        CommandError::DriverInitFailed(_) | CommandError::RuntimeActivationFailed(_) => {
            codes::RUNTIME_ERROR
        }
        CommandError::Acquisition(e) => match e {
            AcquisitionError::SinkOpenFailed(_) | AcquisitionError::SinkWriteFailed(_) => {
                codes::OUTPUT_ERROR
            }
            AcquisitionError::ConfigCreationFailed(_)
            | AcquisitionError::HandleCreationFailed { .. }
            | AcquisitionError::ActivationFailed { .. }
            | AcquisitionError::FrameRetrievalFailed { .. }
            | AcquisitionError::DeactivationFailed { .. } => codes::SERVICE_ERROR,
        },
    }
}

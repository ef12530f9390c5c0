//! Acquisition driver.
//!
//! Runs one service through create → activate → poll* → deactivate → destroy.
//! Each resource is released by the function that acquired it, after the
//! inner step returns, so teardown happens on every exit path:
//!
//! - `run_service` creates the service handle and always destroys it
//! - `drive_service` activates the handle and deactivates it once activated
//! - `stream_frames` opens the sink and always closes it
//!
//! When several steps fail, the earliest failure is reported.

use radar_service::{RuntimeError, SensingRuntime, ServiceKind};
use radar_sink::{Destination, FrameSink, SinkError, SinkOpener};
use thiserror::Error;

use crate::logger::Logger;
use crate::request::Termination;
use crate::signal::TerminationCheck;
use crate::variant::{format_frame, ServiceVariant};

/// Errors from a logging run.
#[derive(Debug, Error)]
pub enum AcquisitionError {
    #[error("failed to create {0} configuration")]
    ConfigCreationFailed(ServiceKind),

    #[error("failed to create {kind} service: {source}")]
    HandleCreationFailed {
        kind: ServiceKind,
        #[source]
        source: RuntimeError,
    },

    #[error("failed to activate {kind} service: {source}")]
    ActivationFailed {
        kind: ServiceKind,
        #[source]
        source: RuntimeError,
    },

    #[error("failed to get next {kind} frame: {source}")]
    FrameRetrievalFailed {
        kind: ServiceKind,
        #[source]
        source: RuntimeError,
    },

    #[error("{0}")]
    SinkOpenFailed(#[source] SinkError),

    #[error("{0}")]
    SinkWriteFailed(#[source] SinkError),

    #[error("failed to deactivate {kind} service: {source}")]
    DeactivationFailed {
        kind: ServiceKind,
        #[source]
        source: RuntimeError,
    },
}

/// Outcome of a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Frames written to the sink.
    pub frames_emitted: u64,
    /// Emitted frames the runtime flagged as saturated.
    pub saturated_frames: u64,
}

/// Run variant `V` from an already built configuration.
///
/// The configuration stays owned by the caller.
#[allow(clippy::too_many_arguments)]
pub fn run_service<V, R, O, T, L>(
    runtime: &R,
    config: &R::Config,
    destination: &Destination,
    termination: Termination,
    sink_opener: &O,
    signal: &T,
    logger: &L,
) -> Result<RunSummary, AcquisitionError>
where
    V: ServiceVariant,
    R: SensingRuntime,
    O: SinkOpener,
    T: TerminationCheck,
    L: Logger,
{
    let mut handle = runtime
        .create_service(config)
        .map_err(|source| AcquisitionError::HandleCreationFailed {
            kind: V::KIND,
            source,
        })?;

    let result = drive_service::<V, _, _, _, _>(
        runtime,
        &mut handle,
        destination,
        termination,
        sink_opener,
        signal,
        logger,
    );

    runtime.destroy_service(handle);
    logger.debug(&format!("{} service destroyed", V::KIND));
    result
}

#[allow(clippy::too_many_arguments)]
fn drive_service<V, R, O, T, L>(
    runtime: &R,
    handle: &mut R::Handle,
    destination: &Destination,
    termination: Termination,
    sink_opener: &O,
    signal: &T,
    logger: &L,
) -> Result<RunSummary, AcquisitionError>
where
    V: ServiceVariant,
    R: SensingRuntime,
    O: SinkOpener,
    T: TerminationCheck,
    L: Logger,
{
    let metadata = runtime.metadata(handle);
    logger.verbose(&format!(
        "{} service: start {} m, length {} m, {} elements per frame",
        V::KIND,
        metadata.start_m,
        metadata.length_m,
        metadata.data_length
    ));
    let mut frame = vec![V::Sample::default(); metadata.data_length];

    runtime
        .activate_service(handle)
        .map_err(|source| AcquisitionError::ActivationFailed {
            kind: V::KIND,
            source,
        })?;

    let streamed = stream_frames::<V, _, _, _, _>(
        runtime,
        handle,
        &mut frame,
        destination,
        termination,
        sink_opener,
        signal,
        logger,
    );

    let deactivated = runtime.deactivate_service(handle).map_err(|source| {
        AcquisitionError::DeactivationFailed {
            kind: V::KIND,
            source,
        }
    });

    let summary = streamed?;
    deactivated?;
    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
fn stream_frames<V, R, O, T, L>(
    runtime: &R,
    handle: &mut R::Handle,
    frame: &mut [V::Sample],
    destination: &Destination,
    termination: Termination,
    sink_opener: &O,
    signal: &T,
    logger: &L,
) -> Result<RunSummary, AcquisitionError>
where
    V: ServiceVariant,
    R: SensingRuntime,
    O: SinkOpener,
    T: TerminationCheck,
    L: Logger,
{
    let mut sink = sink_opener
        .open(destination)
        .map_err(AcquisitionError::SinkOpenFailed)?;

    let emitted = emit_frames::<V, _, _, _, _>(
        runtime,
        handle,
        frame,
        &mut sink,
        termination,
        signal,
        logger,
    );

    let closed = sink.close().map_err(AcquisitionError::SinkWriteFailed);

    let summary = emitted?;
    closed?;
    Ok(summary)
}

/// The polling loop.
///
/// A fixed-count run stops after exactly `n` frames and never consults
/// `signal`. An interrupt-bound run checks `signal` once before each poll.
fn emit_frames<V, R, S, T, L>(
    runtime: &R,
    handle: &mut R::Handle,
    frame: &mut [V::Sample],
    sink: &mut S,
    termination: Termination,
    signal: &T,
    logger: &L,
) -> Result<RunSummary, AcquisitionError>
where
    V: ServiceVariant,
    R: SensingRuntime,
    S: FrameSink,
    T: TerminationCheck,
    L: Logger,
{
    let mut summary = RunSummary::default();

    loop {
        let done = match termination {
            Termination::Count(target) => summary.frames_emitted >= u64::from(target),
            Termination::UntilInterrupt => signal.should_terminate(),
        };
        if done {
            break;
        }

        let info = match V::poll(runtime, handle, frame) {
            Ok(info) => info,
            Err(source) => {
                if let Err(e) = sink.flush() {
                    logger.debug(&format!("flush after failed retrieval: {}", e));
                }
                return Err(AcquisitionError::FrameRetrievalFailed {
                    kind: V::KIND,
                    source,
                });
            }
        };

        if info.data_saturated {
            summary.saturated_frames += 1;
            logger.debug(&format!(
                "{} frame {} saturated, consider lowering the gain",
                V::KIND,
                info.sequence_number
            ));
        }

        sink.write_line(&format_frame::<V>(frame))
            .map_err(AcquisitionError::SinkWriteFailed)?;
        if sink.is_stdout() {
            sink.flush().map_err(AcquisitionError::SinkWriteFailed)?;
        }
        summary.frames_emitted += 1;
    }

    Ok(summary)
}

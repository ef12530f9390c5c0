//! Record command orchestration.
//!
//! Initializes the driver layer, activates the runtime, then builds, runs and
//! destroys the configuration of the requested service kind. The runtime is
//! deactivated whatever the outcome of the run.

use radar_service::{RuntimeLogLevel, SensingRuntime, ServiceKind};
use radar_sink::SinkOpener;

use crate::acquisition::{run_service, RunSummary};
use crate::config::build_configuration;
use crate::logger::Logger;
use crate::request::RunRequest;
use crate::signal::TerminationCheck;
use crate::variant::{Envelope, Iq, PowerBins, ServiceVariant};

use super::{CommandError, CommandResult};

/// Execute one recording run.
pub fn execute_record<R, O, T, L>(
    request: &RunRequest,
    log_level: RuntimeLogLevel,
    runtime: &R,
    sink_opener: &O,
    signal: &T,
    logger: &L,
) -> CommandResult<RunSummary>
where
    R: SensingRuntime,
    O: SinkOpener,
    T: TerminationCheck,
    L: Logger,
{
    runtime
        .init_driver_hal()
        .map_err(CommandError::DriverInitFailed)?;
    runtime
        .activate_runtime(log_level)
        .map_err(CommandError::RuntimeActivationFailed)?;

    logger.verbose(&format!(
        "logging {} frames to {}",
        request.kind,
        request
            .destination
            .path()
            .map_or_else(|| "stdout".to_string(), |p| p.display().to_string())
    ));

    let result = match request.kind {
        ServiceKind::PowerBins => {
            record_service::<PowerBins, _, _, _, _>(request, runtime, sink_opener, signal, logger)
        }
        ServiceKind::Envelope => {
            record_service::<Envelope, _, _, _, _>(request, runtime, sink_opener, signal, logger)
        }
        ServiceKind::Iq => {
            record_service::<Iq, _, _, _, _>(request, runtime, sink_opener, signal, logger)
        }
    };

    runtime.deactivate_runtime();

    let summary = result?;
    logger.verbose(&format!(
        "emitted {} {} frames ({} saturated)",
        summary.frames_emitted, request.kind, summary.saturated_frames
    ));
    Ok(summary)
}

fn record_service<V, R, O, T, L>(
    request: &RunRequest,
    runtime: &R,
    sink_opener: &O,
    signal: &T,
    logger: &L,
) -> CommandResult<RunSummary>
where
    V: ServiceVariant,
    R: SensingRuntime,
    O: SinkOpener,
    T: TerminationCheck,
    L: Logger,
{
    let config = build_configuration::<V, _, _>(runtime, request, logger)?;

    let result = run_service::<V, _, _, _, _>(
        runtime,
        &config,
        &request.destination,
        request.termination,
        sink_opener,
        signal,
        logger,
    );

    runtime.destroy_configuration(config);
    Ok(result?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use crate::acquisition::AcquisitionError;
    use crate::logger::{MockLogger, NullLogger};
    use crate::request::Termination;
    use crate::signal::{NeverTerminate, TerminateAfter};
    use radar_service::{
        Complex32, MockRuntime, MockSleeper, RuntimeEvent, SimulatedRuntime,
    };
    use radar_sink::{Destination, MockSinkOpener};
    use tempfile::TempDir;

    fn fixed(kind: ServiceKind, count: u16) -> RunRequest {
        let mut request = RunRequest::for_kind(kind);
        request.termination = Termination::Count(count);
        request
    }

    // ===========================================
    // Process sequence
    // ===========================================

    #[test]
    fn test_full_sequence_order() {
        let runtime = MockRuntime::new().with_power_bins_frames(vec![vec![1, 2, 3]]);
        let sinks = MockSinkOpener::new();

        execute_record(
            &fixed(ServiceKind::PowerBins, 1),
            RuntimeLogLevel::Verbose,
            &runtime,
            &sinks,
            &NeverTerminate,
            &NullLogger,
        )
        .expect("run");

        let events: Vec<RuntimeEvent> = runtime
            .events()
            .into_iter()
            .filter(|e| !e.is_setter())
            .collect();
        assert_eq!(
            events,
            vec![
                RuntimeEvent::DriverInit,
                RuntimeEvent::RuntimeActivated(RuntimeLogLevel::Verbose),
                RuntimeEvent::ConfigurationCreated(ServiceKind::PowerBins),
                RuntimeEvent::ServiceCreated(ServiceKind::PowerBins),
                RuntimeEvent::ServiceActivated,
                RuntimeEvent::FramePolled(1),
                RuntimeEvent::ServiceDeactivated,
                RuntimeEvent::ServiceDestroyed,
                RuntimeEvent::ConfigurationDestroyed(ServiceKind::PowerBins),
                RuntimeEvent::RuntimeDeactivated,
            ]
        );
        assert_eq!(sinks.contents(), "1\t2\t3\t\n");
    }

    #[test]
    fn test_dispatches_on_kind() {
        let runtime = MockRuntime::new()
            .with_envelope_frames(vec![vec![0.6]])
            .with_iq_frames(vec![vec![Complex32::new(0.5, 0.25)]]);

        let sinks = MockSinkOpener::new();
        execute_record(
            &fixed(ServiceKind::Envelope, 1),
            RuntimeLogLevel::Error,
            &runtime,
            &sinks,
            &NeverTerminate,
            &NullLogger,
        )
        .expect("envelope");
        assert_eq!(sinks.contents(), "1\t\n");

        let sinks = MockSinkOpener::new();
        execute_record(
            &fixed(ServiceKind::Iq, 1),
            RuntimeLogLevel::Error,
            &runtime,
            &sinks,
            &NeverTerminate,
            &NullLogger,
        )
        .expect("iq");
        assert_eq!(sinks.contents(), "0.500000\t0.250000\t\n");
    }

    #[test]
    fn test_until_interrupt_run() {
        let runtime = MockRuntime::new().with_power_bins_frames(vec![vec![3]]);
        let sinks = MockSinkOpener::new();
        let signal = TerminateAfter::new(2);

        let summary = execute_record(
            &RunRequest::for_kind(ServiceKind::PowerBins),
            RuntimeLogLevel::Error,
            &runtime,
            &sinks,
            &signal,
            &NullLogger,
        )
        .expect("run");

        assert_eq!(summary.frames_emitted, 2);
        assert!(runtime.contains(&RuntimeEvent::RuntimeDeactivated));
    }

    #[test]
    fn test_summary_logged_at_verbose() {
        let runtime = MockRuntime::new().with_power_bins_frames(vec![vec![3]]);
        let logger = MockLogger::new();

        execute_record(
            &fixed(ServiceKind::PowerBins, 2),
            RuntimeLogLevel::Error,
            &runtime,
            &MockSinkOpener::new(),
            &NeverTerminate,
            &logger,
        )
        .expect("run");

        assert!(logger.contains("emitted 2 power bins frames"));
        assert!(logger.contains("to stdout"));
    }

    // ===========================================
    // Failures
    // ===========================================

    #[test]
    fn test_driver_init_failure() {
        let runtime = MockRuntime::new().failing_driver_init();
        let sinks = MockSinkOpener::new();

        let result = execute_record(
            &fixed(ServiceKind::PowerBins, 1),
            RuntimeLogLevel::Error,
            &runtime,
            &sinks,
            &NeverTerminate,
            &NullLogger,
        );

        assert!(matches!(result, Err(CommandError::DriverInitFailed(_))));
        assert!(runtime.events().is_empty());
        assert_eq!(sinks.opened(), 0);
    }

    #[test]
    fn test_runtime_activation_failure() {
        let runtime = MockRuntime::new().failing_runtime_activation();

        let result = execute_record(
            &fixed(ServiceKind::Envelope, 1),
            RuntimeLogLevel::Error,
            &runtime,
            &MockSinkOpener::new(),
            &NeverTerminate,
            &NullLogger,
        );

        assert!(matches!(
            result,
            Err(CommandError::RuntimeActivationFailed(_))
        ));
        assert_eq!(runtime.events(), vec![RuntimeEvent::DriverInit]);
    }

    #[test]
    fn test_configuration_failure_deactivates_runtime() {
        let runtime = MockRuntime::new().failing_configuration();

        let result = execute_record(
            &fixed(ServiceKind::Iq, 1),
            RuntimeLogLevel::Error,
            &runtime,
            &MockSinkOpener::new(),
            &NeverTerminate,
            &NullLogger,
        );

        assert!(matches!(
            result,
            Err(CommandError::Acquisition(
                AcquisitionError::ConfigCreationFailed(ServiceKind::Iq)
            ))
        ));
        assert!(runtime.contains(&RuntimeEvent::RuntimeDeactivated));
    }

    #[test]
    fn test_failed_run_still_destroys_configuration() {
        let runtime = MockRuntime::new()
            .with_power_bins_frames(vec![vec![1]])
            .failing_activation();

        let result = execute_record(
            &fixed(ServiceKind::PowerBins, 1),
            RuntimeLogLevel::Error,
            &runtime,
            &MockSinkOpener::new(),
            &NeverTerminate,
            &NullLogger,
        );

        assert!(matches!(
            result,
            Err(CommandError::Acquisition(
                AcquisitionError::ActivationFailed { .. }
            ))
        ));
        assert_eq!(
            runtime.count(&RuntimeEvent::ConfigurationDestroyed(ServiceKind::PowerBins)),
            1
        );
        assert!(runtime.contains(&RuntimeEvent::RuntimeDeactivated));
    }

    // ===========================================
    // Simulated runtime
    // ===========================================

    #[test]
    fn test_simulated_power_bins_to_file() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("bins.tsv");
        let mut request = fixed(ServiceKind::PowerBins, 3);
        request.bin_count = 5;
        request.destination = Destination::File(path.clone());
        let runtime = SimulatedRuntime::new(MockSleeper::new());

        let summary = execute_record(
            &request,
            RuntimeLogLevel::Error,
            &runtime,
            &radar_sink::StandardSinkOpener,
            &NeverTerminate,
            &NullLogger,
        )
        .expect("run");

        assert_eq!(summary.frames_emitted, 3);
        let content = std::fs::read_to_string(&path).expect("read");
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        for line in lines {
            let fields: Vec<&str> = line.split('\t').collect();
            assert_eq!(fields.len(), 6);
            assert_eq!(fields[5], "");
            for field in &fields[..5] {
                field.parse::<u16>().expect("unsigned bin");
            }
        }
    }

    #[test]
    fn test_simulated_rejects_reversed_range() {
        let mut request = fixed(ServiceKind::Envelope, 1);
        request.range_start_m = 0.5;
        request.range_end_m = 0.2;
        let runtime = SimulatedRuntime::new(MockSleeper::new());
        let sinks = MockSinkOpener::new();

        let result = execute_record(
            &request,
            RuntimeLogLevel::Error,
            &runtime,
            &sinks,
            &NeverTerminate,
            &NullLogger,
        );

        assert!(matches!(
            result,
            Err(CommandError::Acquisition(
                AcquisitionError::HandleCreationFailed { .. }
            ))
        ));
        assert_eq!(sinks.opened(), 0);
    }

    #[test]
    fn test_simulated_rejects_unreachable_range_before_allocating() {
        let mut request = fixed(ServiceKind::Iq, 1);
        request.range_start_m = 0.0;
        request.range_end_m = 1e12;
        let runtime = SimulatedRuntime::new(MockSleeper::new());
        let sinks = MockSinkOpener::new();

        let result = execute_record(
            &request,
            RuntimeLogLevel::Error,
            &runtime,
            &sinks,
            &NeverTerminate,
            &NullLogger,
        );

        assert!(matches!(
            result,
            Err(CommandError::Acquisition(
                AcquisitionError::HandleCreationFailed { .. }
            ))
        ));
        assert_eq!(sinks.opened(), 0);
    }

    #[test]
    fn test_simulated_sink_open_failure() {
        let dir = TempDir::new().expect("tempdir");
        let mut request = fixed(ServiceKind::Iq, 1);
        request.destination = Destination::File(PathBuf::from(dir.path()).join("no/such/dir.tsv"));
        let runtime = SimulatedRuntime::new(MockSleeper::new());

        let result = execute_record(
            &request,
            RuntimeLogLevel::Error,
            &runtime,
            &radar_sink::StandardSinkOpener,
            &NeverTerminate,
            &NullLogger,
        );

        assert!(matches!(
            result,
            Err(CommandError::Acquisition(AcquisitionError::SinkOpenFailed(_)))
        ));
    }
}

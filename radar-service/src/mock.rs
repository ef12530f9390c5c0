//! Scriptable in-memory runtime for testing.
//!
//! `MockRuntime` serves scripted frames, fails on request and keeps a journal
//! of every call so tests can check ordering and teardown. Cloning creates a
//! new handle to the same journal.

use std::sync::{Arc, RwLock};

use num_complex::Complex32;

use crate::runtime::{RuntimeError, SensingRuntime};
use crate::types::{FrameMetadata, IqOutputFormat, ResultInfo, RuntimeLogLevel, ServiceKind};

/// A call recorded by the mock runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    DriverInit,
    RuntimeActivated(RuntimeLogLevel),
    RuntimeDeactivated,
    ConfigurationCreated(ServiceKind),
    ConfigurationDestroyed(ServiceKind),
    ProfileSet(u32),
    RequestedStartSet(f32),
    RequestedLengthSet(f32),
    RepetitionModeStreamingSet(f32),
    SensorSet(u8),
    ReceiverGainSet(f32),
    RequestedBinCountSet(u8),
    RunningAverageFactorSet(f32),
    IqOutputFormatSet(IqOutputFormat),
    ServiceCreated(ServiceKind),
    ServiceActivated,
    ServiceDeactivated,
    ServiceDestroyed,
    FramePolled(u32),
}

impl RuntimeEvent {
    /// True for calls that write a configuration setting.
    pub fn is_setter(&self) -> bool {
        matches!(
            self,
            RuntimeEvent::ProfileSet(_)
                | RuntimeEvent::RequestedStartSet(_)
                | RuntimeEvent::RequestedLengthSet(_)
                | RuntimeEvent::RepetitionModeStreamingSet(_)
                | RuntimeEvent::SensorSet(_)
                | RuntimeEvent::ReceiverGainSet(_)
                | RuntimeEvent::RequestedBinCountSet(_)
                | RuntimeEvent::RunningAverageFactorSet(_)
                | RuntimeEvent::IqOutputFormatSet(_)
        )
    }
}

/// Configuration handed out by the mock runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct MockConfig {
    pub kind: ServiceKind,
    pub start_m: f32,
    pub length_m: f32,
}

/// Service handle handed out by the mock runtime.
#[derive(Debug)]
pub struct MockHandle {
    kind: ServiceKind,
    metadata: FrameMetadata,
    active: bool,
    polls: usize,
}

#[derive(Debug, Default, Clone)]
struct Failures {
    driver_init: bool,
    runtime_activation: bool,
    configuration: bool,
    service_creation: bool,
    activation: bool,
    deactivation: bool,
    retrieval_at: Option<usize>,
}

#[derive(Debug, Default)]
struct MockState {
    events: Vec<RuntimeEvent>,
    power_bins_frames: Vec<Vec<u16>>,
    envelope_frames: Vec<Vec<f32>>,
    iq_frames: Vec<Vec<Complex32>>,
    data_length: Option<usize>,
    saturated: bool,
    failures: Failures,
}

/// Mock runtime for testing.
#[derive(Debug, Clone, Default)]
pub struct MockRuntime {
    state: Arc<RwLock<MockState>>,
}

impl MockRuntime {
    /// Create a mock runtime that succeeds at everything and serves empty frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve these power bins frames in order, starting over when exhausted.
    pub fn with_power_bins_frames(self, frames: Vec<Vec<u16>>) -> Self {
        self.state.write().unwrap().power_bins_frames = frames;
        self
    }

    /// Serve these envelope frames in order, starting over when exhausted.
    pub fn with_envelope_frames(self, frames: Vec<Vec<f32>>) -> Self {
        self.state.write().unwrap().envelope_frames = frames;
        self
    }

    /// Serve these IQ frames in order, starting over when exhausted.
    pub fn with_iq_frames(self, frames: Vec<Vec<Complex32>>) -> Self {
        self.state.write().unwrap().iq_frames = frames;
        self
    }

    /// Report this frame length in the metadata instead of the scripted one.
    pub fn with_data_length(self, data_length: usize) -> Self {
        self.state.write().unwrap().data_length = Some(data_length);
        self
    }

    /// Flag every frame as saturated.
    pub fn with_saturation(self) -> Self {
        self.state.write().unwrap().saturated = true;
        self
    }

    pub fn failing_driver_init(self) -> Self {
        self.state.write().unwrap().failures.driver_init = true;
        self
    }

    pub fn failing_runtime_activation(self) -> Self {
        self.state.write().unwrap().failures.runtime_activation = true;
        self
    }

    /// `create_configuration` returns `None`.
    pub fn failing_configuration(self) -> Self {
        self.state.write().unwrap().failures.configuration = true;
        self
    }

    pub fn failing_service_creation(self) -> Self {
        self.state.write().unwrap().failures.service_creation = true;
        self
    }

    pub fn failing_activation(self) -> Self {
        self.state.write().unwrap().failures.activation = true;
        self
    }

    pub fn failing_deactivation(self) -> Self {
        self.state.write().unwrap().failures.deactivation = true;
        self
    }

    /// Fail the poll with this 0-based index.
    pub fn failing_retrieval_at(self, poll: usize) -> Self {
        self.state.write().unwrap().failures.retrieval_at = Some(poll);
        self
    }

    /// All recorded calls, oldest first.
    pub fn events(&self) -> Vec<RuntimeEvent> {
        self.state.read().unwrap().events.clone()
    }

    /// Recorded configuration setter calls, oldest first.
    pub fn setter_events(&self) -> Vec<RuntimeEvent> {
        self.events().into_iter().filter(|e| e.is_setter()).collect()
    }

    /// Check whether a call was recorded.
    pub fn contains(&self, event: &RuntimeEvent) -> bool {
        self.state.read().unwrap().events.contains(event)
    }

    /// Number of recorded calls equal to `event`.
    pub fn count(&self, event: &RuntimeEvent) -> usize {
        self.state
            .read()
            .unwrap()
            .events
            .iter()
            .filter(|e| *e == event)
            .count()
    }

    fn record(&self, event: RuntimeEvent) {
        self.state.write().unwrap().events.push(event);
    }

    fn scripted_length(&self, kind: ServiceKind) -> usize {
        let state = self.state.read().unwrap();
        if let Some(len) = state.data_length {
            return len;
        }
        match kind {
            ServiceKind::PowerBins => state.power_bins_frames.first().map_or(0, Vec::len),
            ServiceKind::Envelope => state.envelope_frames.first().map_or(0, Vec::len),
            ServiceKind::Iq => state.iq_frames.first().map_or(0, Vec::len),
        }
    }

    /// Shared bookkeeping of every `get_next_*` call.
    fn begin_poll(
        &self,
        handle: &mut MockHandle,
        kind: ServiceKind,
        buffer_len: usize,
    ) -> Result<(usize, ResultInfo), RuntimeError> {
        if handle.kind != kind {
            return Err(RuntimeError::KindMismatch {
                expected: kind,
                actual: handle.kind,
            });
        }
        if !handle.active {
            return Err(RuntimeError::ServiceNotActive);
        }
        if buffer_len != handle.metadata.data_length {
            return Err(RuntimeError::BufferSize {
                expected: handle.metadata.data_length,
                actual: buffer_len,
            });
        }

        let poll = handle.polls;
        handle.polls += 1;

        let (fail, saturated) = {
            let state = self.state.read().unwrap();
            (state.failures.retrieval_at == Some(poll), state.saturated)
        };
        if fail {
            return Err(RuntimeError::Retrieval(format!(
                "simulated failure at poll {}",
                poll
            )));
        }

        let sequence_number = poll as u32 + 1;
        self.record(RuntimeEvent::FramePolled(sequence_number));
        Ok((
            poll,
            ResultInfo {
                sequence_number,
                data_saturated: saturated,
            },
        ))
    }
}

/// Copy scripted frame `poll` (cycled) into `out`, or zero it if nothing is scripted.
fn fill_frame<T: Copy + Default>(frames: &[Vec<T>], poll: usize, out: &mut [T]) {
    if frames.is_empty() {
        out.fill(T::default());
        return;
    }
    let frame = &frames[poll % frames.len()];
    for (i, dst) in out.iter_mut().enumerate() {
        *dst = frame.get(i).copied().unwrap_or_default();
    }
}

impl SensingRuntime for MockRuntime {
    type Config = MockConfig;
    type Handle = MockHandle;

    fn init_driver_hal(&self) -> Result<(), RuntimeError> {
        if self.state.read().unwrap().failures.driver_init {
            return Err(RuntimeError::DriverInit("simulated failure".to_string()));
        }
        self.record(RuntimeEvent::DriverInit);
        Ok(())
    }

    fn activate_runtime(&self, log_level: RuntimeLogLevel) -> Result<(), RuntimeError> {
        if self.state.read().unwrap().failures.runtime_activation {
            return Err(RuntimeError::RuntimeActivation("simulated failure".to_string()));
        }
        self.record(RuntimeEvent::RuntimeActivated(log_level));
        Ok(())
    }

    fn deactivate_runtime(&self) {
        self.record(RuntimeEvent::RuntimeDeactivated);
    }

    fn create_configuration(&self, kind: ServiceKind) -> Option<MockConfig> {
        if self.state.read().unwrap().failures.configuration {
            return None;
        }
        self.record(RuntimeEvent::ConfigurationCreated(kind));
        Some(MockConfig {
            kind,
            start_m: 0.0,
            length_m: 0.0,
        })
    }

    fn destroy_configuration(&self, config: MockConfig) {
        self.record(RuntimeEvent::ConfigurationDestroyed(config.kind));
    }

    fn set_profile(&self, _config: &mut MockConfig, profile: u32) {
        self.record(RuntimeEvent::ProfileSet(profile));
    }

    fn set_requested_start(&self, config: &mut MockConfig, start_m: f32) {
        config.start_m = start_m;
        self.record(RuntimeEvent::RequestedStartSet(start_m));
    }

    fn set_requested_length(&self, config: &mut MockConfig, length_m: f32) {
        config.length_m = length_m;
        self.record(RuntimeEvent::RequestedLengthSet(length_m));
    }

    fn set_repetition_mode_streaming(&self, _config: &mut MockConfig, frequency: f32) {
        self.record(RuntimeEvent::RepetitionModeStreamingSet(frequency));
    }

    fn set_sensor(&self, _config: &mut MockConfig, sensor: u8) {
        self.record(RuntimeEvent::SensorSet(sensor));
    }

    fn set_receiver_gain(&self, _config: &mut MockConfig, gain: f32) {
        self.record(RuntimeEvent::ReceiverGainSet(gain));
    }

    fn set_requested_bin_count(&self, _config: &mut MockConfig, bin_count: u8) {
        self.record(RuntimeEvent::RequestedBinCountSet(bin_count));
    }

    fn set_running_average_factor(&self, _config: &mut MockConfig, factor: f32) {
        self.record(RuntimeEvent::RunningAverageFactorSet(factor));
    }

    fn set_iq_output_format(&self, _config: &mut MockConfig, format: IqOutputFormat) {
        self.record(RuntimeEvent::IqOutputFormatSet(format));
    }

    fn create_service(&self, config: &MockConfig) -> Result<MockHandle, RuntimeError> {
        if self.state.read().unwrap().failures.service_creation {
            return Err(RuntimeError::InvalidConfiguration(
                "simulated failure".to_string(),
            ));
        }
        self.record(RuntimeEvent::ServiceCreated(config.kind));
        Ok(MockHandle {
            kind: config.kind,
            metadata: FrameMetadata {
                start_m: config.start_m,
                length_m: config.length_m,
                data_length: self.scripted_length(config.kind),
            },
            active: false,
            polls: 0,
        })
    }

    fn metadata(&self, handle: &MockHandle) -> FrameMetadata {
        handle.metadata
    }

    fn activate_service(&self, handle: &mut MockHandle) -> Result<(), RuntimeError> {
        if self.state.read().unwrap().failures.activation {
            return Err(RuntimeError::ServiceActivation("simulated failure".to_string()));
        }
        handle.active = true;
        self.record(RuntimeEvent::ServiceActivated);
        Ok(())
    }

    fn deactivate_service(&self, handle: &mut MockHandle) -> Result<(), RuntimeError> {
        handle.active = false;
        self.record(RuntimeEvent::ServiceDeactivated);
        if self.state.read().unwrap().failures.deactivation {
            return Err(RuntimeError::ServiceDeactivation(
                "simulated failure".to_string(),
            ));
        }
        Ok(())
    }

    fn destroy_service(&self, _handle: MockHandle) {
        self.record(RuntimeEvent::ServiceDestroyed);
    }

    fn get_next_power_bins(
        &self,
        handle: &mut MockHandle,
        data: &mut [u16],
    ) -> Result<ResultInfo, RuntimeError> {
        let (poll, info) = self.begin_poll(handle, ServiceKind::PowerBins, data.len())?;
        fill_frame(&self.state.read().unwrap().power_bins_frames, poll, data);
        Ok(info)
    }

    fn get_next_envelope(
        &self,
        handle: &mut MockHandle,
        data: &mut [f32],
    ) -> Result<ResultInfo, RuntimeError> {
        let (poll, info) = self.begin_poll(handle, ServiceKind::Envelope, data.len())?;
        fill_frame(&self.state.read().unwrap().envelope_frames, poll, data);
        Ok(info)
    }

    fn get_next_iq(
        &self,
        handle: &mut MockHandle,
        data: &mut [Complex32],
    ) -> Result<ResultInfo, RuntimeError> {
        let (poll, info) = self.begin_poll(handle, ServiceKind::Iq, data.len())?;
        fill_frame(&self.state.read().unwrap().iq_frames, poll, data);
        Ok(info)
    }
}

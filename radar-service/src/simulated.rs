//! Simulated sensing runtime.
//!
//! Stands in for the sensor runtime when no radar hardware is attached. It
//! validates configurations the way the hardware runtime does and synthesizes
//! a single reflector plus a deterministic noise floor, paced at the
//! configured streaming rate.

use std::f32::consts::PI;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use num_complex::Complex32;

use crate::runtime::{RuntimeError, SensingRuntime};
use crate::sleeper::{RealSleeper, Sleeper};
use crate::types::{FrameMetadata, IqOutputFormat, ResultInfo, RuntimeLogLevel, ServiceKind};

/// Distance between two envelope/IQ sample points in meters.
pub const SAMPLE_SPACING_M: f32 = 0.000_484;

/// Number of service profiles; profiles are numbered from 1.
pub const PROFILE_COUNT: u32 = 5;

pub const DEFAULT_PROFILE: u32 = 2;
pub const DEFAULT_GAIN: f32 = 0.7;
pub const DEFAULT_RUNNING_AVERAGE: f32 = 0.7;
pub const DEFAULT_BIN_COUNT: u8 = 10;

const DEFAULT_START_M: f32 = 0.2;
const DEFAULT_LENGTH_M: f32 = 0.5;
const MAX_SENSOR: u8 = 4;
/// Farthest distance the sensor can measure, in meters.
const MAX_RANGE_M: f32 = 7.0;
const MAX_BIN_COUNT: u8 = 32;

const WAVELENGTH_M: f32 = 0.005;
const PEAK_AMPLITUDE: f32 = 1000.0;
const NOISE_FLOOR: f32 = 40.0;
const TARGET_POSITION: f32 = 0.6;
const TARGET_WIDTH_M: f32 = 0.03;
const TARGET_SWAY_M: f32 = 0.01;

/// Configuration object of the simulated runtime.
#[derive(Debug, Clone, PartialEq)]
pub struct SimulatedConfig {
    pub kind: ServiceKind,
    pub profile: u32,
    pub start_m: f32,
    pub length_m: f32,
    /// Streaming rate in Hz; `None` until streaming mode is selected.
    pub frequency: Option<f32>,
    pub sensor: u8,
    pub gain: f32,
    pub bin_count: u8,
    pub running_average: f32,
    pub iq_format: IqOutputFormat,
}

impl SimulatedConfig {
    fn defaults(kind: ServiceKind) -> Self {
        Self {
            kind,
            profile: DEFAULT_PROFILE,
            start_m: DEFAULT_START_M,
            length_m: DEFAULT_LENGTH_M,
            frequency: None,
            sensor: 1,
            gain: DEFAULT_GAIN,
            bin_count: DEFAULT_BIN_COUNT,
            running_average: DEFAULT_RUNNING_AVERAGE,
            iq_format: IqOutputFormat::default(),
        }
    }

    /// Check the configuration the way the hardware runtime does on service creation.
    pub fn validate(&self) -> Result<(), RuntimeError> {
        let invalid = |reason: String| -> Result<(), RuntimeError> {
            Err(RuntimeError::InvalidConfiguration(reason))
        };

        if !self.start_m.is_finite() {
            return invalid(format!("start must be finite, got {} m", self.start_m));
        }
        if !(self.length_m > 0.0) {
            return invalid(format!("length must be positive, got {} m", self.length_m));
        }
        // also rejects an infinite length
        if !(self.start_m + self.length_m <= MAX_RANGE_M) {
            return invalid(format!(
                "range end {} m beyond the sensor's reach of {} m",
                self.start_m + self.length_m,
                MAX_RANGE_M
            ));
        }
        match self.frequency {
            None => return invalid("repetition mode must be streaming".to_string()),
            Some(f) if !(f > 0.0) => {
                return invalid(format!("update rate must be positive, got {} Hz", f))
            }
            Some(f) if Duration::try_from_secs_f32(1.0 / f).is_err() => {
                return invalid(format!("update rate {} Hz is too low", f))
            }
            Some(_) => {}
        }
        if self.sensor == 0 || self.sensor > MAX_SENSOR {
            return invalid(format!("sensor {} does not exist", self.sensor));
        }
        if self.profile == 0 || self.profile > PROFILE_COUNT {
            return invalid(format!("profile {} does not exist", self.profile));
        }
        if !(0.0..=1.0).contains(&self.gain) {
            return invalid(format!("gain {} out of range", self.gain));
        }
        if !(0.0..=1.0).contains(&self.running_average) {
            return invalid(format!(
                "running average factor {} out of range",
                self.running_average
            ));
        }
        if self.kind == ServiceKind::PowerBins
            && (self.bin_count == 0 || self.bin_count > MAX_BIN_COUNT)
        {
            return invalid(format!("bin count {} out of range", self.bin_count));
        }
        Ok(())
    }

    fn data_length(&self) -> usize {
        match self.kind {
            ServiceKind::PowerBins => self.bin_count as usize,
            ServiceKind::Envelope | ServiceKind::Iq => {
                (self.length_m / SAMPLE_SPACING_M).ceil() as usize
            }
        }
    }

    /// Update period; zero for a rate whose period cannot be represented.
    fn period(&self) -> Duration {
        Duration::try_from_secs_f32(1.0 / self.frequency.unwrap_or(1.0)).unwrap_or_default()
    }

    /// Echo magnitude at `distance` for frame `sequence`; `index` seeds the noise.
    fn echo(&self, distance: f32, index: usize, sequence: u32) -> f32 {
        let target = self.start_m
            + self.length_m * TARGET_POSITION
            + TARGET_SWAY_M * (sequence as f32 * 0.1).sin();
        let profile_scale = 0.6 + 0.2 * self.profile as f32;
        let offset = (distance - target) / TARGET_WIDTH_M;
        let noise =
            NOISE_FLOOR * (0.5 + 0.5 * (index as f32 * 37.0 + sequence as f32 * 11.0).sin());

        self.gain * (PEAK_AMPLITUDE * profile_scale * (-offset * offset).exp() + noise)
    }
}

/// Live service of the simulated runtime.
#[derive(Debug)]
pub struct SimulatedHandle {
    config: SimulatedConfig,
    metadata: FrameMetadata,
    active: bool,
    sequence: u32,
    smoothed: Vec<f32>,
}

impl SimulatedHandle {
    fn check(&self, kind: ServiceKind, len: usize) -> Result<(), RuntimeError> {
        if self.config.kind != kind {
            return Err(RuntimeError::KindMismatch {
                expected: kind,
                actual: self.config.kind,
            });
        }
        if !self.active {
            return Err(RuntimeError::ServiceNotActive);
        }
        if len != self.metadata.data_length {
            return Err(RuntimeError::BufferSize {
                expected: self.metadata.data_length,
                actual: len,
            });
        }
        Ok(())
    }
}

/// Runtime that synthesizes frames instead of sampling a sensor.
#[derive(Debug, Default)]
pub struct SimulatedRuntime<S: Sleeper = RealSleeper> {
    sleeper: S,
    driver_ready: AtomicBool,
    active: AtomicBool,
    verbose: AtomicBool,
}

impl<S: Sleeper> SimulatedRuntime<S> {
    /// Create a simulated runtime paced by `sleeper`.
    pub fn new(sleeper: S) -> Self {
        Self {
            sleeper,
            driver_ready: AtomicBool::new(false),
            active: AtomicBool::new(false),
            verbose: AtomicBool::new(false),
        }
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait one update period and advance the frame counter.
    fn next_frame(&self, handle: &mut SimulatedHandle) -> ResultInfo {
        self.sleeper.sleep(handle.config.period());
        handle.sequence = handle.sequence.wrapping_add(1);
        if self.verbose.load(Ordering::Relaxed) {
            log::trace!(
                "simulated {} frame {} ready",
                handle.config.kind,
                handle.sequence
            );
        }
        ResultInfo {
            sequence_number: handle.sequence,
            data_saturated: false,
        }
    }
}

impl<S: Sleeper> SensingRuntime for SimulatedRuntime<S> {
    type Config = SimulatedConfig;
    type Handle = SimulatedHandle;

    fn init_driver_hal(&self) -> Result<(), RuntimeError> {
        self.driver_ready.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn activate_runtime(&self, log_level: RuntimeLogLevel) -> Result<(), RuntimeError> {
        if !self.driver_ready.load(Ordering::SeqCst) {
            return Err(RuntimeError::RuntimeActivation(
                "driver HAL is not initialized".to_string(),
            ));
        }
        self.verbose
            .store(log_level == RuntimeLogLevel::Verbose, Ordering::Relaxed);
        self.active.store(true, Ordering::SeqCst);
        log::debug!("simulated runtime activated (log level {:?})", log_level);
        Ok(())
    }

    fn deactivate_runtime(&self) {
        self.active.store(false, Ordering::SeqCst);
        log::debug!("simulated runtime deactivated");
    }

    fn create_configuration(&self, kind: ServiceKind) -> Option<SimulatedConfig> {
        if !self.is_active() {
            log::error!("cannot create {} configuration: runtime not active", kind);
            return None;
        }
        Some(SimulatedConfig::defaults(kind))
    }

    fn destroy_configuration(&self, _config: SimulatedConfig) {}

    fn set_profile(&self, config: &mut SimulatedConfig, profile: u32) {
        config.profile = profile;
    }

    fn set_requested_start(&self, config: &mut SimulatedConfig, start_m: f32) {
        config.start_m = start_m;
    }

    fn set_requested_length(&self, config: &mut SimulatedConfig, length_m: f32) {
        config.length_m = length_m;
    }

    fn set_repetition_mode_streaming(&self, config: &mut SimulatedConfig, frequency: f32) {
        config.frequency = Some(frequency);
    }

    fn set_sensor(&self, config: &mut SimulatedConfig, sensor: u8) {
        config.sensor = sensor;
    }

    fn set_receiver_gain(&self, config: &mut SimulatedConfig, gain: f32) {
        config.gain = gain;
    }

    fn set_requested_bin_count(&self, config: &mut SimulatedConfig, bin_count: u8) {
        config.bin_count = bin_count;
    }

    fn set_running_average_factor(&self, config: &mut SimulatedConfig, factor: f32) {
        config.running_average = factor;
    }

    fn set_iq_output_format(&self, config: &mut SimulatedConfig, format: IqOutputFormat) {
        config.iq_format = format;
    }

    fn create_service(&self, config: &SimulatedConfig) -> Result<SimulatedHandle, RuntimeError> {
        if !self.is_active() {
            return Err(RuntimeError::NotActive);
        }
        config.validate()?;

        let metadata = FrameMetadata {
            start_m: config.start_m,
            length_m: config.length_m,
            data_length: config.data_length(),
        };
        Ok(SimulatedHandle {
            config: config.clone(),
            metadata,
            active: false,
            sequence: 0,
            smoothed: Vec::new(),
        })
    }

    fn metadata(&self, handle: &SimulatedHandle) -> FrameMetadata {
        handle.metadata
    }

    fn activate_service(&self, handle: &mut SimulatedHandle) -> Result<(), RuntimeError> {
        if !self.is_active() {
            return Err(RuntimeError::NotActive);
        }
        handle.active = true;
        Ok(())
    }

    fn deactivate_service(&self, handle: &mut SimulatedHandle) -> Result<(), RuntimeError> {
        if !handle.active {
            return Err(RuntimeError::ServiceDeactivation(
                "service was not active".to_string(),
            ));
        }
        handle.active = false;
        Ok(())
    }

    fn destroy_service(&self, _handle: SimulatedHandle) {}

    fn get_next_power_bins(
        &self,
        handle: &mut SimulatedHandle,
        data: &mut [u16],
    ) -> Result<ResultInfo, RuntimeError> {
        handle.check(ServiceKind::PowerBins, data.len())?;
        let info = self.next_frame(handle);

        let config = &handle.config;
        let bin_width = config.length_m / data.len() as f32;
        for (bin, value) in data.iter_mut().enumerate() {
            let center = config.start_m + (bin as f32 + 0.5) * bin_width;
            let echo = config.echo(center, bin, info.sequence_number);
            *value = echo.round().clamp(0.0, u16::MAX as f32) as u16;
        }
        Ok(info)
    }

    fn get_next_envelope(
        &self,
        handle: &mut SimulatedHandle,
        data: &mut [f32],
    ) -> Result<ResultInfo, RuntimeError> {
        handle.check(ServiceKind::Envelope, data.len())?;
        let info = self.next_frame(handle);

        let factor = handle.config.running_average;
        let first = handle.smoothed.is_empty();
        if first {
            handle.smoothed = vec![0.0; data.len()];
        }
        for (i, value) in data.iter_mut().enumerate() {
            let distance = handle.config.start_m + i as f32 * SAMPLE_SPACING_M;
            let raw = handle.config.echo(distance, i, info.sequence_number);
            let smoothed = if first {
                raw
            } else {
                factor * handle.smoothed[i] + (1.0 - factor) * raw
            };
            handle.smoothed[i] = smoothed;
            *value = smoothed;
        }
        Ok(info)
    }

    fn get_next_iq(
        &self,
        handle: &mut SimulatedHandle,
        data: &mut [Complex32],
    ) -> Result<ResultInfo, RuntimeError> {
        handle.check(ServiceKind::Iq, data.len())?;
        if handle.config.iq_format != IqOutputFormat::FloatComplex {
            return Err(RuntimeError::Retrieval(
                "service delivers int16 IQ data, float buffer given".to_string(),
            ));
        }
        let info = self.next_frame(handle);

        for (i, value) in data.iter_mut().enumerate() {
            let distance = handle.config.start_m + i as f32 * SAMPLE_SPACING_M;
            let magnitude = handle.config.echo(distance, i, info.sequence_number) / PEAK_AMPLITUDE;
            let phase = 4.0 * PI * distance / WAVELENGTH_M;
            *value = Complex32::from_polar(magnitude, phase);
        }
        Ok(info)
    }
}

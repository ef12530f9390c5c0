//! Capability interface of the external sensing runtime.
//!
//! The runtime owns configuration objects and live services; callers only hold
//! the opaque `Config` and `Handle` values it hands out and pass them back.

use num_complex::Complex32;
use thiserror::Error;

use crate::types::{FrameMetadata, IqOutputFormat, ResultInfo, RuntimeLogLevel, ServiceKind};

/// Errors reported by a sensing runtime.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RuntimeError {
    #[error("driver HAL initialization failed: {0}")]
    DriverInit(String),

    #[error("runtime activation failed: {0}")]
    RuntimeActivation(String),

    #[error("sensing runtime is not active")]
    NotActive,

    #[error("invalid service configuration: {0}")]
    InvalidConfiguration(String),

    #[error("service activation failed: {0}")]
    ServiceActivation(String),

    #[error("service deactivation failed: {0}")]
    ServiceDeactivation(String),

    #[error("service is not active")]
    ServiceNotActive,

    #[error("service produces {actual} data, not {expected}")]
    KindMismatch {
        expected: ServiceKind,
        actual: ServiceKind,
    },

    #[error("frame buffer holds {actual} elements, service delivers {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("frame retrieval failed: {0}")]
    Retrieval(String),
}

/// Trait for driving a sensing runtime.
///
/// `init_driver_hal` and `activate_runtime` must succeed before any
/// configuration or service call is made.
pub trait SensingRuntime {
    /// Opaque configuration object for one service kind.
    type Config;
    /// Opaque live service.
    type Handle;

    /// Initialize the hardware abstraction layer. Idempotent.
    fn init_driver_hal(&self) -> Result<(), RuntimeError>;

    /// Activate the runtime with the given log level.
    fn activate_runtime(&self, log_level: RuntimeLogLevel) -> Result<(), RuntimeError>;

    /// Deactivate the runtime.
    fn deactivate_runtime(&self);

    /// Create a configuration for `kind` populated with runtime defaults.
    ///
    /// Returns `None` if the runtime cannot provide one.
    fn create_configuration(&self, kind: ServiceKind) -> Option<Self::Config>;

    /// Release a configuration.
    fn destroy_configuration(&self, config: Self::Config);

    /// Select a service profile by its 1-based index.
    fn set_profile(&self, config: &mut Self::Config, profile: u32);

    /// Set the requested start of the measured range in meters.
    fn set_requested_start(&self, config: &mut Self::Config, start_m: f32);

    /// Set the requested length of the measured range in meters.
    fn set_requested_length(&self, config: &mut Self::Config, length_m: f32);

    /// Stream frames at a fixed rate in Hz.
    fn set_repetition_mode_streaming(&self, config: &mut Self::Config, frequency: f32);

    /// Select the sensor id.
    fn set_sensor(&self, config: &mut Self::Config, sensor: u8);

    /// Set the receiver gain in [0, 1].
    fn set_receiver_gain(&self, config: &mut Self::Config, gain: f32);

    /// Set the number of bins of a power bins configuration.
    fn set_requested_bin_count(&self, config: &mut Self::Config, bin_count: u8);

    /// Set the time-domain smoothing factor of an envelope configuration.
    fn set_running_average_factor(&self, config: &mut Self::Config, factor: f32);

    /// Select the sample representation of an IQ configuration.
    fn set_iq_output_format(&self, config: &mut Self::Config, format: IqOutputFormat);

    /// Create a service from a configuration. The runtime validates it here.
    fn create_service(&self, config: &Self::Config) -> Result<Self::Handle, RuntimeError>;

    /// Shape of the frames the service delivers.
    fn metadata(&self, handle: &Self::Handle) -> FrameMetadata;

    /// Start the service.
    fn activate_service(&self, handle: &mut Self::Handle) -> Result<(), RuntimeError>;

    /// Stop the service.
    fn deactivate_service(&self, handle: &mut Self::Handle) -> Result<(), RuntimeError>;

    /// Release a service.
    fn destroy_service(&self, handle: Self::Handle);

    /// Block until the next power bins frame is available.
    fn get_next_power_bins(
        &self,
        handle: &mut Self::Handle,
        data: &mut [u16],
    ) -> Result<ResultInfo, RuntimeError>;

    /// Block until the next envelope frame is available.
    fn get_next_envelope(
        &self,
        handle: &mut Self::Handle,
        data: &mut [f32],
    ) -> Result<ResultInfo, RuntimeError>;

    /// Block until the next IQ frame is available.
    fn get_next_iq(
        &self,
        handle: &mut Self::Handle,
        data: &mut [Complex32],
    ) -> Result<ResultInfo, RuntimeError>;
}

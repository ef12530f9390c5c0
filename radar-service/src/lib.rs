//! Sensing runtime boundary for the radar data logger.
//!
//! This crate provides:
//! - Service kinds, frame metadata and per-frame result info
//! - `SensingRuntime` trait covering configuration, service lifecycle and polling
//! - `MockRuntime` for testing and `SimulatedRuntime` for running without hardware
//! - `Sleeper` abstraction used to pace simulated frames

pub mod mock;
pub mod runtime;
pub mod simulated;
pub mod sleeper;
pub mod types;

pub use mock::{MockConfig, MockHandle, MockRuntime, RuntimeEvent};
pub use num_complex::Complex32;
pub use runtime::{RuntimeError, SensingRuntime};
pub use simulated::{SimulatedConfig, SimulatedHandle, SimulatedRuntime};
pub use sleeper::{MockSleeper, RealSleeper, Sleeper};
pub use types::{FrameMetadata, IqOutputFormat, ResultInfo, RuntimeLogLevel, ServiceKind};

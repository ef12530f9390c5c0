//! The immutable description of one logging run.

use radar_service::ServiceKind;
use radar_sink::Destination;

use crate::cli::{
    DEFAULT_BIN_COUNT, DEFAULT_FREQUENCY, DEFAULT_RANGE_END, DEFAULT_RANGE_START, DEFAULT_SENSOR,
};

/// When the acquisition loop stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Poll until the termination signal is raised.
    UntilInterrupt,
    /// Emit exactly this many frames. The termination signal is not consulted.
    Count(u16),
}

/// Parameters of one run, derived once from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRequest {
    /// Service kind to run.
    pub kind: ServiceKind,
    /// Sensor id in [1, 4].
    pub sensor: u8,
    /// Start of the measured range in meters.
    pub range_start_m: f32,
    /// End of the measured range in meters. May lie before the start.
    pub range_end_m: f32,
    /// Update rate in frames per second.
    pub frequency: f32,
    /// Receiver gain in [0, 1]; `None` keeps the runtime default.
    pub gain: Option<f32>,
    /// 1-based profile index; 0 keeps the runtime default.
    pub profile: u32,
    /// Smoothing factor in [0, 1]; `None` keeps the runtime default.
    pub running_average: Option<f32>,
    /// Number of bins, power bins only.
    pub bin_count: u8,
    /// Fixed frame count or run until interrupted.
    pub termination: Termination,
    /// Stdout or an output file.
    pub destination: Destination,
}

impl RunRequest {
    /// A request for `kind` with every other parameter at its command-line default.
    pub fn for_kind(kind: ServiceKind) -> Self {
        Self {
            kind,
            sensor: DEFAULT_SENSOR,
            range_start_m: DEFAULT_RANGE_START,
            range_end_m: DEFAULT_RANGE_END,
            frequency: DEFAULT_FREQUENCY,
            gain: None,
            profile: 0,
            running_average: None,
            bin_count: DEFAULT_BIN_COUNT,
            termination: Termination::UntilInterrupt,
            destination: Destination::Stdout,
        }
    }

    /// Length of the measured range. Negative when the end lies before the start.
    pub fn length_m(&self) -> f32 {
        self.range_end_m - self.range_start_m
    }

    /// The explicitly requested profile, if any.
    pub fn explicit_profile(&self) -> Option<u32> {
        (self.profile > 0).then_some(self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_for_kind_uses_defaults() {
        let request = RunRequest::for_kind(ServiceKind::Envelope);
        assert_eq!(request.kind, ServiceKind::Envelope);
        assert_eq!(request.sensor, 1);
        assert_eq!(request.frequency, 10.0);
        assert_eq!(request.bin_count, 10);
        assert_eq!(request.gain, None);
        assert_eq!(request.running_average, None);
        assert_eq!(request.termination, Termination::UntilInterrupt);
        assert_eq!(request.destination, Destination::Stdout);
    }

    #[test]
    fn test_length() {
        let mut request = RunRequest::for_kind(ServiceKind::PowerBins);
        request.range_start_m = 0.2;
        request.range_end_m = 0.7;
        assert!((request.length_m() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_length_negative_when_end_before_start() {
        let mut request = RunRequest::for_kind(ServiceKind::PowerBins);
        request.range_start_m = 0.5;
        request.range_end_m = 0.3;
        assert!(request.length_m() < 0.0);
    }

    #[test]
    fn test_explicit_profile() {
        let mut request = RunRequest::for_kind(ServiceKind::Iq);
        assert_eq!(request.explicit_profile(), None);
        request.profile = 3;
        assert_eq!(request.explicit_profile(), Some(3));
    }
}

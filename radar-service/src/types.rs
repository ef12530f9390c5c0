//! Value types shared between the runtime boundary and its callers.

use std::fmt;

/// The measurement kind a service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceKind {
    /// Scalar bins: the range is split into a few integer-valued bins.
    PowerBins,
    /// Magnitude of the reflected signal per sample point.
    Envelope,
    /// Complex (I/Q) samples per sample point.
    Iq,
}

impl ServiceKind {
    /// Map the numeric service type used on the command line.
    ///
    /// `0` is power bins, `1` envelope and `2` IQ.
    pub fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(ServiceKind::PowerBins),
            1 => Some(ServiceKind::Envelope),
            2 => Some(ServiceKind::Iq),
            _ => None,
        }
    }

    /// Short lowercase name, used in log and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ServiceKind::PowerBins => "power bins",
            ServiceKind::Envelope => "envelope",
            ServiceKind::Iq => "iq",
        }
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Shape of the frames a created service delivers.
///
/// Queried once after the service is created; `data_length` does not change
/// for the lifetime of the service.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMetadata {
    /// Actual start of the measured range in meters.
    pub start_m: f32,
    /// Actual length of the measured range in meters.
    pub length_m: f32,
    /// Number of elements in one frame (bins or sample points).
    pub data_length: usize,
}

/// Per-frame status reported by the runtime alongside the data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResultInfo {
    /// Running frame counter, starting at 1 for the first frame of a service.
    pub sequence_number: u32,
    /// The receiver saturated while sampling this frame.
    pub data_saturated: bool,
}

/// Representation of IQ samples delivered by the runtime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum IqOutputFormat {
    /// Interleaved 16-bit integers (runtime default).
    #[default]
    Int16Complex,
    /// Single precision complex floats.
    FloatComplex,
}

/// Log level handed to the runtime when it is activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub enum RuntimeLogLevel {
    /// Only errors are reported.
    #[default]
    Error,
    /// Everything, including per-frame diagnostics.
    Verbose,
}

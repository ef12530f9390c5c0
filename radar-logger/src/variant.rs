//! Service variants and frame formatting.
//!
//! Each measurement kind implements `ServiceVariant`: the configuration
//! setters specific to it, the runtime call that polls its frames and the
//! rendering of one sample. The acquisition loop is written once over this
//! trait.

use std::fmt::Write;

use radar_service::{
    Complex32, IqOutputFormat, ResultInfo, RuntimeError, SensingRuntime, ServiceKind,
};

use crate::logger::Logger;
use crate::request::RunRequest;

/// One measurement kind.
pub trait ServiceVariant {
    /// Element type of a frame.
    type Sample: Copy + Default;

    /// Kind served by this variant.
    const KIND: ServiceKind;

    /// Apply the kind-specific configuration setters.
    fn configure<R, L>(runtime: &R, config: &mut R::Config, request: &RunRequest, logger: &L)
    where
        R: SensingRuntime,
        L: Logger;

    /// Block until the next frame is written into `frame`.
    fn poll<R: SensingRuntime>(
        runtime: &R,
        handle: &mut R::Handle,
        frame: &mut [Self::Sample],
    ) -> Result<ResultInfo, RuntimeError>;

    /// Append one sample and its trailing tab to `line`.
    fn write_sample(line: &mut String, sample: &Self::Sample);
}

/// Render a frame as one tab-separated, newline-terminated line.
pub fn format_frame<V: ServiceVariant>(frame: &[V::Sample]) -> String {
    let mut line = String::with_capacity(frame.len() * 8 + 1);
    for sample in frame {
        V::write_sample(&mut line, sample);
    }
    line.push('\n');
    line
}

/// Power bins: one unsigned magnitude per bin.
#[derive(Debug, Clone, Copy, Default)]
pub struct PowerBins;

impl ServiceVariant for PowerBins {
    type Sample = u16;
    const KIND: ServiceKind = ServiceKind::PowerBins;

    fn configure<R, L>(runtime: &R, config: &mut R::Config, request: &RunRequest, _logger: &L)
    where
        R: SensingRuntime,
        L: Logger,
    {
        runtime.set_requested_bin_count(config, request.bin_count);
    }

    fn poll<R: SensingRuntime>(
        runtime: &R,
        handle: &mut R::Handle,
        frame: &mut [u16],
    ) -> Result<ResultInfo, RuntimeError> {
        runtime.get_next_power_bins(handle, frame)
    }

    fn write_sample(line: &mut String, sample: &u16) {
        let _ = write!(line, "{}\t", sample);
    }
}

/// Envelope: amplitude per range sample, logged rounded to the nearest integer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Envelope;

impl ServiceVariant for Envelope {
    type Sample = f32;
    const KIND: ServiceKind = ServiceKind::Envelope;

    fn configure<R, L>(runtime: &R, config: &mut R::Config, request: &RunRequest, logger: &L)
    where
        R: SensingRuntime,
        L: Logger,
    {
        if let Some(factor) = request.running_average {
            logger.info(&format!("using running avg: {}", factor));
            runtime.set_running_average_factor(config, factor);
        }
    }

    fn poll<R: SensingRuntime>(
        runtime: &R,
        handle: &mut R::Handle,
        frame: &mut [f32],
    ) -> Result<ResultInfo, RuntimeError> {
        runtime.get_next_envelope(handle, frame)
    }

    fn write_sample(line: &mut String, sample: &f32) {
        // Saturating cast: negative and NaN amplitudes log as 0.
        let _ = write!(line, "{}\t", (sample + 0.5) as u32);
    }
}

/// IQ: complex sample per range point, logged as real and imaginary parts.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iq;

impl ServiceVariant for Iq {
    type Sample = Complex32;
    const KIND: ServiceKind = ServiceKind::Iq;

    fn configure<R, L>(runtime: &R, config: &mut R::Config, request: &RunRequest, logger: &L)
    where
        R: SensingRuntime,
        L: Logger,
    {
        runtime.set_iq_output_format(config, IqOutputFormat::FloatComplex);
        if let Some(factor) = request.running_average {
            logger.debug(&format!(
                "running avg {} ignored: only used by the envelope service",
                factor
            ));
        }
    }

    fn poll<R: SensingRuntime>(
        runtime: &R,
        handle: &mut R::Handle,
        frame: &mut [Complex32],
    ) -> Result<ResultInfo, RuntimeError> {
        runtime.get_next_iq(handle, frame)
    }

    fn write_sample(line: &mut String, sample: &Complex32) {
        let _ = write!(line, "{:.6}\t{:.6}\t", sample.re, sample.im);
    }
}

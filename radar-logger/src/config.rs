//! Configuration builder.
//!
//! Turns a `RunRequest` into a runtime configuration for one service kind.
//! Unset optional parameters are never passed to the runtime, so its own
//! defaults stay in effect.

use radar_service::SensingRuntime;

use crate::acquisition::AcquisitionError;
use crate::logger::Logger;
use crate::request::RunRequest;
use crate::variant::ServiceVariant;

/// Create and populate a configuration for variant `V`.
///
/// The caller owns the returned configuration and must hand it back to
/// `SensingRuntime::destroy_configuration`.
pub fn build_configuration<V, R, L>(
    runtime: &R,
    request: &RunRequest,
    logger: &L,
) -> Result<R::Config, AcquisitionError>
where
    V: ServiceVariant,
    R: SensingRuntime,
    L: Logger,
{
    let mut config = runtime
        .create_configuration(V::KIND)
        .ok_or(AcquisitionError::ConfigCreationFailed(V::KIND))?;

    if let Some(profile) = request.explicit_profile() {
        runtime.set_profile(&mut config, profile);
    }

    let length_m = request.length_m();
    if length_m <= 0.0 {
        logger.verbose(&format!(
            "range end {} m is not after range start {} m, requesting length {} m",
            request.range_end_m, request.range_start_m, length_m
        ));
    }
    runtime.set_requested_start(&mut config, request.range_start_m);
    runtime.set_requested_length(&mut config, length_m);
    runtime.set_repetition_mode_streaming(&mut config, request.frequency);
    runtime.set_sensor(&mut config, request.sensor);

    if let Some(gain) = request.gain {
        runtime.set_receiver_gain(&mut config, gain);
    }

    V::configure(runtime, &mut config, request, logger);

    logger.debug(&format!(
        "{} configuration: start {} m, length {} m, {} Hz, sensor {}",
        V::KIND,
        request.range_start_m,
        length_m,
        request.frequency,
        request.sensor
    ));

    Ok(config)
}

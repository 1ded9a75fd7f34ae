//! Synthetic LII signals from simulated cooling curves.

use lii_core::units::nm_to_m;
use lii_materials::MaterialProperties;
use lii_models::CoolingTrace;
use lii_signal::{Signal, SignalType};

use crate::error::{FitError, FitResult};
use crate::planck::planck_intensity_scaled;

/// Incandescence of a cooling particle at one wavelength.
///
/// `I(t) = C · (dp(t)/dp(0))³ · E(m)/λ · planck(λ, T(t))`; the volume ratio keeps
/// `C` equal to the scaling factor recovered by the pyrometric functions.
pub fn cooling_signal(
    trace: &CoolingTrace,
    material: &dyn MaterialProperties,
    wavelength_nm: f64,
    scaling: f64,
    signal_type: SignalType,
    channel_id: u32,
) -> FitResult<Signal> {
    let (Some(t0), Some(dp0)) = (trace.time.first(), trace.diameter.first()) else {
        return Err(FitError::InvalidArg {
            what: "cooling trace is empty",
        });
    };
    if *dp0 <= 0.0 {
        return Err(FitError::InvalidArg {
            what: "initial diameter must be positive",
        });
    }
    let wavelength = nm_to_m(wavelength_nm);
    let em = material.em(wavelength)?;
    let dt = match trace.time.get(1) {
        Some(t1) => t1 - t0,
        None => 0.0,
    };
    let data = trace
        .temperature
        .iter()
        .zip(&trace.diameter)
        .map(|(t, dp)| planck_intensity_scaled(wavelength, *t, scaling * (dp / dp0).powi(3), em))
        .collect();
    Ok(Signal::with_data(signal_type, channel_id, *t0, dt, data))
}

/// Noise-free channel intensities of a particle at temperature `t`.
pub fn spectrum_samples(
    wavelengths_nm: &[f64],
    temperature: f64,
    scaling: f64,
    material: &dyn MaterialProperties,
) -> FitResult<Vec<f64>> {
    wavelengths_nm
        .iter()
        .map(|w| {
            let wavelength = nm_to_m(*w);
            Ok(planck_intensity_scaled(wavelength, temperature, scaling, material.em(wavelength)?))
        })
        .collect()
}

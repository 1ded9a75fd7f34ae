//! Two-color pyrometry.

use lii_core::constants::C2;
use lii_core::units::nm_to_m;
use lii_materials::MaterialProperties;
use lii_signal::{Signal, SignalType};
use tracing::debug;

use crate::TemperatureTrace;
use crate::error::{FitError, FitResult};
use crate::planck::{planck_intensity, planck_intensity_scaled};

const NEWTON_ITERATIONS: usize = 50;
const NEWTON_RTOL: f64 = 1e-12;

/// Temperature from the intensity ratio of two channels (λ in m).
///
/// The Wien approximation provides a closed-form start value which is then
/// refined against the full Planck law.
pub fn two_color_temperature(
    i1: f64,
    i2: f64,
    wavelength1: f64,
    wavelength2: f64,
    em1: f64,
    em2: f64,
) -> FitResult<f64> {
    if !(i1 > 0.0 && i2 > 0.0 && i1.is_finite() && i2.is_finite()) {
        return Err(FitError::NoSolution {
            what: "intensities must be positive",
        });
    }
    if !(em1 > 0.0 && em2 > 0.0) {
        return Err(FitError::InvalidArg {
            what: "absorption function must be positive",
        });
    }
    if wavelength1 <= 0.0 || wavelength2 <= 0.0 || wavelength1 == wavelength2 {
        return Err(FitError::InvalidArg {
            what: "two distinct positive wavelengths are required",
        });
    }

    // ratio of the Planck terms alone
    let target = (i1 / i2 * (em2 / wavelength2) / (em1 / wavelength1)).ln();

    let wien_ratio = target - 5.0 * (wavelength2 / wavelength1).ln();
    let mut t = C2 * (1.0 / wavelength2 - 1.0 / wavelength1) / wien_ratio;
    if !(t.is_finite() && t > 0.0) {
        return Err(FitError::NoSolution {
            what: "intensity ratio implies a non-positive temperature",
        });
    }

    let residual = |t: f64| (planck_intensity(wavelength1, t) / planck_intensity(wavelength2, t)).ln() - target;
    for _ in 0..NEWTON_ITERATIONS {
        let h = t * 1e-6;
        let slope = (residual(t + h) - residual(t - h)) / (2.0 * h);
        if slope == 0.0 || !slope.is_finite() {
            break;
        }
        let step = residual(t) / slope;
        t -= step;
        if !(t.is_finite() && t > 0.0) {
            return Err(FitError::NoSolution {
                what: "Newton refinement left the physical range",
            });
        }
        if step.abs() <= NEWTON_RTOL * t {
            break;
        }
    }
    Ok(t)
}

/// Scaling factor C such that `planck_intensity_scaled(λ, T, C, em) == intensity`.
pub fn two_color_scaling(intensity: f64, wavelength: f64, em: f64, temperature: f64) -> f64 {
    intensity / planck_intensity_scaled(wavelength, temperature, 1.0, em)
}

/// Per-sample two-color temperature of a pair of channel signals.
///
/// Samples without a physical solution (non-positive intensities, e.g. before
/// the laser pulse) yield 0 K and a zero scaling factor.
pub fn calc_two_color(
    s1: &Signal,
    s2: &Signal,
    wavelength1_nm: f64,
    wavelength2_nm: f64,
    material: &dyn MaterialProperties,
) -> FitResult<TemperatureTrace> {
    if s1.is_empty() || s2.is_empty() {
        return Err(FitError::NoActiveChannels);
    }
    if (s1.dt - s2.dt).abs() > s1.dt.abs() * 1e-9 {
        return Err(FitError::ChannelMismatch {
            what: format!("sample spacing {} vs {}", s1.dt, s2.dt),
        });
    }
    let l1 = nm_to_m(wavelength1_nm);
    let l2 = nm_to_m(wavelength2_nm);
    let em1 = material.em(l1)?;
    let em2 = material.em(l2)?;

    let n = s1.len().min(s2.len());
    let mut temperature = Vec::with_capacity(n);
    let mut scaling = Vec::with_capacity(n);
    let mut failed = 0usize;
    for i in 0..n {
        match two_color_temperature(s1.data[i], s2.data[i], l1, l2, em1, em2) {
            Ok(t) => {
                temperature.push(t);
                scaling.push(two_color_scaling(s1.data[i], l1, em1, t));
            }
            Err(_) => {
                failed += 1;
                temperature.push(0.0);
                scaling.push(0.0);
            }
        }
    }
    if failed > 0 {
        debug!(failed, samples = n, "two-color samples without solution");
    }

    let mut t_sig = Signal::with_data(SignalType::Temperature, 0, s1.start_time, s1.dt, temperature);
    t_sig.fit_material = material.name().to_string();
    let c_sig = Signal::with_data(SignalType::Temperature, 0, s1.start_time, s1.dt, scaling);
    Ok(TemperatureTrace {
        temperature: t_sig,
        scaling: c_sig,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_temperature_from_exact_planck_ratio() {
        let (l1, l2) = (650e-9, 780e-9);
        for t in [1500.0, 2500.0, 4000.0] {
            let i1 = planck_intensity_scaled(l1, t, 2.0, 0.35);
            let i2 = planck_intensity_scaled(l2, t, 2.0, 0.35);
            let got = two_color_temperature(i1, i2, l1, l2, 0.35, 0.35).unwrap();
            assert!((got - t).abs() / t < 1e-9, "{got} vs {t}");
            assert!((two_color_scaling(i1, l1, 0.35, got) - 2.0).abs() < 1e-6);
        }
    }

    #[test]
    fn rejects_non_positive_intensity() {
        assert!(matches!(
            two_color_temperature(0.0, 1.0, 650e-9, 780e-9, 0.35, 0.35),
            Err(FitError::NoSolution { .. })
        ));
    }
}

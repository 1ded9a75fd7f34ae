//! Absorption function E(m) as a function of wavelength.

use lii_core::constants::SPEED_OF_LIGHT;
use lii_core::interpolate_linear;
use nalgebra::Complex;

/// E(m) = Im((m^2 - 1)/(m^2 + 2)) of the particle material.
///
/// Wavelengths are in meters.
#[derive(Debug, Clone, PartialEq)]
pub enum AbsorptionFunction {
    Constant(f64),
    /// `c0 + c1*λ + c2*λ^2 + ...` with λ in meters.
    Polynomial(Vec<f64>),
    /// `(λ [m], E(m))` pairs, linear interpolation, clamped at the ends.
    Tabulated(Vec<(f64, f64)>),
    /// Free-electron dielectric function
    /// `ε(ω) = ε_inf - ω_p² / (ω² + iω/τ)`.
    Drude {
        /// Plasma frequency ω_p [rad/s]
        plasma_frequency: f64,
        /// Electron relaxation time τ [s]
        relaxation_time: f64,
        epsilon_inf: f64,
    },
}

impl AbsorptionFunction {
    pub fn eval(&self, wavelength: f64) -> f64 {
        match self {
            AbsorptionFunction::Constant(e) => *e,
            AbsorptionFunction::Polynomial(coeffs) => coeffs
                .iter()
                .rev()
                .fold(0.0, |acc, c| acc * wavelength + c),
            AbsorptionFunction::Tabulated(table) => {
                interpolate_linear(table, wavelength).unwrap_or(f64::NAN)
            }
            AbsorptionFunction::Drude {
                plasma_frequency,
                relaxation_time,
                epsilon_inf,
            } => {
                let eps = drude_permittivity(
                    wavelength,
                    *plasma_frequency,
                    *relaxation_time,
                    *epsilon_inf,
                );
                let one = Complex::new(1.0, 0.0);
                let two = Complex::new(2.0, 0.0);
                ((eps - one) / (eps + two)).im
            }
        }
    }
}

/// Complex permittivity of a free-electron gas at the given wavelength [m].
pub fn drude_permittivity(
    wavelength: f64,
    plasma_frequency: f64,
    relaxation_time: f64,
    epsilon_inf: f64,
) -> Complex<f64> {
    let omega = 2.0 * std::f64::consts::PI * SPEED_OF_LIGHT / wavelength;
    let denom = Complex::new(omega * omega, omega / relaxation_time);
    Complex::new(epsilon_inf, 0.0) - Complex::new(plasma_frequency * plasma_frequency, 0.0) / denom
}

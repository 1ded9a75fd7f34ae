//! Gas-kinetic building blocks shared by the heat transfer closures.
//!
//! All quantities SI: diameters in m, pressures in Pa, temperatures in K,
//! heat rates in W, mass rates in kg/s.

use lii_core::constants::{GAS_CONSTANT_R, STEFAN_BOLTZMANN};
use std::f64::consts::PI;

/// Free-molecular heat conduction
/// `α π dp² p c̄ / 8 · f · (T/Tg − 1)` where `f = (γ+1)/(γ−1)`.
pub fn free_molecular_conduction(
    alpha: f64,
    dp: f64,
    gas_pressure: f64,
    c_tg: f64,
    heat_capacity_factor: f64,
    t: f64,
    tg: f64,
) -> f64 {
    alpha * PI * dp * dp * gas_pressure * c_tg / 8.0 * heat_capacity_factor * (t / tg - 1.0)
}

/// `(γ+1)/(γ−1)`
pub fn gamma_factor(gamma: f64) -> f64 {
    (gamma + 1.0) / (gamma - 1.0)
}

/// Hertz-Knudsen evaporation mass flux off a sphere [kg/s], positive for loss.
pub fn hertz_knudsen_mass_loss(theta_e: f64, dp: f64, vapor_pressure: f64, molar_mass_v: f64, t: f64) -> f64 {
    theta_e * PI * dp * dp * vapor_pressure * (molar_mass_v / (2.0 * PI * GAS_CONSTANT_R * t)).sqrt()
}

/// Kelvin equation enhancement of the vapor pressure above a curved surface.
pub fn kelvin_factor(surface_tension: f64, molar_mass_v: f64, t: f64, rho_p: f64, dp: f64) -> f64 {
    (4.0 * surface_tension * molar_mass_v / (GAS_CONSTANT_R * t * rho_p * dp)).exp()
}

/// Gray-body thermal radiation of a sphere.
pub fn gray_body_radiation(eps: f64, dp: f64, t: f64, tg: f64) -> f64 {
    PI * dp * dp * eps * STEFAN_BOLTZMANN * (t.powi(4) - tg.powi(4))
}

/// Sphere mass.
pub fn sphere_mass(rho_p: f64, dp: f64) -> f64 {
    rho_p * PI * dp.powi(3) / 6.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monatomic_gamma_factor_is_four() {
        assert!((gamma_factor(5.0 / 3.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn no_conduction_at_gas_temperature() {
        assert_eq!(free_molecular_conduction(0.3, 20e-9, 1e5, 600.0, 4.0, 1500.0, 1500.0), 0.0);
    }

    #[test]
    fn kelvin_factor_grows_for_small_particles() {
        let small = kelvin_factor(1.0, 0.056, 2500.0, 7000.0, 2e-9);
        let large = kelvin_factor(1.0, 0.056, 2500.0, 7000.0, 200e-9);
        assert!(small > large && large > 1.0);
    }
}

//! Planck radiation law and detector-bandpass integration.

use lii_core::constants::{C1, C2};

/// Nodes of the composite Simpson rule over a detector bandpass.
pub const BANDPASS_NODES: usize = 21;

/// Spectral radiance `C1 / λ⁵ / (exp(C2/(λT)) − 1)` with λ in m, T in K.
pub fn planck_intensity(wavelength: f64, temperature: f64) -> f64 {
    let x = C2 / (wavelength * temperature);
    C1 / wavelength.powi(5) / x.exp_m1()
}

/// LII signal model `C · E(m)/λ · planck(λ, T)`.
pub fn planck_intensity_scaled(wavelength: f64, temperature: f64, scaling: f64, em: f64) -> f64 {
    scaling * em / wavelength * planck_intensity(wavelength, temperature)
}

/// Planck intensity averaged over `[λ − w/2, λ + w/2]`; point value for `w <= 0`.
pub fn bandpass_intensity(wavelength: f64, width: f64, temperature: f64) -> f64 {
    if width <= 0.0 {
        return planck_intensity(wavelength, temperature);
    }
    let intervals = BANDPASS_NODES - 1;
    let h = width / intervals as f64;
    let start = wavelength - 0.5 * width;
    let mut sum = 0.0;
    for i in 0..BANDPASS_NODES {
        let weight = if i == 0 || i == intervals {
            1.0
        } else if i % 2 == 1 {
            4.0
        } else {
            2.0
        };
        sum += weight * planck_intensity(start + h * i as f64, temperature);
    }
    sum * h / 3.0 / width
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wien_peak_near_displacement_law() {
        // Wien: λ_max T ≈ 2.898e-3 m K
        let t = 2500.0;
        let peak = 2.897_771_955e-3 / t;
        let at_peak = planck_intensity(peak, t);
        assert!(at_peak > planck_intensity(peak * 0.95, t));
        assert!(at_peak > planck_intensity(peak * 1.05, t));
    }

    #[test]
    fn hotter_is_brighter() {
        assert!(planck_intensity(650e-9, 3000.0) > planck_intensity(650e-9, 2500.0));
    }

    #[test]
    fn narrow_bandpass_matches_point_value() {
        let point = planck_intensity(650e-9, 2500.0);
        let band = bandpass_intensity(650e-9, 1e-9, 2500.0);
        assert!((band - point).abs() / point < 1e-4);
        assert_eq!(bandpass_intensity(650e-9, 0.0, 2500.0), point);
    }
}

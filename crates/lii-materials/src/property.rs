//! Temperature-dependent property functions.

use lii_core::interpolate_linear;

/// A scalar property as a function of temperature [K].
#[derive(Debug, Clone, PartialEq)]
pub enum Property {
    Constant(f64),
    /// `c0 + c1*T + c2*T^2 + ...`
    Polynomial(Vec<f64>),
    /// `a * exp(b / T)`, e.g. a Clausius-Clapeyron vapor pressure with `b = -H_v/R`.
    Exponential { a: f64, b: f64 },
    /// Segments `(t_max, property)` sorted by `t_max`; the last segment extends to infinity.
    Piecewise(Vec<(f64, Property)>),
    /// `(T, value)` pairs, linear interpolation, clamped at the ends.
    Tabulated(Vec<(f64, f64)>),
}

impl Property {
    pub fn eval(&self, t: f64) -> f64 {
        match self {
            Property::Constant(c) => *c,
            Property::Polynomial(coeffs) => coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c),
            Property::Exponential { a, b } => a * (b / t).exp(),
            Property::Piecewise(segments) => segments
                .iter()
                .find(|(t_max, _)| t <= *t_max)
                .or_else(|| segments.last())
                .map(|(_, p)| p.eval(t))
                .unwrap_or(f64::NAN),
            Property::Tabulated(table) => interpolate_linear(table, t).unwrap_or(f64::NAN),
        }
    }

    /// Clausius-Clapeyron vapor pressure through a reference point.
    ///
    /// `p(T) = p_ref * exp(-h_v/R * (1/T - 1/t_ref))` with `h_v` in J/mol.
    pub fn clausius_clapeyron(p_ref: f64, t_ref: f64, h_v: f64) -> Self {
        let b = -h_v / lii_core::constants::GAS_CONSTANT_R;
        Property::Exponential {
            a: p_ref * (-b / t_ref).exp(),
            b,
        }
    }
}

impl From<f64> for Property {
    fn from(value: f64) -> Self {
        Property::Constant(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn polynomial_uses_ascending_powers() {
        let p = Property::Polynomial(vec![1.0, 2.0, 3.0]);
        assert_eq!(p.eval(2.0), 1.0 + 4.0 + 12.0);
    }

    #[test]
    fn piecewise_picks_segment() {
        let p = Property::Piecewise(vec![
            (1000.0, Property::Constant(1.0)),
            (2000.0, Property::Constant(2.0)),
        ]);
        assert_eq!(p.eval(500.0), 1.0);
        assert_eq!(p.eval(1500.0), 2.0);
        assert_eq!(p.eval(5000.0), 2.0);
    }

    #[test]
    fn clausius_clapeyron_passes_reference_point() {
        let p = Property::clausius_clapeyron(101_325.0, 3000.0, 4.0e5);
        let v = p.eval(3000.0);
        assert!((v - 101_325.0).abs() / 101_325.0 < 1e-12);
        assert!(p.eval(2500.0) < v);
    }
}

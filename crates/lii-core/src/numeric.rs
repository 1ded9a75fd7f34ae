use crate::{LiiError, LiiResult};

pub type Real = f64;

/// Closeness bounds: a pair passes when either bound holds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerances {
    pub abs: Real,
    pub rel: Real,
}

impl Tolerances {
    pub const STRICT: Self = Self { abs: 1e-12, rel: 1e-9 };

    pub const fn uniform(bound: Real) -> Self {
        Self { abs: bound, rel: bound }
    }
}

impl Default for Tolerances {
    fn default() -> Self {
        Self::STRICT
    }
}

pub fn nearly_equal(a: Real, b: Real, tol: Tolerances) -> bool {
    let scale = a.abs().max(b.abs());
    (a - b).abs() <= tol.abs.max(tol.rel * scale)
}

/// Finite and strictly positive (temperatures, diameters, wavelengths).
pub fn ensure_positive(value: Real, what: &'static str) -> LiiResult<Real> {
    if value.is_finite() && value > 0.0 {
        Ok(value)
    } else {
        Err(LiiError::NonPhysical { what, value })
    }
}

/// Arithmetic mean, `None` for an empty slice.
pub fn mean(values: &[Real]) -> Option<Real> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<Real>() / values.len() as Real)
}

/// Sample standard deviation (n - 1), `None` below two values.
pub fn sample_stdev(values: &[Real]) -> Option<Real> {
    if values.len() < 2 {
        return None;
    }
    let mu = mean(values)?;
    let var = values.iter().map(|v| (v - mu).powi(2)).sum::<Real>() / (values.len() - 1) as Real;
    Some(var.sqrt())
}

/// Linear interpolation in a table sorted by ascending `x`; clamps outside the table.
pub fn interpolate_linear(table: &[(Real, Real)], x: Real) -> Option<Real> {
    let (first, last) = (table.first()?, table.last()?);
    if x <= first.0 {
        return Some(first.1);
    }
    if x >= last.0 {
        return Some(last.1);
    }
    let upper = table.iter().position(|(xi, _)| *xi >= x)?;
    let (x0, y0) = table[upper - 1];
    let (x1, y1) = table[upper];
    if x1 == x0 {
        return Some(y0);
    }
    Some(y0 + (y1 - y0) * (x - x0) / (x1 - x0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn closeness_is_symmetric(a in -1e6f64..1e6, b in -1e6f64..1e6, bound in 0.0f64..1.0) {
            let tol = Tolerances::uniform(bound);
            prop_assert_eq!(nearly_equal(a, b, tol), nearly_equal(b, a, tol));
            prop_assert!(nearly_equal(a, a, Tolerances::STRICT));
        }

        #[test]
        fn interpolation_stays_within_neighbours(
            ys in prop::collection::vec(-1e3f64..1e3, 2..12),
            x in -5.0f64..20.0,
        ) {
            let table: Vec<(Real, Real)> = ys.iter().enumerate().map(|(i, y)| (i as Real, *y)).collect();
            let value = interpolate_linear(&table, x).unwrap();
            let lo = ys.iter().copied().fold(Real::INFINITY, Real::min);
            let hi = ys.iter().copied().fold(Real::NEG_INFINITY, Real::max);
            prop_assert!(value >= lo - 1e-9 && value <= hi + 1e-9);
        }
    }

    #[test]
    fn closeness_uses_the_looser_bound() {
        assert!(nearly_equal(2500.0, 2500.0 + 1e-7, Tolerances::STRICT));
        assert!(nearly_equal(0.0, 5e-13, Tolerances::STRICT));
        assert!(!nearly_equal(2500.0, 2500.1, Tolerances::STRICT));
        assert!(nearly_equal(1.0, 1.05, Tolerances::uniform(0.1)));
    }

    #[test]
    fn positivity_rejects_zero_and_nan() {
        assert_eq!(ensure_positive(30e-9, "diameter"), Ok(30e-9));
        assert!(matches!(
            ensure_positive(0.0, "diameter"),
            Err(LiiError::NonPhysical { what: "diameter", .. })
        ));
        assert!(ensure_positive(Real::NAN, "temperature").is_err());
    }

    #[test]
    fn stdev_of_constant_is_zero() {
        assert_eq!(sample_stdev(&[2.0, 2.0, 2.0]), Some(0.0));
        assert_eq!(sample_stdev(&[1.0]), None);
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn interpolation_clamps_and_blends() {
        let table = [(0.0, 0.0), (1.0, 10.0), (3.0, 30.0)];
        assert_eq!(interpolate_linear(&table, -1.0), Some(0.0));
        assert_eq!(interpolate_linear(&table, 0.5), Some(5.0));
        assert_eq!(interpolate_linear(&table, 2.0), Some(20.0));
        assert_eq!(interpolate_linear(&table, 9.0), Some(30.0));
        assert_eq!(interpolate_linear(&[], 1.0), None);
    }
}

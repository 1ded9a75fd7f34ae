use std::any::Any;

use lii_signal::Signal;
use nalgebra::DMatrix;

use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Least-squares polynomial smoothing over a sliding odd-length window.
///
/// The convolution coefficients are derived once per parameter change from the
/// normal equations of the local polynomial fit. The first and last
/// `window / 2` samples are left unchanged.
#[derive(Debug, Clone)]
pub struct SavitzkyGolay {
    coefficients: Vec<f64>,
}

impl SavitzkyGolay {
    pub const NAME: &'static str = "Savitzky-Golay";
}

impl Default for SavitzkyGolay {
    fn default() -> Self {
        Self {
            coefficients: vec![1.0],
        }
    }
}

/// Smoothing coefficients (value at the window centre) for a polynomial of
/// `order` fitted over `window` points.
fn coefficients(window: usize, order: usize) -> Option<Vec<f64>> {
    let half = (window / 2) as f64;
    let a = DMatrix::from_fn(window, order + 1, |i, j| (i as f64 - half).powi(j as i32));
    let ata_inv = (a.transpose() * &a).try_inverse()?;
    let projection = ata_inv * a.transpose();
    Some(projection.row(0).iter().copied().collect())
}

impl SignalProcessor for SavitzkyGolay {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::integer("window", "Window [samples]", 7).with_range(3.0, 501.0))
            .with(PluginInput::integer("order", "Polynomial order", 2).with_range(0.0, 10.0))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let window = inputs.i64("window")?;
        let order = inputs.i64("order")?;
        if window < 3 || window % 2 == 0 {
            return Err(ProcessingError::invalid_parameter("window", "must be odd and at least 3"));
        }
        if order < 0 || order >= window {
            return Err(ProcessingError::invalid_parameter("order", "must be below the window length"));
        }
        self.coefficients = coefficients(window as usize, order as usize)
            .ok_or_else(|| ProcessingError::invalid_parameter("order", "singular smoothing system"))?;
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let window = self.coefficients.len();
        if input.len() < window {
            return Ok(true);
        }
        let half = window / 2;
        for (i, out) in output.data.iter_mut().enumerate().skip(half).take(input.len() - 2 * half) {
            *out = self.coefficients
                .iter()
                .zip(&input.data[i - half..=i + half])
                .map(|(c, v)| c * v)
                .sum();
        }
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalProcessor> {
        Box::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classic_five_point_quadratic() {
        let c = coefficients(5, 2).unwrap();
        let expected = [-3.0, 12.0, 17.0, 12.0, -3.0].map(|v| v / 35.0);
        for (a, b) in c.iter().zip(expected) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn coefficients_sum_to_one() {
        let c = coefficients(11, 4).unwrap();
        assert!((c.iter().sum::<f64>() - 1.0).abs() < 1e-10);
    }
}

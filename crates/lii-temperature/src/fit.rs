//! Levenberg-Marquardt fit of a scaled Planck curve to multi-channel data.

use lii_core::units::nm_to_m;
use lii_materials::MaterialProperties;
use lii_signal::{FitIteration, Signal, SignalType};
use nalgebra::{DMatrix, DVector};
use tracing::{debug, warn};

use crate::TemperatureTrace;
use crate::error::{FitError, FitResult};
use crate::planck::{bandpass_intensity, planck_intensity};

/// Spectrum fit configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct FitConfig {
    pub max_iterations: usize,
    /// Initial temperature [K]
    pub start_temperature: f64,
    /// Initial scaling factor; ignored when `auto_start_scaling` is set
    pub start_scaling: Option<f64>,
    /// Derive the initial scaling factor from the brightest channel
    pub auto_start_scaling: bool,
    /// Integrate the Planck curve over each channel's bandwidth
    pub use_bandpass: bool,
    /// Weight residuals by 1/σ² of the channel standard deviation. Samples
    /// where any channel has σ = 0 are fitted unweighted.
    pub weight_by_stdev: bool,
    /// Initial Marquardt damping
    pub lambda_init: f64,
    /// Convergence threshold on chisquare relative to Σ w y²
    pub chisquare_tolerance: f64,
}

impl Default for FitConfig {
    fn default() -> Self {
        Self {
            max_iterations: 50,
            start_temperature: 2000.0,
            start_scaling: None,
            auto_start_scaling: true,
            use_bandpass: false,
            weight_by_stdev: false,
            lambda_init: 1e-2,
            chisquare_tolerance: 1e-12,
        }
    }
}

/// One channel's contribution to a single-sample fit. Lengths in m.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpectrumChannel {
    pub wavelength: f64,
    pub bandwidth: f64,
    /// Absorption function E(m) at `wavelength`
    pub em: f64,
    pub value: f64,
    pub stdev: Option<f64>,
}

/// Result of a single-sample spectrum fit.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFit {
    pub temperature: f64,
    pub scaling: f64,
    pub chisquare: f64,
    pub iterations: Vec<FitIteration>,
    pub converged: bool,
}

struct Problem<'a> {
    channels: &'a [SpectrumChannel],
    weights: Vec<f64>,
    use_bandpass: bool,
    // scaling = s * unit keeps both parameters O(1)
    unit: f64,
}

impl Problem<'_> {
    /// `E(m)/λ · planck` without scaling.
    fn shape(&self, ch: &SpectrumChannel, t: f64) -> f64 {
        let planck = if self.use_bandpass {
            bandpass_intensity(ch.wavelength, ch.bandwidth, t)
        } else {
            planck_intensity(ch.wavelength, t)
        };
        ch.em / ch.wavelength * planck
    }

    fn model(&self, ch: &SpectrumChannel, t: f64, s: f64) -> f64 {
        s * self.unit * self.shape(ch, t)
    }

    fn chisquare(&self, t: f64, s: f64) -> f64 {
        self.channels
            .iter()
            .zip(&self.weights)
            .map(|(ch, w)| {
                let r = ch.value - self.model(ch, t, s);
                w * r * r
            })
            .sum()
    }

    /// Normal equations `(JᵀWJ, JᵀWr)` at `(t, s)`.
    fn normal_equations(&self, t: f64, s: f64) -> (DMatrix<f64>, DVector<f64>) {
        let n = self.channels.len();
        let h = t * 1e-6;
        let mut jac = DMatrix::zeros(n, 2);
        let mut residual = DVector::zeros(n);
        let weights = DMatrix::from_diagonal(&DVector::from_column_slice(&self.weights));
        for (i, ch) in self.channels.iter().enumerate() {
            let m = self.model(ch, t, s);
            jac[(i, 0)] = (self.model(ch, t + h, s) - self.model(ch, t - h, s)) / (2.0 * h);
            jac[(i, 1)] = self.unit * self.shape(ch, t);
            residual[i] = ch.value - m;
        }
        let jt_w = jac.transpose() * weights;
        (&jt_w * &jac, jt_w * residual)
    }
}

fn start_scaling(problem: &Problem<'_>, config: &FitConfig) -> FitResult<f64> {
    if !config.auto_start_scaling {
        return Ok(config.start_scaling.unwrap_or(1.0));
    }
    let peak = problem
        .channels
        .iter()
        .filter(|ch| ch.value.is_finite())
        .max_by(|a, b| a.value.total_cmp(&b.value))
        .ok_or(FitError::NoActiveChannels)?;
    if peak.value <= 0.0 {
        return Err(FitError::NoActiveChannels);
    }
    Ok(peak.value / problem.shape(peak, config.start_temperature))
}

/// 1/σ² per channel, or uniform weights unless every channel has a positive σ.
///
/// A zero σ (constant samples in an average) would otherwise give that
/// channel the smallest weight of all.
fn residual_weights(channels: &[SpectrumChannel], weight_by_stdev: bool) -> Vec<f64> {
    let stdevs: Option<Vec<f64>> = channels
        .iter()
        .map(|ch| ch.stdev.filter(|sd| *sd > 0.0 && sd.is_finite()))
        .collect();
    match stdevs {
        Some(stdevs) if weight_by_stdev => stdevs.iter().map(|sd| 1.0 / (sd * sd)).collect(),
        None if weight_by_stdev => {
            debug!("channel without positive stdev, fitting unweighted");
            vec![1.0; channels.len()]
        }
        _ => vec![1.0; channels.len()],
    }
}

/// Fit temperature and scaling factor to one sample of several channels.
///
/// Every iteration, accepted or not, is recorded so the convergence can be
/// inspected afterwards. Running out of iterations is not an error; the
/// result is returned with `converged == false`.
pub fn fit_spectrum(channels: &[SpectrumChannel], config: &FitConfig) -> FitResult<SpectrumFit> {
    if channels.len() < 2 {
        return Err(FitError::NoActiveChannels);
    }
    if !(config.start_temperature > 0.0) {
        return Err(FitError::InvalidArg {
            what: "start temperature must be positive",
        });
    }
    let mut problem = Problem {
        channels,
        weights: residual_weights(channels, config.weight_by_stdev),
        use_bandpass: config.use_bandpass,
        unit: 1.0,
    };
    problem.unit = start_scaling(&problem, config)?;
    if !(problem.unit.is_finite() && problem.unit > 0.0) {
        return Err(FitError::InvalidArg {
            what: "start scaling must be positive",
        });
    }

    let norm: f64 = channels
        .iter()
        .zip(&problem.weights)
        .map(|(ch, w)| w * ch.value * ch.value)
        .sum();
    if !(norm > 0.0 && norm.is_finite()) {
        return Err(FitError::NoActiveChannels);
    }
    let threshold = config.chisquare_tolerance * norm;

    let mut t = config.start_temperature;
    let mut s = 1.0;
    let mut chi2 = problem.chisquare(t, s);
    let mut lambda = config.lambda_init;
    let mut iterations = Vec::with_capacity(config.max_iterations);
    let mut converged = chi2 <= threshold;

    while !converged && iterations.len() < config.max_iterations {
        let (a, g) = problem.normal_equations(t, s);
        let mut damped = a.clone();
        for k in 0..2 {
            damped[(k, k)] += lambda * a[(k, k)].max(f64::MIN_POSITIVE);
        }
        let delta = damped.lu().solve(&g).ok_or(FitError::Diverged {
            iterations: iterations.len(),
        })?;

        let (t_new, s_new) = (t + delta[0], s + delta[1]);
        let chi2_new = if t_new > 0.0 && s_new > 0.0 {
            problem.chisquare(t_new, s_new)
        } else {
            f64::INFINITY
        };

        let accepted = chi2_new.is_finite() && chi2_new < chi2;
        let improvement = if accepted { (chi2 - chi2_new) / chi2 } else { 0.0 };
        if accepted {
            t = t_new;
            s = s_new;
            chi2 = chi2_new;
            lambda = (lambda / 10.0).max(1e-15);
        } else {
            lambda *= 10.0;
        }

        iterations.push(FitIteration {
            chisquare: chi2,
            lambda,
            temperature: t,
            delta_temperature: delta[0],
            scaling: s * problem.unit,
            delta_scaling: delta[1] * problem.unit,
        });

        if !chi2.is_finite() {
            return Err(FitError::Diverged {
                iterations: iterations.len(),
            });
        }
        if chi2 <= threshold
            || (accepted && improvement < config.chisquare_tolerance && delta[0].abs() < 1e-9 * t)
        {
            converged = true;
        } else if lambda > 1e15 {
            // no descent direction left; the last accepted point is final
            break;
        }
    }

    Ok(SpectrumFit {
        temperature: t,
        scaling: s * problem.unit,
        chisquare: chi2,
        iterations,
        converged,
    })
}

/// Per-sample spectrum fit over several channel signals.
///
/// `wavelengths_nm` and `bandwidths_nm` are parallel to `signals`. Samples
/// whose fit fails (typically before the laser pulse where all channels are
/// at noise level) yield 0 K with an empty iteration history.
pub fn calc_spectrum_fit(
    signals: &[&Signal],
    wavelengths_nm: &[f64],
    bandwidths_nm: &[f64],
    material: &dyn MaterialProperties,
    config: &FitConfig,
) -> FitResult<TemperatureTrace> {
    if signals.len() < 2 {
        return Err(FitError::NoActiveChannels);
    }
    if wavelengths_nm.len() != signals.len() || bandwidths_nm.len() != signals.len() {
        return Err(FitError::ChannelMismatch {
            what: format!(
                "{} signals, {} wavelengths, {} bandwidths",
                signals.len(),
                wavelengths_nm.len(),
                bandwidths_nm.len()
            ),
        });
    }
    if config.weight_by_stdev && signals.iter().any(|s| !s.has_stdev()) {
        return Err(FitError::InvalidArg {
            what: "stdev weighting requires averaged signals with standard deviation",
        });
    }
    let first = signals[0];
    let n = signals.iter().map(|s| s.len()).min().unwrap_or(0);
    if n == 0 {
        return Err(FitError::NoActiveChannels);
    }

    let wavelengths: Vec<f64> = wavelengths_nm.iter().map(|w| nm_to_m(*w)).collect();
    let em = wavelengths
        .iter()
        .map(|w| material.em(*w))
        .collect::<Result<Vec<_>, _>>()?;

    let mut temperature = Vec::with_capacity(n);
    let mut scaling = Vec::with_capacity(n);
    let mut fit_data = Vec::with_capacity(n);
    let mut failed = 0usize;
    let mut not_converged = 0usize;
    for i in 0..n {
        let channels: Vec<SpectrumChannel> = signals
            .iter()
            .enumerate()
            .map(|(k, sig)| SpectrumChannel {
                wavelength: wavelengths[k],
                bandwidth: nm_to_m(bandwidths_nm[k]),
                em: em[k],
                value: sig.data[i],
                stdev: sig.stdev.get(i).copied(),
            })
            .collect();
        match fit_spectrum(&channels, config) {
            Ok(fit) => {
                if !fit.converged {
                    not_converged += 1;
                }
                temperature.push(fit.temperature);
                scaling.push(fit.scaling);
                fit_data.push(fit.iterations);
            }
            Err(_) => {
                failed += 1;
                temperature.push(0.0);
                scaling.push(0.0);
                fit_data.push(Vec::new());
            }
        }
    }
    if failed == n {
        warn!(samples = n, "spectrum fit failed for every sample");
    }
    debug!(samples = n, failed, not_converged, "spectrum fit finished");

    let mut t_sig = Signal::with_data(SignalType::Temperature, 0, first.start_time, first.dt, temperature);
    t_sig.fit_data = fit_data;
    t_sig.fit_material = material.name().to_string();
    t_sig.fit_active_channels = vec![true; signals.len()];
    let c_sig = Signal::with_data(SignalType::Temperature, 0, first.start_time, first.dt, scaling);
    Ok(TemperatureTrace {
        temperature: t_sig,
        scaling: c_sig,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planck::planck_intensity_scaled;

    fn channels(t: f64, c: f64) -> Vec<SpectrumChannel> {
        [500e-9, 600e-9, 700e-9, 800e-9]
            .iter()
            .map(|w| SpectrumChannel {
                wavelength: *w,
                bandwidth: 0.0,
                em: 0.35,
                value: planck_intensity_scaled(*w, t, c, 0.35),
                stdev: None,
            })
            .collect()
    }

    #[test]
    fn converges_on_noise_free_data() {
        let fit = fit_spectrum(&channels(2500.0, 1.0), &FitConfig::default()).unwrap();
        assert!(fit.converged);
        assert!((fit.temperature - 2500.0).abs() / 2500.0 < 1e-4);
        assert!((fit.scaling - 1.0).abs() < 2e-3);
        let last = fit.iterations.last().unwrap();
        assert_eq!(last.temperature, fit.temperature);
        assert!(fit.iterations.len() <= FitConfig::default().max_iterations);
    }

    #[test]
    fn chisquare_never_increases() {
        let fit = fit_spectrum(&channels(3200.0, 5e-3), &FitConfig::default()).unwrap();
        assert!(fit.iterations.windows(2).all(|w| w[1].chisquare <= w[0].chisquare));
    }

    #[test]
    fn single_channel_is_rejected() {
        let one = &channels(2500.0, 1.0)[..1];
        assert_eq!(fit_spectrum(one, &FitConfig::default()), Err(FitError::NoActiveChannels));
    }

    #[test]
    fn dark_sample_has_no_fit() {
        let mut dark = channels(2500.0, 1.0);
        for ch in &mut dark {
            ch.value = 0.0;
        }
        assert!(fit_spectrum(&dark, &FitConfig::default()).is_err());
    }
}

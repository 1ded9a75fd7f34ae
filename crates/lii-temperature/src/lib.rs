//! Pyrometric temperature calculation for LII signals.
//!
//! Wavelengths enter the public signal-level functions in nm (as configured in
//! [`lii_signal::LiiSettings`]) and are converted to m before any radiometric
//! evaluation. Temperatures are in K; scaling factors are in arbitrary units.

pub mod error;
pub mod fit;
pub mod planck;
pub mod synthetic;
pub mod two_color;

pub use error::{FitError, FitResult};
pub use fit::{FitConfig, SpectrumChannel, SpectrumFit, calc_spectrum_fit, fit_spectrum};
pub use planck::{bandpass_intensity, planck_intensity, planck_intensity_scaled};
pub use synthetic::{cooling_signal, spectrum_samples};
pub use two_color::{calc_two_color, two_color_scaling, two_color_temperature};

/// Temperature trace plus the matching scaling factor trace.
#[derive(Debug, Clone)]
pub struct TemperatureTrace {
    pub temperature: lii_signal::Signal,
    pub scaling: lii_signal::Signal,
}

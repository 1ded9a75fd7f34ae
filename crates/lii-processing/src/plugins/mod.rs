//! Concrete processing steps.

mod arithmetic;
mod baseline;
mod calibration;
mod filter;
mod moving_average;
mod multi_signal_average;
mod normalize;
mod overwrite;
mod resolution_reducer;
mod savitzky_golay;
mod section;
mod signal_arithmetic;
mod simple_data_reducer;
mod simple_peak_validator;
mod swap_channels;
mod temperature_calculator;
mod transfer;
mod x_shift;

pub use arithmetic::Arithmetic;
pub use baseline::Baseline;
pub use calibration::Calibration;
pub use filter::Filter;
pub use moving_average::MovingAverage;
pub use multi_signal_average::MultiSignalAverage;
pub use normalize::Normalize;
pub use overwrite::Overwrite;
pub use resolution_reducer::ResolutionReducer;
pub use savitzky_golay::SavitzkyGolay;
pub use section::GetSignalSection;
pub use signal_arithmetic::SignalArithmetic;
pub use simple_data_reducer::SimpleDataReducer;
pub use simple_peak_validator::SimplePeakValidator;
pub use swap_channels::SwapChannels;
pub use temperature_calculator::{TemperatureCalculator, TemperatureMethod};
pub use transfer::Transfer;
pub use x_shift::XShiftSignals;

use lii_signal::{Signal, SignalType};

use crate::error::{ProcessingError, ProcessingResult};

pub(crate) const ALL_TYPES: &[SignalType] = &SignalType::ALL;
pub(crate) const DETECTOR_TYPES: &[SignalType] = &[SignalType::Raw, SignalType::Abs];
pub(crate) const ABS_ONLY: &[SignalType] = &[SignalType::Abs];
pub(crate) const TEMPERATURE_ONLY: &[SignalType] = &[SignalType::Temperature];

/// Binary operators shared by the arithmetic plugins.
pub(crate) const OPERATORS: [&str; 4] = ["+", "-", "*", "/"];

pub(crate) fn apply_operator(op: &str, a: f64, b: f64) -> f64 {
    match op {
        "+" => a + b,
        "-" => a - b,
        "*" => a * b,
        _ if b == 0.0 => 0.0,
        _ => a / b,
    }
}

pub(crate) fn check_operator(identifier: &str, op: &str) -> ProcessingResult<()> {
    if OPERATORS.contains(&op) {
        Ok(())
    } else {
        Err(ProcessingError::invalid_parameter(identifier, format!("unknown operator '{op}'")))
    }
}

pub(crate) fn check_window(start: f64, end: f64) -> ProcessingResult<()> {
    if !(start.is_finite() && end.is_finite()) || end < start {
        return Err(ProcessingError::invalid_parameter("end", "window end must not precede start"));
    }
    Ok(())
}

pub(crate) fn positive_channel(identifier: &str, value: i64) -> ProcessingResult<u32> {
    u32::try_from(value)
        .ok()
        .filter(|c| *c >= 1)
        .ok_or_else(|| ProcessingError::invalid_parameter(identifier, "channel numbers start at 1"))
}

/// Multiply data and standard deviation by `factor`.
pub(crate) fn scale(signal: &mut Signal, factor: f64) {
    signal.data.iter_mut().for_each(|v| *v *= factor);
    signal.stdev.iter_mut().for_each(|s| *s *= factor.abs());
}

pub(crate) fn missing_channel(channel: u32) -> ProcessingError {
    ProcessingError::InvalidChannel {
        what: "no signal for channel",
        channel,
    }
}

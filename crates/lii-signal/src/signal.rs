//! Signal value type and fit-iteration records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Processing stage a signal belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SignalType {
    /// Detector counts as acquired.
    Raw,
    /// Calibrated (absolute) intensities.
    Abs,
    /// Derived particle temperature traces.
    Temperature,
}

impl SignalType {
    pub const ALL: [SignalType; 3] = [SignalType::Raw, SignalType::Abs, SignalType::Temperature];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Abs => "absolute",
            Self::Temperature => "temperature",
        }
    }

    /// Position of the stage in RAW -> ABS -> TEMPERATURE order.
    pub fn index(&self) -> usize {
        match self {
            Self::Raw => 0,
            Self::Abs => 1,
            Self::Temperature => 2,
        }
    }

    /// Parse the names produced by [`SignalType::as_str`] (case-insensitive).
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "raw" => Some(Self::Raw),
            "abs" | "absolute" => Some(Self::Abs),
            "temperature" => Some(Self::Temperature),
            _ => None,
        }
    }
}

impl fmt::Display for SignalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One iteration of a temperature fit at a single sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitIteration {
    pub chisquare: f64,
    pub lambda: f64,
    pub temperature: f64,
    pub delta_temperature: f64,
    pub scaling: f64,
    pub delta_scaling: f64,
}

/// A sampled time series of one channel.
///
/// `data.len()` is the logical length. `stdev` is either empty or parallel to
/// `data`; `fit_data` is either empty or holds one iteration list per sample.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub signal_type: SignalType,
    pub channel_id: u32,
    /// Sample spacing [s]
    pub dt: f64,
    /// Time of the first sample [s]
    pub start_time: f64,
    pub data: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stdev: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fit_data: Vec<Vec<FitIteration>>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub fit_material: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fit_active_channels: Vec<bool>,
}

impl Signal {
    /// Create an empty signal.
    pub fn new(signal_type: SignalType, channel_id: u32) -> Self {
        Self {
            signal_type,
            channel_id,
            dt: 0.0,
            start_time: 0.0,
            data: Vec::new(),
            stdev: Vec::new(),
            fit_data: Vec::new(),
            fit_material: String::new(),
            fit_active_channels: Vec::new(),
        }
    }

    /// Create a signal from samples.
    pub fn with_data(
        signal_type: SignalType,
        channel_id: u32,
        start_time: f64,
        dt: f64,
        data: Vec<f64>,
    ) -> Self {
        Self {
            dt,
            start_time,
            data,
            ..Self::new(signal_type, channel_id)
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn has_stdev(&self) -> bool {
        !self.stdev.is_empty() && self.stdev.len() == self.data.len()
    }

    /// Time of sample `i` [s].
    pub fn time_at(&self, i: usize) -> f64 {
        self.start_time + self.dt * i as f64
    }

    /// Time of the last sample, or the start time when empty.
    pub fn end_time(&self) -> f64 {
        self.time_at(self.data.len().saturating_sub(1))
    }

    /// Index of the sample closest to `t`, clamped to the signal.
    pub fn index_at(&self, t: f64) -> Option<usize> {
        if self.data.is_empty() {
            return None;
        }
        if self.dt <= 0.0 {
            return Some(0);
        }
        let raw = ((t - self.start_time) / self.dt).round();
        let last = (self.data.len() - 1) as f64;
        Some(raw.clamp(0.0, last) as usize)
    }

    /// Linearly interpolated value at `t`; `None` outside the sampled range.
    pub fn at(&self, t: f64) -> Option<f64> {
        if self.data.is_empty() || self.dt <= 0.0 {
            return None;
        }
        let pos = (t - self.start_time) / self.dt;
        if pos < 0.0 || pos > (self.data.len() - 1) as f64 {
            return None;
        }
        let i = pos.floor() as usize;
        if i + 1 >= self.data.len() {
            return self.data.last().copied();
        }
        let frac = pos - i as f64;
        Some(self.data[i] + (self.data[i + 1] - self.data[i]) * frac)
    }

    /// Index of the maximum sample.
    pub fn peak_index(&self) -> Option<usize> {
        self.data
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_finite())
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
    }

    pub fn max_value(&self) -> Option<f64> {
        self.peak_index().map(|i| self.data[i])
    }

    // sample times carry rounding noise; widen the window by a fraction of dt
    fn window(&self, t0: f64, t1: f64) -> (f64, f64) {
        let slack = self.dt.abs() * 1e-6;
        (t0.min(t1) - slack, t0.max(t1) + slack)
    }

    /// Mean over samples whose time lies in `[t0, t1]`.
    pub fn mean_over(&self, t0: f64, t1: f64) -> Option<f64> {
        let (lo, hi) = self.window(t0, t1);
        let values: Vec<f64> = (0..self.data.len())
            .filter(|i| {
                let t = self.time_at(*i);
                t >= lo && t <= hi
            })
            .map(|i| self.data[i])
            .collect();
        lii_core::mean(&values)
    }

    /// Copy of the samples whose time lies in `[t0, t1]`.
    pub fn sub_section(&self, t0: f64, t1: f64) -> Signal {
        let (lo, hi) = self.window(t0, t1);
        let keep: Vec<usize> = (0..self.data.len())
            .filter(|i| {
                let t = self.time_at(*i);
                t >= lo && t <= hi
            })
            .collect();
        let mut out = Signal {
            data: Vec::new(),
            stdev: Vec::new(),
            fit_data: Vec::new(),
            ..self.clone()
        };
        if let Some(first) = keep.first() {
            out.start_time = self.time_at(*first);
        }
        out.data = keep.iter().map(|i| self.data[*i]).collect();
        if self.has_stdev() {
            out.stdev = keep.iter().map(|i| self.stdev[*i]).collect();
        }
        if self.fit_data.len() == self.data.len() {
            out.fit_data = keep.iter().map(|i| self.fit_data[*i].clone()).collect();
        }
        out
    }

    /// Drop all samples and per-sample history; timing and tags stay.
    pub fn clear(&mut self) {
        self.data.clear();
        self.stdev.clear();
        self.fit_data.clear();
    }

    pub fn shrink_to_fit(&mut self) {
        self.data.shrink_to_fit();
        self.stdev.shrink_to_fit();
        self.fit_data.shrink_to_fit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ramp() -> Signal {
        Signal::with_data(SignalType::Raw, 1, 1e-9, 1e-9, vec![0.0, 1.0, 4.0, 2.0, 1.0])
    }

    #[test]
    fn time_and_index_are_consistent() {
        let sig = ramp();
        assert!((sig.time_at(2) - 3e-9).abs() < 1e-21);
        assert_eq!(sig.index_at(3.1e-9), Some(2));
        assert_eq!(sig.index_at(-1.0), Some(0));
        assert_eq!(sig.index_at(1.0), Some(4));
    }

    #[test]
    fn interpolation_between_samples() {
        let sig = ramp();
        let v = sig.at(2.5e-9).unwrap();
        assert!((v - 2.5).abs() < 1e-9);
        assert!(sig.at(0.0).is_none());
    }

    #[test]
    fn peak_and_mean() {
        let sig = ramp();
        assert_eq!(sig.peak_index(), Some(2));
        assert_eq!(sig.max_value(), Some(4.0));
        let m = sig.mean_over(1e-9, 2e-9).unwrap();
        assert!((m - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sub_section_keeps_timing() {
        let sig = ramp();
        let cut = sig.sub_section(2e-9, 4e-9);
        assert_eq!(cut.data, vec![1.0, 4.0, 2.0]);
        assert!((cut.start_time - 2e-9).abs() < 1e-21);
        assert_eq!(cut.dt, sig.dt);
    }

    #[test]
    fn signal_type_names_parse_back() {
        for t in SignalType::ALL {
            assert_eq!(SignalType::parse(t.as_str()), Some(t));
        }
        assert_eq!(SignalType::parse("ABS"), Some(SignalType::Abs));
    }
}

//! Per-run measurement data and the read-only view processing stages use.

use crate::error::{SignalError, SignalResult};
use crate::mpoint::MPoint;
use crate::settings::LiiSettings;
use crate::signal::{Signal, SignalType};

/// Read access to a run's measurement data.
pub trait RunDataSource {
    fn size_all_mpoints(&self) -> usize;
    fn pre(&self, index: usize) -> Option<&MPoint>;
    fn post(&self, index: usize) -> Option<&MPoint>;
    fn channel_ids(&self, signal_type: SignalType) -> Vec<u32>;
    fn no_channels(&self, signal_type: SignalType) -> usize {
        self.channel_ids(signal_type).len()
    }
    fn settings(&self) -> &LiiSettings;
}

/// Unprocessed (`pre`) and processed (`post`) measurement points of a run.
#[derive(Debug, Clone)]
pub struct RunData {
    settings: LiiSettings,
    channel_count: usize,
    pre: Vec<MPoint>,
    post: Vec<MPoint>,
    abs_imported: bool,
}

impl RunData {
    pub fn new(settings: LiiSettings, channel_count: usize) -> Self {
        Self {
            settings,
            channel_count,
            pre: Vec::new(),
            post: Vec::new(),
            abs_imported: false,
        }
    }

    pub fn channel_count(&self) -> usize {
        self.channel_count
    }

    pub fn set_settings(&mut self, settings: LiiSettings) {
        self.settings = settings;
    }

    /// Append a measurement point built from imported signals.
    ///
    /// Signals must be RAW or ABS; importing any ABS signal marks the run as
    /// carrying its own absolute data.
    pub fn push_mpoint(&mut self, signals: Vec<Signal>) -> SignalResult<usize> {
        let mut mp = MPoint::new(self.channel_count);
        for signal in signals {
            if signal.signal_type == SignalType::Abs && !signal.is_empty() {
                self.abs_imported = true;
            }
            mp.set_signal(signal)?;
        }
        let mut post = MPoint::new(self.channel_count);
        for id in mp.channel_ids(SignalType::Temperature) {
            post.add_temperature_channel(id);
        }
        self.pre.push(mp);
        self.post.push(post);
        Ok(self.pre.len() - 1)
    }

    /// Whether absolute signals were imported rather than derived from RAW.
    pub fn abs_imported(&self) -> bool {
        self.abs_imported
    }

    pub fn pre_mut(&mut self, index: usize) -> SignalResult<&mut MPoint> {
        let len = self.pre.len();
        self.pre
            .get_mut(index)
            .ok_or(SignalError::MPointOutOfRange { index, len })
    }

    pub fn post_mut(&mut self, index: usize) -> SignalResult<&mut MPoint> {
        let len = self.post.len();
        self.post
            .get_mut(index)
            .ok_or(SignalError::MPointOutOfRange { index, len })
    }

    /// Derive ABS pre signals from RAW post signals (type changed, data copied).
    ///
    /// No-op when absolute data was imported.
    pub fn derive_abs_from_raw(&mut self) {
        if self.abs_imported {
            return;
        }
        for (pre, post) in self.pre.iter_mut().zip(&self.post) {
            for id in 1..=self.channel_count as u32 {
                if let (Some(src), Some(dst)) = (
                    post.signal(SignalType::Raw, id),
                    pre.signal_mut(SignalType::Abs, id),
                ) {
                    *dst = Signal {
                        signal_type: SignalType::Abs,
                        ..src.clone()
                    };
                }
            }
        }
    }

    /// Register a temperature channel on every measurement point.
    pub fn add_temperature_channel(&mut self, channel_id: u32) {
        for mp in self.pre.iter_mut().chain(self.post.iter_mut()) {
            mp.add_temperature_channel(channel_id);
        }
    }

    /// Drop a temperature channel from post data; imported (pre) temperatures stay.
    pub fn remove_temperature_channel(&mut self, channel_id: u32) {
        for mp in self.post.iter_mut() {
            mp.remove_temperature_channel(channel_id);
        }
    }

    /// Clear processed signals of one type on every measurement point.
    pub fn clear_post(&mut self, signal_type: SignalType) {
        for mp in self.post.iter_mut() {
            mp.clear(signal_type);
        }
    }
}

impl RunDataSource for RunData {
    fn size_all_mpoints(&self) -> usize {
        self.pre.len()
    }

    fn pre(&self, index: usize) -> Option<&MPoint> {
        self.pre.get(index)
    }

    fn post(&self, index: usize) -> Option<&MPoint> {
        self.post.get(index)
    }

    fn channel_ids(&self, signal_type: SignalType) -> Vec<u32> {
        match signal_type {
            SignalType::Raw | SignalType::Abs => (1..=self.channel_count as u32).collect(),
            SignalType::Temperature => self
                .post
                .first()
                .map(|mp| mp.channel_ids(SignalType::Temperature))
                .unwrap_or_default(),
        }
    }

    fn settings(&self) -> &LiiSettings {
        &self.settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_with_raw() -> RunData {
        let mut run = RunData::new(LiiSettings::default(), 2);
        for k in 0..3 {
            let signals = (1..=2)
                .map(|ch| Signal::with_data(SignalType::Raw, ch, 0.0, 1e-9, vec![k as f64; 4]))
                .collect();
            run.push_mpoint(signals).unwrap();
        }
        run
    }

    #[test]
    fn push_creates_matching_post_points() {
        let run = run_with_raw();
        assert_eq!(run.size_all_mpoints(), 3);
        assert!(run.post(2).is_some());
        assert!(!run.post(0).unwrap().has_data(SignalType::Raw));
        assert!(!run.abs_imported());
    }

    #[test]
    fn derived_abs_copies_raw_post() {
        let mut run = run_with_raw();
        let sig = Signal::with_data(SignalType::Raw, 1, 0.0, 1e-9, vec![5.0; 4]);
        run.post_mut(1).unwrap().set_signal(sig).unwrap();
        run.derive_abs_from_raw();
        let abs = run.pre(1).unwrap().signal(SignalType::Abs, 1).unwrap();
        assert_eq!(abs.signal_type, SignalType::Abs);
        assert_eq!(abs.data, vec![5.0; 4]);
    }

    #[test]
    fn temperature_channel_ids_follow_post_points() {
        let mut run = run_with_raw();
        run.add_temperature_channel(4);
        assert_eq!(run.channel_ids(SignalType::Temperature), vec![4]);
        run.remove_temperature_channel(4);
        assert!(run.channel_ids(SignalType::Temperature).is_empty());
    }
}

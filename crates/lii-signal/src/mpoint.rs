//! Measurement point: all signals recorded for one laser shot.

use std::collections::BTreeMap;

use crate::error::{SignalError, SignalResult};
use crate::signal::{Signal, SignalType};

/// One raw/absolute signal pair per detector channel plus a dynamic set of
/// temperature channels.
///
/// RAW and ABS channel IDs are the contiguous range `1..=channel_count`;
/// temperature channel IDs are arbitrary positive integers handed out by the
/// session's channel registry.
#[derive(Debug, Clone, PartialEq)]
pub struct MPoint {
    raw: Vec<Signal>,
    abs: Vec<Signal>,
    temperature: BTreeMap<u32, Signal>,
}

impl MPoint {
    pub fn new(channel_count: usize) -> Self {
        Self {
            raw: (1..=channel_count as u32)
                .map(|id| Signal::new(SignalType::Raw, id))
                .collect(),
            abs: (1..=channel_count as u32)
                .map(|id| Signal::new(SignalType::Abs, id))
                .collect(),
            temperature: BTreeMap::new(),
        }
    }

    pub fn channel_count(&self) -> usize {
        self.raw.len()
    }

    /// Channel IDs present for a signal type, ascending.
    pub fn channel_ids(&self, signal_type: SignalType) -> Vec<u32> {
        match signal_type {
            SignalType::Raw | SignalType::Abs => (1..=self.raw.len() as u32).collect(),
            SignalType::Temperature => self.temperature.keys().copied().collect(),
        }
    }

    pub fn signal(&self, signal_type: SignalType, channel_id: u32) -> Option<&Signal> {
        match signal_type {
            SignalType::Raw => channel_index(channel_id, self.raw.len()).map(|i| &self.raw[i]),
            SignalType::Abs => channel_index(channel_id, self.abs.len()).map(|i| &self.abs[i]),
            SignalType::Temperature => self.temperature.get(&channel_id),
        }
    }

    pub fn signal_mut(&mut self, signal_type: SignalType, channel_id: u32) -> Option<&mut Signal> {
        match signal_type {
            SignalType::Raw => {
                channel_index(channel_id, self.raw.len()).map(move |i| &mut self.raw[i])
            }
            SignalType::Abs => {
                channel_index(channel_id, self.abs.len()).map(move |i| &mut self.abs[i])
            }
            SignalType::Temperature => self.temperature.get_mut(&channel_id),
        }
    }

    /// Store `signal` under its own type and channel.
    ///
    /// Temperature channels are created on demand; RAW/ABS channels must exist.
    pub fn set_signal(&mut self, signal: Signal) -> SignalResult<()> {
        let channel = signal.channel_id;
        match signal.signal_type {
            SignalType::Temperature => {
                if channel == 0 {
                    return Err(SignalError::InvalidChannel {
                        what: "temperature signal",
                        channel,
                        count: self.temperature.len(),
                    });
                }
                self.temperature.insert(channel, signal);
            }
            signal_type => {
                let count = self.raw.len();
                let slot = self
                    .signal_mut(signal_type, channel)
                    .ok_or(SignalError::InvalidChannel {
                        what: "detector signal",
                        channel,
                        count,
                    })?;
                *slot = signal;
            }
        }
        Ok(())
    }

    /// Make sure an (empty) temperature channel exists.
    pub fn add_temperature_channel(&mut self, channel_id: u32) {
        self.temperature
            .entry(channel_id)
            .or_insert_with(|| Signal::new(SignalType::Temperature, channel_id));
    }

    pub fn remove_temperature_channel(&mut self, channel_id: u32) -> Option<Signal> {
        self.temperature.remove(&channel_id)
    }

    pub fn is_temperature_channel(&self, channel_id: u32) -> bool {
        self.temperature.contains_key(&channel_id)
    }

    /// Clear the samples of every signal of one type.
    pub fn clear(&mut self, signal_type: SignalType) {
        match signal_type {
            SignalType::Raw => self.raw.iter_mut().for_each(Signal::clear),
            SignalType::Abs => self.abs.iter_mut().for_each(Signal::clear),
            SignalType::Temperature => self.temperature.values_mut().for_each(Signal::clear),
        }
    }

    /// True when any signal of the given type carries samples.
    pub fn has_data(&self, signal_type: SignalType) -> bool {
        match signal_type {
            SignalType::Raw => self.raw.iter().any(|s| !s.is_empty()),
            SignalType::Abs => self.abs.iter().any(|s| !s.is_empty()),
            SignalType::Temperature => self.temperature.values().any(|s| !s.is_empty()),
        }
    }
}

fn channel_index(channel_id: u32, count: usize) -> Option<usize> {
    let idx = (channel_id as usize).checked_sub(1)?;
    (idx < count).then_some(idx)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detector_channels_are_contiguous() {
        let mp = MPoint::new(3);
        assert_eq!(mp.channel_ids(SignalType::Raw), vec![1, 2, 3]);
        assert!(mp.signal(SignalType::Abs, 0).is_none());
        assert!(mp.signal(SignalType::Abs, 4).is_none());
        assert_eq!(mp.signal(SignalType::Raw, 2).map(|s| s.channel_id), Some(2));
    }

    #[test]
    fn set_signal_rejects_unknown_detector_channel() {
        let mut mp = MPoint::new(2);
        let sig = Signal::with_data(SignalType::Raw, 5, 0.0, 1.0, vec![1.0]);
        assert!(matches!(
            mp.set_signal(sig),
            Err(SignalError::InvalidChannel { channel: 5, .. })
        ));
    }

    #[test]
    fn temperature_channels_are_dynamic() {
        let mut mp = MPoint::new(2);
        mp.add_temperature_channel(7);
        mp.set_signal(Signal::with_data(SignalType::Temperature, 3, 0.0, 1.0, vec![2000.0]))
            .unwrap();
        assert_eq!(mp.channel_ids(SignalType::Temperature), vec![3, 7]);
        assert!(mp.remove_temperature_channel(7).is_some());
        assert!(!mp.is_temperature_channel(7));
    }
}

//! Dense per-(measurement point, channel position) result cache of a plugin.

use lii_signal::Signal;

/// Output signals of one plugin, addressed by `(mp, channel position)`.
///
/// Results are tagged with the chain epoch they were computed in; a buffer
/// whose epoch differs from the chain's current epoch is stale.
#[derive(Debug, Clone, Default)]
pub struct StepBuffer {
    mp_count: usize,
    channel_count: usize,
    signals: Vec<Signal>,
    validity: Vec<usize>,
    epoch: u64,
    released: bool,
}

impl StepBuffer {
    /// Rebuild for a new shape, or just reset validity when the shape matches.
    pub fn prepare(&mut self, mp_count: usize, channel_count: usize, epoch: u64) {
        if self.mp_count != mp_count || self.channel_count != channel_count || self.released {
            self.mp_count = mp_count;
            self.channel_count = channel_count;
            self.signals = Vec::new();
        }
        self.validity = vec![0; mp_count];
        self.epoch = epoch;
        self.released = false;
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.mp_count, self.channel_count)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        !self.released && self.epoch == epoch
    }

    fn index(&self, mp: usize, position: usize) -> Option<usize> {
        (mp < self.mp_count && position < self.channel_count).then(|| mp * self.channel_count + position)
    }

    pub fn get(&self, mp: usize, position: usize) -> Option<&Signal> {
        self.index(mp, position).and_then(|i| self.signals.get(i))
    }

    /// Store the outputs of one measurement point (one signal per channel position).
    pub fn store(&mut self, mp: usize, outputs: Vec<Signal>) {
        if self.signals.len() != self.mp_count * self.channel_count {
            self.signals = vec![Signal::new(lii_signal::SignalType::Raw, 0); self.mp_count * self.channel_count];
        }
        let Some(start) = self.index(mp, 0) else {
            return;
        };
        for (offset, signal) in outputs.into_iter().take(self.channel_count).enumerate() {
            self.signals[start + offset] = signal;
        }
    }

    /// Clear the stored data of every channel at `mp`.
    pub fn clear_mpoint(&mut self, mp: usize) {
        if let Some(start) = self.index(mp, 0) {
            if let Some(slots) = self.signals.get_mut(start..start + self.channel_count) {
                slots.iter_mut().for_each(Signal::clear);
            }
        }
    }

    pub fn set_validity(&mut self, mp: usize, count: usize) {
        if let Some(v) = self.validity.get_mut(mp) {
            *v = count;
        }
    }

    pub fn validity(&self, mp: usize) -> usize {
        self.validity.get(mp).copied().unwrap_or(0)
    }

    /// All channels passed at `mp`.
    pub fn valid_at(&self, mp: usize) -> bool {
        self.validity(mp) == self.channel_count && mp < self.mp_count
    }

    /// Drop the stored signals; validity counters are kept.
    pub fn release(&mut self) {
        self.signals = Vec::new();
        self.released = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lii_signal::SignalType;

    #[test]
    fn store_and_clear() {
        let mut buf = StepBuffer::default();
        buf.prepare(2, 2, 1);
        let sig = Signal::with_data(SignalType::Raw, 1, 0.0, 1.0, vec![1.0]);
        buf.store(1, vec![sig.clone(), sig.clone()]);
        assert_eq!(buf.get(1, 1), Some(&sig));
        assert!(buf.get(2, 0).is_none());
        buf.clear_mpoint(1);
        assert!(buf.get(1, 0).unwrap().is_empty());
    }

    #[test]
    fn epoch_marks_staleness() {
        let mut buf = StepBuffer::default();
        buf.prepare(1, 1, 3);
        assert!(buf.is_current(3));
        assert!(!buf.is_current(4));
        buf.release();
        assert!(!buf.is_current(3));
        buf.set_validity(0, 1);
        assert!(buf.valid_at(0));
    }
}

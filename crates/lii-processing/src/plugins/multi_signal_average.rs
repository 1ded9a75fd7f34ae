use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use lii_signal::Signal;
use tracing::debug;

use crate::error::ProcessingResult;
use crate::input::InputList;
use crate::plugin::{ProcessContext, SignalProcessor};

/// Averages every valid measurement point into one representative signal per
/// channel, with the sample standard deviation in `stdev`.
///
/// The average of all channels is computed on the first call of a processing
/// run and served from a cache afterwards. The chain replicates the result to
/// every measurement point.
#[derive(Debug, Default)]
pub struct MultiSignalAverage {
    averages: Mutex<Option<BTreeMap<u32, Signal>>>,
    computations: AtomicUsize,
}

impl MultiSignalAverage {
    pub const NAME: &'static str = "Multi Signal Average";

    /// How often the average was computed since construction.
    pub fn computations(&self) -> usize {
        self.computations.load(Ordering::Relaxed)
    }

    fn compute(&self, ctx: &ProcessContext<'_>) -> BTreeMap<u32, Signal> {
        self.computations.fetch_add(1, Ordering::Relaxed);
        let valid: Vec<usize> = (0..ctx.mp_count()).filter(|mp| ctx.input_valid(*mp)).collect();
        debug!(points = valid.len(), "averaging measurement points");
        ctx.channel_ids
            .iter()
            .map(|id| {
                let signals: Vec<&Signal> = valid
                    .iter()
                    .filter_map(|mp| ctx.input_at(*mp, *id))
                    .filter(|s| !s.is_empty())
                    .collect();
                (*id, average(&signals, ctx.signal_type, *id))
            })
            .collect()
    }
}

fn average(signals: &[&Signal], signal_type: lii_signal::SignalType, channel_id: u32) -> Signal {
    let Some(first) = signals.first() else {
        return Signal::new(signal_type, channel_id);
    };
    let n = signals.iter().map(|s| s.len()).min().unwrap_or(0);
    let count = signals.len() as f64;
    let mut mean = vec![0.0; n];
    for s in signals {
        for (m, v) in mean.iter_mut().zip(&s.data) {
            *m += v / count;
        }
    }
    let stdev = if signals.len() > 1 {
        (0..n)
            .map(|i| {
                let ss: f64 = signals.iter().map(|s| (s.data[i] - mean[i]).powi(2)).sum();
                (ss / (count - 1.0)).sqrt()
            })
            .collect()
    } else {
        vec![0.0; n]
    };
    Signal {
        data: mean,
        stdev,
        fit_data: Vec::new(),
        ..Signal::with_data(signal_type, channel_id, first.start_time, first.dt, Vec::new())
    }
}

impl Clone for MultiSignalAverage {
    fn clone(&self) -> Self {
        Self::default()
    }
}

impl SignalProcessor for MultiSignalAverage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
    }

    fn set_from_inputs(&mut self, _inputs: &mut InputList) -> ProcessingResult<()> {
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let mut cache = self.averages.lock().unwrap_or_else(|e| e.into_inner());
        let averages = cache.get_or_insert_with(|| self.compute(ctx));
        match averages.get(&input.channel_id) {
            Some(avg) if !avg.is_empty() => {
                *output = avg.clone();
                Ok(true)
            }
            _ => {
                output.clear();
                Ok(false)
            }
        }
    }

    fn reset(&mut self) {
        *self.averages.get_mut().unwrap_or_else(|e| e.into_inner()) = None;
    }

    fn preserve_stdev(&self) -> bool {
        true
    }

    fn is_multi_signal_average(&self) -> bool {
        true
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
    use lii_signal::SignalType;

    #[test]
    fn mean_and_sample_stdev() {
        let a = Signal::with_data(SignalType::Raw, 1, 0.0, 1.0, vec![1.0, 2.0]);
        let b = Signal::with_data(SignalType::Raw, 1, 0.0, 1.0, vec![3.0, 2.0, 9.0]);
        let avg = average(&[&a, &b], SignalType::Raw, 1);
        assert_eq!(avg.data, vec![2.0, 2.0]);
        assert!((avg.stdev[0] - 2f64.sqrt()).abs() < 1e-12);
        assert_eq!(avg.stdev[1], 0.0);
    }

    #[test]
    fn no_signals_give_empty_average() {
        assert!(average(&[], SignalType::Abs, 2).is_empty());
    }
}

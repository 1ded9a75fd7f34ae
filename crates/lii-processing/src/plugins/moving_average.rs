use std::any::Any;

use lii_signal::Signal;

use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{ChannelSelection, InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Centred moving average; the window shrinks symmetrically at the edges.
#[derive(Debug, Clone)]
pub struct MovingAverage {
    window: usize,
    channels: ChannelSelection,
}

impl MovingAverage {
    pub const NAME: &'static str = "Moving Average";
}

impl Default for MovingAverage {
    fn default() -> Self {
        Self {
            window: 5,
            channels: ChannelSelection::default(),
        }
    }
}

fn smooth(data: &[f64], window: usize) -> Vec<f64> {
    let half = window / 2;
    let n = data.len();
    (0..n)
        .map(|i| {
            let reach = half.min(i).min(n - 1 - i);
            let slice = &data[i - reach..=i + reach];
            slice.iter().sum::<f64>() / slice.len() as f64
        })
        .collect()
}

impl SignalProcessor for MovingAverage {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::integer("window", "Window [samples]", 5).with_range(1.0, 1001.0))
            .with(PluginInput::checkbox_group("channels", "Channels"))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let window = inputs.i64("window")?;
        if window < 1 {
            return Err(ProcessingError::invalid_parameter("window", "must be at least one sample"));
        }
        self.channels = inputs.channel_flags("channels")?;
        self.window = window as usize;
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let selected = ctx
            .channel_position(input.channel_id)
            .is_some_and(|pos| self.channels.contains(pos));
        if selected && self.window > 1 {
            output.data = smooth(&input.data, self.window);
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
    fn edges_use_shrinking_window() {
        let out = smooth(&[0.0, 3.0, 6.0, 9.0, 30.0], 3);
        assert_eq!(out, vec![0.0, 3.0, 6.0, 15.0, 30.0]);
    }

    #[test]
    fn constant_is_unchanged() {
        assert_eq!(smooth(&[2.0; 6], 5), vec![2.0; 6]);
    }
}

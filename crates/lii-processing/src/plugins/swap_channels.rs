use std::any::Any;

use lii_signal::Signal;

use super::{missing_channel, positive_channel};
use crate::error::ProcessingResult;
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Exchanges the data of two channels.
#[derive(Debug, Clone)]
pub struct SwapChannels {
    channel_a: u32,
    channel_b: u32,
}

impl SwapChannels {
    pub const NAME: &'static str = "Swap Channels";
}

impl Default for SwapChannels {
    fn default() -> Self {
        Self {
            channel_a: 1,
            channel_b: 2,
        }
    }
}

impl SignalProcessor for SwapChannels {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::integer("channel_a", "Channel A", 1).with_range(1.0, 64.0))
            .with(PluginInput::integer("channel_b", "Channel B", 2).with_range(1.0, 64.0))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let channel_a = positive_channel("channel_a", inputs.i64("channel_a")?)?;
        let channel_b = positive_channel("channel_b", inputs.i64("channel_b")?)?;
        self.channel_a = channel_a;
        self.channel_b = channel_b;
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let partner = if input.channel_id == self.channel_a {
            self.channel_b
        } else if input.channel_id == self.channel_b {
            self.channel_a
        } else {
            return Ok(true);
        };
        let source = ctx.input(partner).ok_or_else(|| missing_channel(partner))?;
        *output = source.clone();
        Ok(true)
    }

    fn preserve_stdev(&self) -> bool {
        true
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalProcessor> {
        Box::new(self.clone())
    }
}

use std::any::Any;

use lii_signal::Signal;

use super::{OPERATORS, apply_operator, check_operator, missing_channel, positive_channel};
use crate::error::ProcessingResult;
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Writes `channel A <op> channel B` into the target channel, sample by
/// sample. Division by zero yields 0. Other channels pass through.
#[derive(Debug, Clone)]
pub struct SignalArithmetic {
    target: u32,
    channel_a: u32,
    operator: String,
    channel_b: u32,
}

impl SignalArithmetic {
    pub const NAME: &'static str = "Signal Arithmetic";
}

impl Default for SignalArithmetic {
    fn default() -> Self {
        Self {
            target: 1,
            channel_a: 1,
            operator: OPERATORS[0].to_string(),
            channel_b: 2,
        }
    }
}

impl SignalProcessor for SignalArithmetic {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::integer("target", "Target channel", 1).with_range(1.0, 64.0))
            .with(PluginInput::integer("channel_a", "Channel A", 1).with_range(1.0, 64.0))
            .with(PluginInput::combobox("operator", "Operator", &OPERATORS))
            .with(PluginInput::integer("channel_b", "Channel B", 2).with_range(1.0, 64.0))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let target = positive_channel("target", inputs.i64("target")?)?;
        let channel_a = positive_channel("channel_a", inputs.i64("channel_a")?)?;
        let channel_b = positive_channel("channel_b", inputs.i64("channel_b")?)?;
        let operator = inputs.text("operator")?;
        check_operator("operator", &operator)?;
        *self = Self {
            target,
            channel_a,
            operator,
            channel_b,
        };
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        if input.channel_id != self.target {
            return Ok(true);
        }
        let a = ctx.input(self.channel_a).ok_or_else(|| missing_channel(self.channel_a))?;
        let b = ctx.input(self.channel_b).ok_or_else(|| missing_channel(self.channel_b))?;
        output.data = a
            .data
            .iter()
            .zip(&b.data)
            .map(|(x, y)| apply_operator(&self.operator, *x, *y))
            .collect();
        output.start_time = a.start_time;
        output.dt = a.dt;
        output.fit_data.clear();
        Ok(true)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalProcessor> {
        Box::new(self.clone())
    }
}

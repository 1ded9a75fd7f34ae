use std::any::Any;

use lii_signal::Signal;

use super::{OPERATORS, apply_operator, check_operator};
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{ChannelSelection, InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Applies `signal <op> value` to the selected channels.
#[derive(Debug, Clone)]
pub struct Arithmetic {
    operator: String,
    value: f64,
    channels: ChannelSelection,
}

impl Arithmetic {
    pub const NAME: &'static str = "Arithmetic";
}

impl Default for Arithmetic {
    fn default() -> Self {
        Self {
            operator: "*".to_string(),
            value: 1.0,
            channels: ChannelSelection::default(),
        }
    }
}

impl SignalProcessor for Arithmetic {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::combobox("operator", "Operator", &["*", "+", "-", "/"]))
            .with(PluginInput::double("value", "Value", 1.0))
            .with(PluginInput::checkbox_group("channels", "Channels"))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let operator = inputs.text("operator")?;
        check_operator("operator", &operator)?;
        let value = inputs.f64("value")?;
        if operator == OPERATORS[3] && value == 0.0 {
            return Err(ProcessingError::invalid_parameter("value", "division by zero"));
        }
        self.channels = inputs.channel_flags("channels")?;
        self.operator = operator;
        self.value = value;
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let selected = ctx
            .channel_position(input.channel_id)
            .is_some_and(|pos| self.channels.contains(pos));
        if !selected {
            return Ok(true);
        }
        for v in output.data.iter_mut() {
            *v = apply_operator(&self.operator, *v, self.value);
        }
        if matches!(self.operator.as_str(), "*" | "/") {
            let factor = apply_operator(&self.operator, 1.0, self.value).abs();
            output.stdev.iter_mut().for_each(|s| *s *= factor);
        }
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

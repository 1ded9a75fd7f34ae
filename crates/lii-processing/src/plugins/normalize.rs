use std::any::Any;

use lii_signal::Signal;

use super::scale;
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

const PEAK: &str = "Peak";
const VALUE_AT_TIME: &str = "Value at time";

/// Divides the signal by its peak or by its value at a given time.
#[derive(Debug, Clone, Default)]
pub struct Normalize {
    at_time: Option<f64>,
}

impl Normalize {
    pub const NAME: &'static str = "Normalize";
}

impl SignalProcessor for Normalize {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::combobox("mode", "Mode", &[PEAK, VALUE_AT_TIME]))
            .with(PluginInput::double("time", "Time [s]", 0.0).in_group(1))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let mode = inputs.text("mode")?;
        let time = inputs.f64("time")?;
        self.at_time = match mode.as_str() {
            PEAK => None,
            VALUE_AT_TIME => Some(time),
            other => return Err(ProcessingError::invalid_parameter("mode", format!("unknown mode '{other}'"))),
        };
        inputs.show_group(if self.at_time.is_some() { 1 } else { 0 });
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let divisor = match self.at_time {
            None => input.max_value(),
            Some(t) => input.at(t),
        };
        match divisor {
            Some(d) if d != 0.0 && d.is_finite() => {
                scale(output, 1.0 / d);
                Ok(true)
            }
            _ => Err(ProcessingError::Calculation {
                what: format!("no normalization reference for channel {}", input.channel_id),
            }),
        }
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

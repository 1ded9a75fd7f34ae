use std::any::Any;

use lii_signal::Signal;

use super::check_window;
use crate::error::ProcessingResult;
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Replaces every sample inside a time window by a constant.
#[derive(Debug, Clone, Default)]
pub struct Overwrite {
    start: f64,
    end: f64,
    value: f64,
}

impl Overwrite {
    pub const NAME: &'static str = "Overwrite";
}

impl SignalProcessor for Overwrite {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::double("start", "Start [s]", 0.0))
            .with(PluginInput::double("end", "End [s]", 0.0))
            .with(PluginInput::double("value", "Value", 0.0))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let start = inputs.f64("start")?;
        let end = inputs.f64("end")?;
        check_window(start, end)?;
        self.value = inputs.f64("value")?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let slack = input.dt.abs() * 1e-6;
        for (i, v) in output.data.iter_mut().enumerate() {
            let t = input.time_at(i);
            if t >= self.start - slack && t <= self.end + slack {
                *v = self.value;
            }
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

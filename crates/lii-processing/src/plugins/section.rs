use std::any::Any;

use lii_signal::Signal;

use super::check_window;
use crate::error::ProcessingResult;
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Crops the signal to a time window. An empty section invalidates the sample.
#[derive(Debug, Clone)]
pub struct GetSignalSection {
    start: f64,
    end: f64,
}

impl GetSignalSection {
    pub const NAME: &'static str = "Get Signal Section";
}

impl Default for GetSignalSection {
    fn default() -> Self {
        Self { start: 0.0, end: 1e-6 }
    }
}

impl SignalProcessor for GetSignalSection {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::double("start", "Start [s]", 0.0))
            .with(PluginInput::double("end", "End [s]", 1e-6))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let start = inputs.f64("start")?;
        let end = inputs.f64("end")?;
        check_window(start, end)?;
        self.start = start;
        self.end = end;
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        *output = input.sub_section(self.start, self.end);
        Ok(!output.is_empty())
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

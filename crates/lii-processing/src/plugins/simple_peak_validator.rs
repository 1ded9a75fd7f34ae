use std::any::Any;

use lii_signal::Signal;

use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Marks a sample invalid when its peak lies outside `[min, max]`.
/// Data pass through unchanged.
#[derive(Debug, Clone)]
pub struct SimplePeakValidator {
    min: f64,
    max: f64,
}

impl SimplePeakValidator {
    pub const NAME: &'static str = "Simple Peak Validator";
}

impl Default for SimplePeakValidator {
    fn default() -> Self {
        Self { min: 0.0, max: 1e6 }
    }
}

impl SignalProcessor for SimplePeakValidator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::double("min", "Minimum peak", 0.0))
            .with(PluginInput::double("max", "Maximum peak", 1e6))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let min = inputs.f64("min")?;
        let max = inputs.f64("max")?;
        if max < min {
            return Err(ProcessingError::invalid_parameter("max", "must not be below the minimum"));
        }
        self.min = min;
        self.max = max;
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, input: &Signal, _output: &mut Signal) -> ProcessingResult<bool> {
        Ok(input.max_value().is_some_and(|peak| peak >= self.min && peak <= self.max))
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

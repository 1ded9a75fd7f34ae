use std::any::Any;

use lii_signal::Signal;

use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Averages consecutive bins of `factor` samples; dt grows by `factor`.
/// A trailing partial bin is averaged over the samples it has.
#[derive(Debug, Clone)]
pub struct ResolutionReducer {
    factor: usize,
}

impl ResolutionReducer {
    pub const NAME: &'static str = "Resolution Reducer";
}

impl Default for ResolutionReducer {
    fn default() -> Self {
        Self { factor: 2 }
    }
}

impl SignalProcessor for ResolutionReducer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new().with(PluginInput::integer("factor", "Factor", 2).with_range(1.0, 1000.0))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let factor = inputs.i64("factor")?;
        if factor < 1 {
            return Err(ProcessingError::invalid_parameter("factor", "must be at least 1"));
        }
        self.factor = factor as usize;
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        output.data = input
            .data
            .chunks(self.factor)
            .map(|bin| bin.iter().sum::<f64>() / bin.len() as f64)
            .collect();
        output.dt = input.dt * self.factor as f64;
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

use std::any::Any;

use lii_signal::Signal;
use tracing::warn;

use crate::error::ProcessingResult;
use crate::input::{InputList, InputValue, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Keeps every `dt_factor`-th sample.
///
/// A factor below 1 is not applied: the previous value is restored in the
/// parameter list and a warning is logged.
#[derive(Debug, Clone)]
pub struct SimpleDataReducer {
    dt_factor: usize,
}

impl SimpleDataReducer {
    pub const NAME: &'static str = "Simple Data Reducer";
}

impl Default for SimpleDataReducer {
    fn default() -> Self {
        Self { dt_factor: 2 }
    }
}

impl SignalProcessor for SimpleDataReducer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new().with(PluginInput::integer("dt_factor", "dt factor", 2).with_range(1.0, 1000.0))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let requested = inputs.i64("dt_factor")?;
        if requested < 1 {
            warn!(requested, kept = self.dt_factor, "dt factor below 1 ignored");
            inputs.set_value("dt_factor", InputValue::Integer(self.dt_factor as i64))?;
            return Ok(());
        }
        self.dt_factor = requested as usize;
        Ok(())
    }

    fn process(&self, _ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        output.data = input.data.iter().step_by(self.dt_factor).copied().collect();
        if input.has_stdev() {
            output.stdev = input.stdev.iter().step_by(self.dt_factor).copied().collect();
        }
        if input.fit_data.len() == input.len() {
            output.fit_data = input.fit_data.iter().step_by(self.dt_factor).cloned().collect();
        }
        output.dt = input.dt * self.dt_factor as f64;
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_factor_restores_previous_value() {
        let mut reducer = SimpleDataReducer::default();
        let mut inputs = reducer.default_inputs();
        inputs.set_value("dt_factor", InputValue::Integer(4)).unwrap();
        reducer.set_from_inputs(&mut inputs).unwrap();
        inputs.set_value("dt_factor", InputValue::Integer(0)).unwrap();
        reducer.set_from_inputs(&mut inputs).unwrap();
        assert_eq!(reducer.dt_factor, 4);
        assert_eq!(inputs.i64("dt_factor").unwrap(), 4);
    }
}

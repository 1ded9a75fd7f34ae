use std::any::Any;

use lii_signal::Signal;

use super::check_window;
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Subtracts the mean of a time window (typically the pre-trigger background).
#[derive(Debug, Clone)]
pub struct Baseline {
    start: f64,
    end: f64,
}

impl Baseline {
    pub const NAME: &'static str = "Baseline";
}

impl Default for Baseline {
    fn default() -> Self {
        Self { start: 0.0, end: 1e-8 }
    }
}

impl SignalProcessor for Baseline {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::double("start", "Start [s]", 0.0))
            .with(PluginInput::double("end", "End [s]", 1e-8))
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
        let offset = input
            .mean_over(self.start, self.end)
            .ok_or_else(|| ProcessingError::Calculation {
                what: format!(
                    "baseline window [{}, {}] s holds no samples of channel {}",
                    self.start, self.end, input.channel_id
                ),
            })?;
        output.data.iter_mut().for_each(|v| *v -= offset);
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

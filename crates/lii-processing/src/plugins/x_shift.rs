use std::any::Any;

use lii_signal::Signal;

use super::{missing_channel, positive_channel};
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

const PEAK_ALIGNMENT: &str = "Peak alignment";
const MANUAL: &str = "Manual";

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shift {
    /// Align every channel's peak with the reference channel's peak.
    Peak { reference: u32 },
    /// Move every channel by a fixed time [s].
    Manual(f64),
}

/// Shifts signals along the time axis.
#[derive(Debug, Clone)]
pub struct XShiftSignals {
    shift: Shift,
}

impl XShiftSignals {
    pub const NAME: &'static str = "X-Shift Signals";
}

impl Default for XShiftSignals {
    fn default() -> Self {
        Self {
            shift: Shift::Peak { reference: 1 },
        }
    }
}

fn peak_time(signal: &Signal) -> Option<f64> {
    signal.peak_index().map(|i| signal.time_at(i))
}

impl SignalProcessor for XShiftSignals {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::combobox("mode", "Mode", &[PEAK_ALIGNMENT, MANUAL]))
            .with(PluginInput::integer("reference", "Reference channel", 1).in_group(1))
            .with(PluginInput::double("shift", "Shift [s]", 0.0).in_group(2))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let mode = inputs.text("mode")?;
        let (shift, group) = match mode.as_str() {
            PEAK_ALIGNMENT => (
                Shift::Peak {
                    reference: positive_channel("reference", inputs.i64("reference")?)?,
                },
                1,
            ),
            MANUAL => (Shift::Manual(inputs.f64("shift")?), 2),
            other => return Err(ProcessingError::invalid_parameter("mode", format!("unknown mode '{other}'"))),
        };
        inputs.show_group(group);
        self.shift = shift;
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let delta = match self.shift {
            Shift::Manual(dt) => dt,
            Shift::Peak { reference } => {
                let reference_signal = ctx.input(reference).ok_or_else(|| missing_channel(reference))?;
                match (peak_time(reference_signal), peak_time(input)) {
                    (Some(t_ref), Some(t_own)) => t_ref - t_own,
                    _ => return Ok(false),
                }
            }
        };
        output.start_time = input.start_time + delta;
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

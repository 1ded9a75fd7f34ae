use std::any::Any;

use lii_signal::{RunDataSource, Signal};

use super::scale;
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Converts detector counts into absolute intensity.
///
/// The factor comes from the channel's calibration in the instrument settings,
/// or from a single manual factor applied to every channel.
#[derive(Debug, Clone)]
pub struct Calibration {
    use_settings: bool,
    factor: f64,
}

impl Calibration {
    pub const NAME: &'static str = "Calibration";
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            use_settings: true,
            factor: 1.0,
        }
    }
}

impl SignalProcessor for Calibration {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::checkbox("use_settings", "Use instrument calibration", true))
            .with(PluginInput::double("factor", "Manual factor", 1.0))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let use_settings = inputs.bool("use_settings")?;
        let factor = inputs.f64("factor")?;
        if !factor.is_finite() || factor == 0.0 {
            return Err(ProcessingError::invalid_parameter("factor", "must be finite and non-zero"));
        }
        inputs.set_enabled("factor", !use_settings);
        self.use_settings = use_settings;
        self.factor = factor;
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let factor = if self.use_settings {
            ctx.run
                .settings()
                .calibration(input.channel_id)
                .ok_or(ProcessingError::InvalidChannel {
                    what: "no calibration in instrument settings",
                    channel: input.channel_id,
                })?
        } else {
            self.factor
        };
        scale(output, factor);
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

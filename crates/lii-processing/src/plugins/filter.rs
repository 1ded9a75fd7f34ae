use std::any::Any;

use lii_signal::{RunDataSource, Signal};

use super::scale;
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Corrects for an optical filter by dividing by its channel transmission.
///
/// The selection names a filter of the instrument settings; `none` passes the
/// signal through.
#[derive(Debug, Clone)]
pub struct Filter {
    filter: String,
}

impl Filter {
    pub const NAME: &'static str = "Filter";
    pub const NO_FILTER: &'static str = "none";
}

impl Default for Filter {
    fn default() -> Self {
        Self {
            filter: Self::NO_FILTER.to_string(),
        }
    }
}

impl SignalProcessor for Filter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new().with(PluginInput::combobox("filter", "Filter", &[Self::NO_FILTER]))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let filter = inputs.text("filter")?;
        if filter.trim().is_empty() {
            return Err(ProcessingError::invalid_parameter("filter", "filter name is empty"));
        }
        self.filter = filter;
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        if self.filter.eq_ignore_ascii_case(Self::NO_FILTER) {
            return Ok(true);
        }
        let transmission = ctx
            .run
            .settings()
            .transmission(&self.filter, input.channel_id)
            .ok_or_else(|| ProcessingError::Calculation {
                what: format!("filter '{}' has no transmission for channel {}", self.filter, input.channel_id),
            })?;
        scale(output, 1.0 / transmission);
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

use std::any::Any;

use lii_signal::{Signal, SignalType};

use super::missing_channel;
use crate::error::ProcessingResult;
use crate::input::{InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// Replaces the absolute signal by the processed raw signal of the same channel.
#[derive(Debug, Clone, Default)]
pub struct Transfer;

impl Transfer {
    pub const NAME: &'static str = "Transfer";
}

impl SignalProcessor for Transfer {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new().with(PluginInput::combobox("source", "Source", &[SignalType::Raw.as_str()]))
    }

    fn set_from_inputs(&mut self, _inputs: &mut InputList) -> ProcessingResult<()> {
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        let source = ctx
            .source_signal(SignalType::Raw, input.channel_id)
            .ok_or_else(|| missing_channel(input.channel_id))?;
        *output = source.clone();
        Ok(!output.is_empty())
    }

    fn preserve_stdev(&self) -> bool {
        true
    }

    fn source_type(&self) -> Option<SignalType> {
        Some(SignalType::Raw)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalProcessor> {
        Box::new(self.clone())
    }
}

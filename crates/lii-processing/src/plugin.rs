//! Processing plugin framework.
//!
//! A [`ProcessingPlugin`] wraps a [`SignalProcessor`] kernel with the state
//! every processing step shares: activation, dirty flag, step buffer, link
//! state and parameter list.

use std::any::Any;

use lii_core::ChannelIdLease;
use lii_signal::{LiiSettings, RunData, RunDataSource, Signal, SignalType};
use tracing::warn;

use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{InputList, InputType};
use crate::step_buffer::StepBuffer;

/// Session-unique plugin identity.
pub type PluginUid = u64;

/// Scope at which a plugin's settings are shared across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LinkState {
    #[default]
    NoLink,
    Single,
    Group,
    All,
}

impl LinkState {
    pub fn code(&self) -> i64 {
        match self {
            Self::NoLink => -1,
            Self::Single => 0,
            Self::Group => 1,
            Self::All => 2,
        }
    }

    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            -1 => Some(Self::NoLink),
            0 => Some(Self::Single),
            1 => Some(Self::Group),
            2 => Some(Self::All),
            _ => None,
        }
    }
}

/// Where a stage reads its input from.
#[derive(Clone, Copy)]
pub enum Upstream<'a> {
    /// Unprocessed measurement points of the run.
    Pre,
    /// Step buffer of the preceding plugin.
    Stage(&'a StepBuffer),
}

/// Read-only view handed to kernels for one measurement point.
pub struct ProcessContext<'a> {
    pub signal_type: SignalType,
    pub mp_index: usize,
    pub channel_ids: &'a [u32],
    pub run: &'a RunData,
    upstream: Upstream<'a>,
}

impl<'a> ProcessContext<'a> {
    pub fn new(
        signal_type: SignalType,
        mp_index: usize,
        channel_ids: &'a [u32],
        run: &'a RunData,
        upstream: Upstream<'a>,
    ) -> Self {
        Self {
            signal_type,
            mp_index,
            channel_ids,
            run,
            upstream,
        }
    }

    pub fn mp_count(&self) -> usize {
        self.run.size_all_mpoints()
    }

    pub fn settings(&self) -> &LiiSettings {
        self.run.settings()
    }

    pub fn channel_position(&self, channel_id: u32) -> Option<usize> {
        self.channel_ids.iter().position(|id| *id == channel_id)
    }

    /// Stage input of `channel_id` at measurement point `mp`.
    pub fn input_at(&self, mp: usize, channel_id: u32) -> Option<&'a Signal> {
        match self.upstream {
            Upstream::Pre => self.run.pre(mp)?.signal(self.signal_type, channel_id),
            Upstream::Stage(buffer) => buffer.get(mp, self.channel_position(channel_id)?),
        }
    }

    /// Stage input of `channel_id` at the current measurement point.
    pub fn input(&self, channel_id: u32) -> Option<&'a Signal> {
        self.input_at(self.mp_index, channel_id)
    }

    /// Whether the previous stage was valid at `mp`. Unprocessed data always is.
    pub fn input_valid(&self, mp: usize) -> bool {
        match self.upstream {
            Upstream::Pre => true,
            Upstream::Stage(buffer) => buffer.valid_at(mp),
        }
    }

    /// Processed signal of another (already finished) chain at the current point.
    pub fn source_signal(&self, signal_type: SignalType, channel_id: u32) -> Option<&'a Signal> {
        self.run.post(self.mp_index)?.signal(signal_type, channel_id)
    }
}

/// Plugin-specific transformation of one channel signal.
pub trait SignalProcessor: Send + Sync {
    /// Registry name of the plugin.
    fn name(&self) -> &'static str;

    /// Parameter schema with default values.
    fn default_inputs(&self) -> InputList;

    /// Adopt parameter values. May normalise `inputs` (e.g. restore a rejected
    /// value); must leave the kernel unchanged when it returns an error.
    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()>;

    /// Transform `input` into `output` (pre-filled with a copy of `input`).
    /// Returns whether the sample is valid after this step.
    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool>;

    /// Called before every processing run.
    fn reset(&mut self) {}

    /// Keep `Signal::stdev` of the output instead of clearing it.
    fn preserve_stdev(&self) -> bool {
        false
    }

    /// Chains holding this plugin must not run concurrently with other runs.
    fn execute_synchronized(&self) -> bool {
        false
    }

    fn is_temperature_calculator(&self) -> bool {
        false
    }

    fn is_multi_signal_average(&self) -> bool {
        false
    }

    /// Temperature channel written by this plugin.
    fn temperature_channel(&self) -> Option<u32> {
        None
    }

    /// Switch to a shared temperature channel lease (linked calculators).
    fn adopt_temperature_channel(&mut self, _lease: ChannelIdLease) {}

    /// Signal type of the chain this plugin reads from besides its own.
    fn source_type(&self) -> Option<SignalType> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn clone_box(&self) -> Box<dyn SignalProcessor>;
}

/// Result of processing one channel at one measurement point.
pub struct ProcessOutcome {
    pub signal: Signal,
    pub valid: bool,
    pub error: Option<ProcessingError>,
}

/// One step of a processing chain.
pub struct ProcessingPlugin {
    kernel: Box<dyn SignalProcessor>,
    inputs: InputList,
    uid: PluginUid,
    position: usize,
    activated: bool,
    dirty: bool,
    step_buffer_enabled: bool,
    plot_visible: bool,
    link_state: LinkState,
    link_id: Option<u64>,
    buffer: StepBuffer,
    last_error: Option<String>,
}

impl std::fmt::Debug for ProcessingPlugin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessingPlugin")
            .field("name", &self.name())
            .field("uid", &self.uid)
            .field("position", &self.position)
            .field("activated", &self.activated)
            .field("link_state", &self.link_state)
            .finish()
    }
}

impl ProcessingPlugin {
    /// Wrap a kernel with its default parameters.
    pub fn new(mut kernel: Box<dyn SignalProcessor>, uid: PluginUid) -> ProcessingResult<Self> {
        let mut inputs = kernel.default_inputs();
        kernel.set_from_inputs(&mut inputs)?;
        Ok(Self {
            kernel,
            inputs,
            uid,
            position: 0,
            activated: true,
            dirty: true,
            step_buffer_enabled: false,
            plot_visible: false,
            link_state: LinkState::NoLink,
            link_id: None,
            buffer: StepBuffer::default(),
            last_error: None,
        })
    }

    /// Copy with a new identity: same kernel state, parameters and flags,
    /// empty step buffer, not linked.
    pub fn duplicate(&self, uid: PluginUid) -> Self {
        Self {
            kernel: self.kernel.clone_box(),
            inputs: self.inputs.clone(),
            uid,
            position: self.position,
            activated: self.activated,
            dirty: true,
            step_buffer_enabled: self.step_buffer_enabled,
            plot_visible: self.plot_visible,
            link_state: LinkState::NoLink,
            link_id: None,
            buffer: StepBuffer::default(),
            last_error: None,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kernel.name()
    }

    pub fn uid(&self) -> PluginUid {
        self.uid
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn activated(&self) -> bool {
        self.activated
    }

    /// Change activation. Deactivation also hides the plot.
    pub(crate) fn set_activated_flag(&mut self, activated: bool) {
        self.activated = activated;
        if !activated {
            self.plot_visible = false;
        }
        self.dirty = true;
    }

    pub fn dirty(&self) -> bool {
        self.dirty
    }

    pub(crate) fn set_dirty_flag(&mut self, dirty: bool) {
        self.dirty = dirty;
    }

    pub fn step_buffer_enabled(&self) -> bool {
        self.step_buffer_enabled
    }

    pub fn set_step_buffer_enabled(&mut self, enabled: bool) {
        self.step_buffer_enabled = enabled;
    }

    pub fn plot_visible(&self) -> bool {
        self.plot_visible
    }

    pub fn set_plot_visible(&mut self, visible: bool) {
        self.plot_visible = visible && self.activated;
    }

    pub fn link_state(&self) -> LinkState {
        self.link_state
    }

    pub fn link_id(&self) -> Option<u64> {
        self.link_id
    }

    pub(crate) fn set_link(&mut self, state: LinkState, link_id: Option<u64>) {
        self.link_state = state;
        self.link_id = if state == LinkState::NoLink { None } else { link_id };
    }

    pub fn inputs(&self) -> &InputList {
        &self.inputs
    }

    pub fn kernel(&self) -> &dyn SignalProcessor {
        self.kernel.as_ref()
    }

    pub(crate) fn kernel_mut(&mut self) -> &mut dyn SignalProcessor {
        self.kernel.as_mut()
    }

    pub fn preserve_stdev(&self) -> bool {
        self.kernel.preserve_stdev()
    }

    pub fn execute_synchronized(&self) -> bool {
        self.kernel.execute_synchronized()
    }

    pub fn is_temperature_calculator(&self) -> bool {
        self.kernel.is_temperature_calculator()
    }

    pub fn is_multi_signal_average(&self) -> bool {
        self.kernel.is_multi_signal_average()
    }

    pub fn temperature_channel(&self) -> Option<u32> {
        self.kernel.temperature_channel()
    }

    /// Message of the last failed sample in the most recent run.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub(crate) fn set_last_error(&mut self, error: Option<String>) {
        self.last_error = error;
    }

    pub fn buffer(&self) -> &StepBuffer {
        &self.buffer
    }

    pub(crate) fn buffer_mut(&mut self) -> &mut StepBuffer {
        &mut self.buffer
    }

    /// Apply a parameter list with the same schema as [`inputs`](Self::inputs).
    ///
    /// Combobox entries keep their option list; only the selection changes.
    /// On error nothing is modified.
    pub fn set_parameters(&mut self, new_inputs: &InputList) -> ProcessingResult<()> {
        self.inputs.check_schema(new_inputs)?;
        let mut candidate = self.inputs.clone();
        for input in new_inputs.iter() {
            let value = match input.input_type {
                InputType::Combobox => input.get(),
                _ => input.value.clone(),
            };
            candidate.set_value(&input.identifier, value)?;
            if let Some(target) = candidate.input_mut(&input.identifier) {
                target.enabled = input.enabled;
            }
        }
        let mut kernel = self.kernel.clone_box();
        kernel.set_from_inputs(&mut candidate)?;
        self.kernel = kernel;
        self.inputs = candidate;
        self.dirty = true;
        Ok(())
    }

    /// Re-run the kernel's parameter hook on the current inputs.
    pub(crate) fn refresh_from_inputs(&mut self) -> ProcessingResult<()> {
        let mut inputs = self.inputs.clone();
        self.kernel.set_from_inputs(&mut inputs)?;
        self.inputs = inputs;
        Ok(())
    }

    pub(crate) fn inputs_mut(&mut self) -> &mut InputList {
        &mut self.inputs
    }

    /// Process one channel. Inactive plugins pass the input through unchanged
    /// with the upstream validity. Upstream failures are passed through too,
    /// except for temperature calculators which observe them and multi-signal
    /// averages which read every valid point.
    pub fn process_signal(&self, ctx: &ProcessContext<'_>, channel_id: u32, input: &Signal) -> ProcessOutcome {
        let upstream_valid = ctx.input_valid(ctx.mp_index);
        let needs_valid_input = !self.kernel.is_temperature_calculator() && !self.kernel.is_multi_signal_average();
        if !self.activated || (!upstream_valid && needs_valid_input) {
            return ProcessOutcome {
                signal: input.clone(),
                valid: upstream_valid,
                error: None,
            };
        }
        let mut output = input.clone();
        match self.kernel.process(ctx, input, &mut output) {
            Ok(valid) => {
                if !self.kernel.preserve_stdev() {
                    output.stdev.clear();
                }
                output.signal_type = ctx.signal_type;
                output.channel_id = channel_id;
                ProcessOutcome {
                    signal: output,
                    valid,
                    error: None,
                }
            }
            Err(error) => {
                warn!(
                    plugin = self.name(),
                    mp = ctx.mp_index,
                    channel = channel_id,
                    %error,
                    "processing step failed"
                );
                ProcessOutcome {
                    signal: Signal::new(ctx.signal_type, channel_id),
                    valid: false,
                    error: Some(error),
                }
            }
        }
    }

    /// All channels passed this step at `mp`.
    pub fn valid_at(&self, mp: usize) -> bool {
        self.buffer.valid_at(mp)
    }

    /// Buffered output at `(mp, channel position)` if computed in `epoch`.
    pub fn step_signal(&self, mp: usize, position: usize, epoch: u64) -> Option<&Signal> {
        if self.buffer.is_current(epoch) {
            self.buffer.get(mp, position)
        } else {
            None
        }
    }
}

//! A measurement run: data plus its RAW, ABS and TEMPERATURE chains.

use std::fmt;

use lii_signal::{RunData, SignalType};
use tracing::debug;

use crate::chain::{BusyFlag, ProcessingChain};
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::InputList;
use crate::plugin::{PluginUid, ProcessingPlugin};

/// Outcome of the most recent processing of a run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CalculationStatus {
    #[default]
    Idle,
    Running,
    Finished,
    Cancelled,
    Failed(String),
}

impl fmt::Display for CalculationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Running => f.write_str("running"),
            Self::Finished => f.write_str("finished"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Failed(what) => write!(f, "failed: {what}"),
        }
    }
}

#[derive(Debug)]
pub struct MRun {
    name: String,
    group_id: u32,
    data: RunData,
    chains: [ProcessingChain; 3],
    busy: BusyFlag,
    status: CalculationStatus,
    messages: Vec<String>,
}

impl MRun {
    pub fn new(name: impl Into<String>, group_id: u32, data: RunData) -> Self {
        let busy = BusyFlag::default();
        Self {
            name: name.into(),
            group_id,
            data,
            chains: SignalType::ALL.map(|t| ProcessingChain::new(t, busy.clone())),
            busy,
            status: CalculationStatus::Idle,
            messages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn group_id(&self) -> u32 {
        self.group_id
    }

    pub fn set_group_id(&mut self, group_id: u32) {
        self.group_id = group_id;
    }

    pub fn data(&self) -> &RunData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut RunData {
        &mut self.data
    }

    pub fn chain(&self, signal_type: SignalType) -> &ProcessingChain {
        &self.chains[signal_type.index()]
    }

    pub(crate) fn chain_mut(&mut self, signal_type: SignalType) -> &mut ProcessingChain {
        &mut self.chains[signal_type.index()]
    }

    pub(crate) fn chain_and_data_mut(&mut self, signal_type: SignalType) -> (&mut ProcessingChain, &mut RunData) {
        (&mut self.chains[signal_type.index()], &mut self.data)
    }

    pub fn busy_flag(&self) -> &BusyFlag {
        &self.busy
    }

    pub fn is_busy(&self) -> bool {
        self.busy.is_busy()
    }

    pub fn status(&self) -> &CalculationStatus {
        &self.status
    }

    pub(crate) fn set_status(&mut self, status: CalculationStatus) {
        self.status = status;
    }

    /// Messages of plugins that failed on some samples in the last processing.
    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub(crate) fn messages_mut(&mut self) -> &mut Vec<String> {
        &mut self.messages
    }

    /// Chain and position of a plugin.
    pub fn find_plugin(&self, uid: PluginUid) -> Option<(SignalType, usize)> {
        self.chains
            .iter()
            .find_map(|c| c.position_of(uid).map(|pos| (c.signal_type(), pos)))
    }

    pub fn plugin(&self, uid: PluginUid) -> Option<&ProcessingPlugin> {
        self.chains.iter().find_map(|c| c.plugin_by_uid(uid))
    }

    pub(crate) fn plugin_mut(&mut self, uid: PluginUid) -> Option<&mut ProcessingPlugin> {
        self.chains.iter_mut().find_map(|c| c.plugin_mut(uid))
    }

    fn require(&self, uid: PluginUid) -> ProcessingResult<SignalType> {
        self.find_plugin(uid)
            .map(|(t, _)| t)
            .ok_or(ProcessingError::PluginNotFound { uid })
    }

    /// First plugin with this name and link id (used to rejoin linked plugins).
    pub fn linked_plugin(&self, name: &str, link_id: u64) -> Option<&ProcessingPlugin> {
        self.chains
            .iter()
            .flat_map(|c| c.plugins())
            .find(|p| p.name() == name && p.link_id() == Some(link_id))
    }

    fn release_channel(&mut self, channel: Option<u32>) {
        let Some(id) = channel else {
            return;
        };
        let still_used = self
            .chain(SignalType::Temperature)
            .plugins()
            .iter()
            .any(|p| p.temperature_channel() == Some(id));
        if !still_used {
            self.data.remove_temperature_channel(id);
            debug!(run = %self.name, id, "temperature channel removed");
        }
    }

    pub fn add_plugin(&mut self, signal_type: SignalType, plugin: ProcessingPlugin) -> ProcessingResult<usize> {
        let channel = plugin.temperature_channel();
        let position = self.chain_mut(signal_type).add(plugin)?;
        if let Some(id) = channel {
            self.data.add_temperature_channel(id);
        }
        Ok(position)
    }

    pub fn insert_plugin(
        &mut self,
        signal_type: SignalType,
        plugin: ProcessingPlugin,
        position: usize,
    ) -> ProcessingResult<usize> {
        let channel = plugin.temperature_channel();
        let position = self.chain_mut(signal_type).insert(plugin, position)?;
        if let Some(id) = channel {
            self.data.add_temperature_channel(id);
        }
        Ok(position)
    }

    pub fn remove_plugin(&mut self, uid: PluginUid) -> ProcessingResult<ProcessingPlugin> {
        let signal_type = self.require(uid)?;
        let plugin = self.chain_mut(signal_type).remove(uid)?;
        self.release_channel(plugin.temperature_channel());
        Ok(plugin)
    }

    pub fn move_plugin(&mut self, uid: PluginUid, position: usize) -> ProcessingResult<usize> {
        let signal_type = self.require(uid)?;
        self.chain_mut(signal_type).move_plugin(uid, position)
    }

    pub fn set_parameters(&mut self, uid: PluginUid, inputs: &InputList) -> ProcessingResult<()> {
        let signal_type = self.require(uid)?;
        self.chain_mut(signal_type).set_parameters(uid, inputs)
    }

    pub fn set_activated(&mut self, uid: PluginUid, activated: bool) -> ProcessingResult<()> {
        let signal_type = self.require(uid)?;
        self.chain_mut(signal_type).set_activated(uid, activated)
    }

    pub fn set_plot_visible(&mut self, uid: PluginUid, visible: bool) -> ProcessingResult<()> {
        self.plugin_mut(uid)
            .ok_or(ProcessingError::PluginNotFound { uid })?
            .set_plot_visible(visible);
        Ok(())
    }

    pub fn set_step_buffer_enabled(&mut self, uid: PluginUid, enabled: bool) -> ProcessingResult<()> {
        self.plugin_mut(uid)
            .ok_or(ProcessingError::PluginNotFound { uid })?
            .set_step_buffer_enabled(enabled);
        Ok(())
    }

    /// Replace a whole chain, keeping temperature channels in sync.
    pub fn replace_chain(
        &mut self,
        signal_type: SignalType,
        plugins: Vec<ProcessingPlugin>,
    ) -> ProcessingResult<Vec<ProcessingPlugin>> {
        let old = self.chain_mut(signal_type).replace(plugins)?;
        for plugin in &old {
            self.release_channel(plugin.temperature_channel());
        }
        let added: Vec<u32> = self
            .chain(signal_type)
            .plugins()
            .iter()
            .filter_map(|p| p.temperature_channel())
            .collect();
        for id in added {
            self.data.add_temperature_channel(id);
        }
        Ok(old)
    }

    /// Whether the chain of `signal_type` sees a single representative
    /// measurement point because an earlier chain averaged all points.
    ///
    /// ABS inherits from RAW when its input is derived from RAW; TEMPERATURE
    /// inherits from the source chain of any active temperature calculator.
    pub fn inherited_msa(&self, signal_type: SignalType) -> bool {
        match signal_type {
            SignalType::Raw => false,
            SignalType::Abs => !self.data.abs_imported() && self.contains_active_msa(SignalType::Raw),
            SignalType::Temperature => self
                .chain(SignalType::Temperature)
                .plugins()
                .iter()
                .filter(|p| p.activated() && p.is_temperature_calculator())
                .filter_map(|p| p.kernel().source_type())
                .any(|source| source != SignalType::Temperature && self.contains_active_msa(source)),
        }
    }

    /// Active multi-signal average in this chain or, transitively, its sources.
    pub fn contains_active_msa(&self, signal_type: SignalType) -> bool {
        self.chain(signal_type).contains_active_msa() || self.inherited_msa(signal_type)
    }

    /// Any plugin that must not run concurrently with other runs.
    pub fn requires_synchronized(&self) -> bool {
        self.chains
            .iter()
            .flat_map(|c| c.plugins())
            .any(|p| p.activated() && p.execute_synchronized())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::PluginFactory;
    use crate::plugins::{MultiSignalAverage, TemperatureCalculator};
    use lii_signal::{LiiSettings, RunDataSource};

    fn run() -> MRun {
        MRun::new("run", 0, RunData::new(LiiSettings::from_wavelengths("rig", &[650.0, 780.0]), 2))
    }

    #[test]
    fn calculators_register_temperature_channels() {
        let factory = PluginFactory::default();
        let mut run = run();
        let tc = factory.create(TemperatureCalculator::NAME, SignalType::Temperature).unwrap();
        let uid = tc.uid();
        run.data_mut().push_mpoint(Vec::new()).unwrap();
        run.add_plugin(SignalType::Temperature, tc).unwrap();
        assert_eq!(run.data().channel_ids(SignalType::Temperature), vec![1]);
        run.remove_plugin(uid).unwrap();
        assert!(run.data().channel_ids(SignalType::Temperature).is_empty());
    }

    #[test]
    fn msa_is_inherited_transitively() {
        let factory = PluginFactory::default();
        let mut run = run();
        run.add_plugin(SignalType::Raw, factory.create(MultiSignalAverage::NAME, SignalType::Raw).unwrap())
            .unwrap();
        assert!(run.contains_active_msa(SignalType::Abs));
        assert!(!run.contains_active_msa(SignalType::Temperature));
        run.add_plugin(
            SignalType::Temperature,
            factory.create(TemperatureCalculator::NAME, SignalType::Temperature).unwrap(),
        )
        .unwrap();
        assert!(run.contains_active_msa(SignalType::Temperature));
    }
}

//! Runs, link connectors and the commands that keep linked plugins in sync.
//!
//! Every command targets one plugin and is applied to the plugin and its
//! clone set in one call; nothing is mirrored back.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::AtomicBool;

use lii_core::TemperatureChannelRegistry;
use lii_signal::SignalType;
use tracing::{debug, warn};

use crate::connector::Connector;
use crate::error::{ProcessingError, ProcessingResult};
use crate::factory::PluginFactory;
use crate::input::InputList;
use crate::persistence;
use crate::plugin::{LinkState, PluginUid, ProcessingPlugin};
use crate::run::MRun;
use crate::task::{self, SchedulerOptions};

#[derive(Debug, Default)]
pub struct ProcessingSession {
    runs: Vec<MRun>,
    factory: PluginFactory,
    connectors: BTreeMap<u64, Connector>,
    next_link_id: u64,
}

impl ProcessingSession {
    pub fn new(factory: PluginFactory) -> Self {
        Self {
            runs: Vec::new(),
            factory,
            connectors: BTreeMap::new(),
            next_link_id: 0,
        }
    }

    pub fn factory(&self) -> &PluginFactory {
        &self.factory
    }

    pub fn registry(&self) -> &TemperatureChannelRegistry {
        self.factory.registry()
    }

    pub fn add_run(&mut self, run: MRun) -> usize {
        self.runs.push(run);
        self.runs.len() - 1
    }

    pub fn runs(&self) -> &[MRun] {
        &self.runs
    }

    pub fn run(&self, index: usize) -> ProcessingResult<&MRun> {
        self.runs.get(index).ok_or(ProcessingError::RunNotFound { index })
    }

    pub fn run_mut(&mut self, index: usize) -> ProcessingResult<&mut MRun> {
        self.runs.get_mut(index).ok_or(ProcessingError::RunNotFound { index })
    }

    /// Remove a run; its plugins leave their connectors.
    pub fn remove_run(&mut self, index: usize) -> ProcessingResult<MRun> {
        let run = self.run(index)?;
        if run.is_busy() {
            return Err(ProcessingError::Busy { what: "remove run" });
        }
        let run = self.runs.remove(index);
        for signal_type in SignalType::ALL {
            for plugin in run.chain(signal_type).plugins() {
                self.detach(plugin.uid());
            }
        }
        Ok(run)
    }

    pub fn connectors(&self) -> impl Iterator<Item = &Connector> {
        self.connectors.values()
    }

    pub fn connector(&self, id: u64) -> Option<&Connector> {
        self.connectors.get(&id)
    }

    fn locate(&self, uid: PluginUid) -> ProcessingResult<(usize, SignalType)> {
        self.runs
            .iter()
            .enumerate()
            .find_map(|(i, run)| run.find_plugin(uid).map(|(t, _)| (i, t)))
            .ok_or(ProcessingError::PluginNotFound { uid })
    }

    pub fn plugin(&self, uid: PluginUid) -> Option<&ProcessingPlugin> {
        self.runs.iter().find_map(|run| run.plugin(uid))
    }

    fn plugin_mut(&mut self, uid: PluginUid) -> Option<&mut ProcessingPlugin> {
        self.runs.iter_mut().find_map(|run| run.plugin_mut(uid))
    }

    fn connector_id(&self, uid: PluginUid) -> Option<u64> {
        let plugin = self.plugin(uid)?;
        if plugin.link_state() == LinkState::NoLink {
            return None;
        }
        plugin
            .link_id()
            .filter(|id| self.connectors.get(id).is_some_and(|c| c.contains(uid)))
    }

    /// Run group and link state of a plugin.
    fn member_info(&self, uid: PluginUid) -> Option<(u32, LinkState)> {
        self.runs
            .iter()
            .find_map(|run| run.plugin(uid).map(|p| (run.group_id(), p.link_state())))
    }

    /// Connector members whose run group and link state satisfy `keep`.
    fn members_where(&self, connector: u64, keep: impl Fn(u32, LinkState) -> bool) -> Vec<PluginUid> {
        self.connectors
            .get(&connector)
            .map(|c| {
                c.members()
                    .filter(|m| self.member_info(*m).is_some_and(|(g, s)| keep(g, s)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Plugins a change of `uid` is mirrored to (never `uid` itself).
    ///
    /// Empty for Single, same run group for Group, every member for All.
    pub fn clones(&self, uid: PluginUid) -> Vec<PluginUid> {
        let (Some(id), Some((group, state))) = (self.connector_id(uid), self.member_info(uid)) else {
            return Vec::new();
        };
        let mut clones = match state {
            LinkState::NoLink | LinkState::Single => Vec::new(),
            LinkState::Group => self.members_where(id, |g, s| g == group && s == LinkState::Group),
            LinkState::All => self.members_where(id, |_, s| s == LinkState::All),
        };
        clones.retain(|m| *m != uid);
        clones
    }

    fn targets(&self, uid: PluginUid) -> Vec<PluginUid> {
        let mut targets = vec![uid];
        targets.extend(self.clones(uid));
        targets
    }

    fn ensure_idle(&self, uids: &[PluginUid], what: &'static str) -> ProcessingResult<()> {
        for uid in uids {
            let (run, _) = self.locate(*uid)?;
            if self.runs[run].is_busy() {
                warn!(run = self.runs[run].name(), what, "linked change rejected while run is busy");
                return Err(ProcessingError::Busy { what });
            }
        }
        Ok(())
    }

    fn detach(&mut self, uid: PluginUid) {
        for connector in self.connectors.values_mut() {
            connector.remove(uid);
        }
        self.connectors.retain(|_, c| !c.is_empty());
    }

    /// Create a plugin by name and append it to a run's chain.
    pub fn add_plugin(&mut self, run: usize, signal_type: SignalType, name: &str) -> ProcessingResult<PluginUid> {
        let plugin = self.factory.create(name, signal_type)?;
        let uid = plugin.uid();
        self.run_mut(run)?.add_plugin(signal_type, plugin)?;
        Ok(uid)
    }

    pub fn remove_plugin(&mut self, uid: PluginUid) -> ProcessingResult<()> {
        let targets = self.targets(uid);
        self.ensure_idle(&targets, "remove plugin")?;
        for target in targets {
            let (run, _) = self.locate(target)?;
            self.runs[run].remove_plugin(target)?;
            self.detach(target);
        }
        Ok(())
    }

    pub fn move_plugin(&mut self, uid: PluginUid, position: usize) -> ProcessingResult<usize> {
        let targets = self.targets(uid);
        self.ensure_idle(&targets, "move plugin")?;
        let mut moved_to = position;
        for target in targets {
            let (run, _) = self.locate(target)?;
            let to = self.runs[run].move_plugin(target, position)?;
            if target == uid {
                moved_to = to;
            }
        }
        Ok(moved_to)
    }

    /// Apply parameters to `uid`, then its normalised parameters to its clones.
    pub fn set_parameters(&mut self, uid: PluginUid, inputs: &InputList) -> ProcessingResult<()> {
        let clones = self.clones(uid);
        let (run, _) = self.locate(uid)?;
        self.runs[run].set_parameters(uid, inputs)?;
        let applied = self.runs[run]
            .plugin(uid)
            .map(|p| p.inputs().clone())
            .ok_or(ProcessingError::PluginNotFound { uid })?;
        for clone in clones {
            let (run, _) = self.locate(clone)?;
            self.runs[run].set_parameters(clone, &applied)?;
        }
        Ok(())
    }

    pub fn set_activated(&mut self, uid: PluginUid, activated: bool) -> ProcessingResult<()> {
        let targets = self.targets(uid);
        self.ensure_idle(&targets, "change activation")?;
        for target in targets {
            let (run, _) = self.locate(target)?;
            self.runs[run].set_activated(target, activated)?;
        }
        Ok(())
    }

    pub fn set_plot_visible(&mut self, uid: PluginUid, visible: bool) -> ProcessingResult<()> {
        for target in self.targets(uid) {
            let (run, _) = self.locate(target)?;
            self.runs[run].set_plot_visible(target, visible)?;
        }
        Ok(())
    }

    pub fn set_step_buffer_enabled(&mut self, uid: PluginUid, enabled: bool) -> ProcessingResult<()> {
        for target in self.targets(uid) {
            let (run, _) = self.locate(target)?;
            self.runs[run].set_step_buffer_enabled(target, enabled)?;
        }
        Ok(())
    }

    fn set_link(&mut self, uids: &[PluginUid], state: LinkState, id: u64) {
        for uid in uids {
            if let Some(plugin) = self.plugin_mut(*uid) {
                plugin.set_link(state, Some(id));
            }
        }
    }

    /// Copy `uid`'s parameters onto `targets`.
    fn copy_parameters(&mut self, uid: PluginUid, targets: &[PluginUid]) -> ProcessingResult<()> {
        let inputs = self
            .plugin(uid)
            .map(|p| p.inputs().clone())
            .ok_or(ProcessingError::PluginNotFound { uid })?;
        for target in targets.iter().filter(|t| **t != uid) {
            let (run, _) = self.locate(*target)?;
            self.runs[run].set_parameters(*target, &inputs)?;
        }
        Ok(())
    }

    /// Give every run without a member of `connector` a copy of `uid`, at the
    /// same chain position. Temperature calculator copies share its channel.
    fn create_missing_clones(&mut self, uid: PluginUid, connector: u64) -> ProcessingResult<()> {
        let (home, signal_type) = self.locate(uid)?;
        let members: Vec<PluginUid> = self
            .connectors
            .get(&connector)
            .map(|c| c.members().collect())
            .unwrap_or_default();
        let template = self.runs[home]
            .plugin(uid)
            .ok_or(ProcessingError::PluginNotFound { uid })?;
        let mut copies = Vec::new();
        for (index, run) in self.runs.iter().enumerate() {
            if index == home || members.iter().any(|m| run.plugin(*m).is_some()) {
                continue;
            }
            let mut copy = self.factory.duplicate(template, true);
            copy.set_link(LinkState::Single, Some(connector));
            copies.push((index, copy));
        }
        let position = template.position();
        for (index, copy) in copies {
            let copy_uid = copy.uid();
            self.runs[index].insert_plugin(signal_type, copy, position)?;
            if let Some(c) = self.connectors.get_mut(&connector) {
                c.insert(copy_uid);
            }
            debug!(run = self.runs[index].name(), uid = copy_uid, "linked clone created");
        }
        Ok(())
    }

    /// Change the link scope of `uid` and everything linked to it.
    pub fn set_link_state(&mut self, uid: PluginUid, state: LinkState) -> ProcessingResult<()> {
        let (previous, name) = self
            .plugin(uid)
            .map(|p| (p.link_state(), p.name()))
            .ok_or(ProcessingError::PluginNotFound { uid })?;
        if previous == state {
            return Ok(());
        }
        let (run, _) = self.locate(uid)?;
        let group = self.runs[run].group_id();

        if state == LinkState::NoLink {
            let members: Vec<PluginUid> = match self.connector_id(uid) {
                Some(id) => self.connectors.remove(&id).map(|c| c.members().collect()).unwrap_or_default(),
                None => vec![uid],
            };
            for member in members {
                if let Some(plugin) = self.plugin_mut(member) {
                    plugin.set_link(LinkState::NoLink, None);
                }
            }
            return Ok(());
        }

        let id = match self.connector_id(uid) {
            Some(id) => id,
            None => {
                let id = self.next_link_id;
                self.next_link_id += 1;
                let mut connector = Connector::new(id, name);
                connector.insert(uid);
                self.connectors.insert(id, connector);
                self.set_link(&[uid], LinkState::Single, id);
                self.create_missing_clones(uid, id)?;
                id
            }
        };

        match state {
            LinkState::Single => {
                let targets = match previous {
                    LinkState::All => self.members_where(id, |_, s| s == LinkState::All),
                    LinkState::Group => self.members_where(id, |g, s| g == group && s == LinkState::Group),
                    _ => vec![uid],
                };
                self.set_link(&targets, LinkState::Single, id);
            }
            LinkState::Group if previous == LinkState::All => {
                let targets = self.members_where(id, |_, s| s == LinkState::All);
                self.set_link(&targets, LinkState::Group, id);
            }
            LinkState::Group => {
                self.create_missing_clones(uid, id)?;
                let targets = self.members_where(id, |g, _| g == group);
                self.copy_parameters(uid, &targets)?;
                self.set_link(&targets, LinkState::Group, id);
            }
            LinkState::All => {
                self.create_missing_clones(uid, id)?;
                let targets = self.members_where(id, |_, _| true);
                self.copy_parameters(uid, &targets)?;
                self.set_link(&targets, LinkState::All, id);
            }
            LinkState::NoLink => {}
        }
        debug!(uid, ?previous, ?state, connector = id, "link state changed");
        Ok(())
    }

    pub fn save_chain(&self, run: usize, signal_type: SignalType) -> ProcessingResult<String> {
        persistence::save_chain(self.run(run)?.chain(signal_type))
    }

    /// Temperature channels of `run`'s calculators that no other run uses, in
    /// chain order.
    fn private_channels(&self, run: usize, signal_type: SignalType) -> ProcessingResult<VecDeque<u32>> {
        let own = self.run(run)?.chain(signal_type).plugins();
        Ok(own
            .iter()
            .filter_map(ProcessingPlugin::temperature_channel)
            .filter(|id| {
                self.runs
                    .iter()
                    .enumerate()
                    .filter(|(index, _)| *index != run)
                    .flat_map(|(_, r)| r.chain(SignalType::Temperature).plugins())
                    .all(|p| p.temperature_channel() != Some(*id))
            })
            .collect())
    }

    /// Replace a run's chain from saved text. Plugins saved with a link id
    /// rejoin the connector with that id; linked temperature calculators
    /// adopt the channel of the connector's existing members, the others take
    /// over the channels of the calculators they replace.
    pub fn load_chain(&mut self, run: usize, signal_type: SignalType, text: &str) -> ProcessingResult<()> {
        let mut reusable = self.private_channels(run, signal_type)?;
        let mut plugins = persistence::load_chain(text, &self.factory, signal_type)?;
        for plugin in plugins.iter_mut() {
            let mut shared = None;
            if let Some(link_id) = plugin.link_id() {
                if let Some(connector) = self.connectors.get(&link_id) {
                    if connector.plugin_name() != plugin.name() {
                        warn!(link_id, plugin = plugin.name(), "link id belongs to another plugin, unlinking");
                        plugin.set_link(LinkState::NoLink, None);
                    } else {
                        shared = connector
                            .members()
                            .find_map(|m| self.plugin(m).and_then(ProcessingPlugin::temperature_channel));
                    }
                }
            }
            if !plugin.is_temperature_calculator() {
                continue;
            }
            if let Some(channel) = shared.or_else(|| reusable.pop_front()) {
                reusable.retain(|id| *id != channel);
                plugin
                    .kernel_mut()
                    .adopt_temperature_channel(self.factory.registry().retain(channel));
            }
        }

        let old = self.runs[run].replace_chain(signal_type, plugins)?;
        for plugin in &old {
            self.detach(plugin.uid());
        }
        let linked: Vec<(PluginUid, &'static str, u64)> = self.runs[run]
            .chain(signal_type)
            .plugins()
            .iter()
            .filter_map(|p| p.link_id().map(|id| (p.uid(), p.name(), id)))
            .collect();
        for (uid, name, id) in linked {
            self.connectors
                .entry(id)
                .or_insert_with(|| Connector::new(id, name))
                .insert(uid);
            self.next_link_id = self.next_link_id.max(id + 1);
        }
        Ok(())
    }

    /// Process every run (see [`task::process_all`]).
    pub fn process_all(&mut self, options: &SchedulerOptions, stop: &AtomicBool) -> Vec<ProcessingResult<()>> {
        task::process_all(&mut self.runs, options, stop)
    }
}

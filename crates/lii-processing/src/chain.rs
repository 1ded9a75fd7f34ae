//! Ordered plugin chains operating on one signal type of a run.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use lii_signal::{RunData, RunDataSource, Signal, SignalType};
use tracing::{debug, warn};

use crate::error::{ProcessingError, ProcessingResult};
use crate::input::InputList;
use crate::plugin::{PluginUid, ProcessContext, ProcessingPlugin, Upstream};

/// Shared "run is being processed" flag.
#[derive(Debug, Clone, Default)]
pub struct BusyFlag(Arc<AtomicBool>);

impl BusyFlag {
    pub fn is_busy(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// Mark busy until the guard is dropped; `None` when already busy.
    pub fn try_acquire(&self) -> Option<BusyGuard> {
        self.0
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| BusyGuard(self.0.clone()))
    }
}

#[derive(Debug)]
pub struct BusyGuard(Arc<AtomicBool>);

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Plugins applied in order to every measurement point of one signal type.
///
/// On temperature chains all temperature calculators form a contiguous
/// prefix; other plugins are never placed in front of them.
#[derive(Debug)]
pub struct ProcessingChain {
    signal_type: SignalType,
    plugins: Vec<ProcessingPlugin>,
    msa_position: Option<usize>,
    epoch: u64,
    busy: BusyFlag,
}

impl ProcessingChain {
    pub fn new(signal_type: SignalType, busy: BusyFlag) -> Self {
        Self {
            signal_type,
            plugins: Vec::new(),
            msa_position: None,
            epoch: 0,
            busy,
        }
    }

    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn plugins(&self) -> &[ProcessingPlugin] {
        &self.plugins
    }

    pub fn plugin(&self, position: usize) -> Option<&ProcessingPlugin> {
        self.plugins.get(position)
    }

    pub fn position_of(&self, uid: PluginUid) -> Option<usize> {
        self.plugins.iter().position(|p| p.uid() == uid)
    }

    pub fn plugin_by_uid(&self, uid: PluginUid) -> Option<&ProcessingPlugin> {
        self.plugins.iter().find(|p| p.uid() == uid)
    }

    /// Epoch of the most recent calculation.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Position of the first active multi-signal average at the last calculation.
    pub fn msa_position(&self) -> Option<usize> {
        self.msa_position
    }

    fn check_idle(&self, what: &'static str) -> ProcessingResult<()> {
        if self.busy.is_busy() {
            warn!(chain = %self.signal_type, what, "chain change rejected while run is busy");
            return Err(ProcessingError::Busy { what });
        }
        Ok(())
    }

    fn tc_count(&self) -> usize {
        if self.signal_type != SignalType::Temperature {
            return 0;
        }
        self.plugins
            .iter()
            .take_while(|p| p.is_temperature_calculator())
            .count()
    }

    /// Clamp a requested position to the ordering policy for `plugin`.
    fn allowed_position(&self, is_tc: bool, requested: usize, len: usize) -> usize {
        let tc_count = self.tc_count();
        let position = requested.min(len);
        if self.signal_type != SignalType::Temperature {
            position
        } else if is_tc {
            position.min(tc_count)
        } else {
            position.max(tc_count)
        }
    }

    fn renumber(&mut self) {
        for (i, plugin) in self.plugins.iter_mut().enumerate() {
            plugin.set_position(i);
        }
    }

    /// Append a plugin. Temperature calculators are placed at the end of the
    /// calculator prefix.
    pub fn add(&mut self, plugin: ProcessingPlugin) -> ProcessingResult<usize> {
        let position = if plugin.is_temperature_calculator() {
            self.tc_count()
        } else {
            self.plugins.len()
        };
        self.insert(plugin, position)
    }

    /// Insert at `position` (clamped to the ordering policy). Returns the final position.
    pub fn insert(&mut self, plugin: ProcessingPlugin, position: usize) -> ProcessingResult<usize> {
        self.check_idle("insert plugin")?;
        if plugin.is_temperature_calculator() && self.signal_type != SignalType::Temperature {
            return Err(ProcessingError::UnknownPlugin {
                name: plugin.name().to_string(),
                signal_type: self.signal_type,
            });
        }
        let position = self.allowed_position(plugin.is_temperature_calculator(), position, self.plugins.len());
        self.plugins.insert(position, plugin);
        self.renumber();
        self.mark_dirty(position);
        Ok(position)
    }

    pub fn remove(&mut self, uid: PluginUid) -> ProcessingResult<ProcessingPlugin> {
        self.check_idle("remove plugin")?;
        let position = self.position_of(uid).ok_or(ProcessingError::PluginNotFound { uid })?;
        let plugin = self.plugins.remove(position);
        self.renumber();
        self.mark_dirty(position);
        Ok(plugin)
    }

    /// Move a plugin to `position` (clamped to the ordering policy).
    pub fn move_plugin(&mut self, uid: PluginUid, position: usize) -> ProcessingResult<usize> {
        self.check_idle("move plugin")?;
        let from = self.position_of(uid).ok_or(ProcessingError::PluginNotFound { uid })?;
        let plugin = self.plugins.remove(from);
        let to = self.allowed_position(plugin.is_temperature_calculator(), position, self.plugins.len());
        self.plugins.insert(to, plugin);
        self.renumber();
        self.mark_dirty(from.min(to));
        Ok(to)
    }

    /// Replace every plugin, returning the previous ones.
    pub fn replace(&mut self, plugins: Vec<ProcessingPlugin>) -> ProcessingResult<Vec<ProcessingPlugin>> {
        self.check_idle("replace chain")?;
        let old = std::mem::take(&mut self.plugins);
        for plugin in plugins {
            let position = self.allowed_position(plugin.is_temperature_calculator(), usize::MAX, self.plugins.len());
            self.plugins.insert(position, plugin);
        }
        self.renumber();
        self.mark_dirty(0);
        Ok(old)
    }

    /// Mark `position` and every later plugin dirty.
    pub fn mark_dirty(&mut self, position: usize) {
        for plugin in self.plugins.iter_mut().skip(position) {
            plugin.set_dirty_flag(true);
        }
    }

    pub fn set_activated(&mut self, uid: PluginUid, activated: bool) -> ProcessingResult<()> {
        self.check_idle("change activation")?;
        let position = self.position_of(uid).ok_or(ProcessingError::PluginNotFound { uid })?;
        self.plugins[position].set_activated_flag(activated);
        self.mark_dirty(position);
        Ok(())
    }

    pub fn set_parameters(&mut self, uid: PluginUid, inputs: &InputList) -> ProcessingResult<()> {
        let position = self.position_of(uid).ok_or(ProcessingError::PluginNotFound { uid })?;
        self.plugins[position].set_parameters(inputs)?;
        self.mark_dirty(position);
        Ok(())
    }

    pub(crate) fn plugin_mut(&mut self, uid: PluginUid) -> Option<&mut ProcessingPlugin> {
        self.plugins.iter_mut().find(|p| p.uid() == uid)
    }

    /// Whether an active multi-signal average is part of this chain.
    pub fn contains_active_msa(&self) -> bool {
        self.plugins
            .iter()
            .any(|p| p.activated() && p.is_multi_signal_average())
    }

    /// True when every active plugin passed at `mp` (trivially for an empty chain).
    pub fn is_valid(&self, mp: usize) -> bool {
        self.plugins.iter().all(|p| !p.activated() || p.valid_at(mp))
    }

    /// Start a new epoch: reshape step buffers, reset kernels, mark everything dirty.
    pub fn initialize_calculation(&mut self, mp_count: usize, channel_count: usize) {
        self.epoch += 1;
        self.msa_position = self
            .plugins
            .iter()
            .position(|p| p.activated() && p.is_multi_signal_average());
        let epoch = self.epoch;
        for plugin in self.plugins.iter_mut() {
            plugin.buffer_mut().prepare(mp_count, channel_count, epoch);
            plugin.kernel_mut().reset();
            plugin.set_last_error(None);
        }
        self.mark_dirty(0);
    }

    /// Run plugin `index` over all measurement points.
    ///
    /// With an active multi-signal average at or before `index` (or inherited
    /// from the source chain) only point 0 is computed; the other points are
    /// counted as valid and receive copies of point 0 on commit.
    fn process_stage(&mut self, index: usize, run: &RunData, channel_ids: &[u32], inherited_msa: bool) {
        let single_point = inherited_msa || self.msa_position.is_some_and(|m| m <= index);
        let mp_count = run.size_all_mpoints();
        let signal_type = self.signal_type;
        let (before, rest) = self.plugins.split_at_mut(index);
        let Some(plugin) = rest.first_mut() else {
            return;
        };
        let upstream = before.last().map_or(Upstream::Pre, |p| Upstream::Stage(p.buffer()));
        let computed = if single_point { mp_count.min(1) } else { mp_count };

        let mut last_error = None;
        let mut failures = 0usize;
        for mp in 0..computed {
            let ctx = ProcessContext::new(signal_type, mp, channel_ids, run, upstream);
            let mut outputs = Vec::with_capacity(channel_ids.len());
            let mut valid = 0usize;
            for &channel_id in channel_ids {
                let empty;
                let input = match ctx.input(channel_id) {
                    Some(signal) => signal,
                    None => {
                        empty = Signal::new(signal_type, channel_id);
                        &empty
                    }
                };
                let mut outcome = plugin.process_signal(&ctx, channel_id, input);
                if let Some(error) = outcome.error {
                    failures += 1;
                    last_error = Some(error.to_string());
                }
                if outcome.valid {
                    valid += 1;
                }
                outcome.signal.shrink_to_fit();
                outputs.push(outcome.signal);
            }
            let buffer = plugin.buffer_mut();
            buffer.store(mp, outputs);
            buffer.set_validity(mp, valid);
            if valid != channel_ids.len() {
                buffer.clear_mpoint(mp);
            }
        }
        if single_point {
            for mp in computed..mp_count {
                plugin.buffer_mut().set_validity(mp, channel_ids.len());
            }
        }
        if failures > 0 {
            warn!(plugin = plugin.name(), failures, "processing step reported errors");
        }
        plugin.set_last_error(last_error);
        plugin.set_dirty_flag(false);
        debug!(chain = %signal_type, plugin = plugin.name(), index, "stage finished");

        if let Some(previous) = before.last_mut() {
            if !previous.step_buffer_enabled() {
                previous.buffer_mut().release();
            }
        }
    }

    /// First plugin whose output stands for every measurement point, if any.
    fn single_point_start(&self, inherited_msa: bool) -> Option<usize> {
        if inherited_msa { Some(0) } else { self.msa_position }
    }

    /// Write the chain result into the run's post measurement points.
    ///
    /// Behind a multi-signal average every point receives the same signals:
    /// validity is taken from point 0 of the averaging stage onwards, since the
    /// stages before it reject points individually.
    fn commit_post(&mut self, run: &mut RunData, channel_ids: &[u32], inherited_msa: bool) -> ProcessingResult<()> {
        let single_point_start = self.single_point_start(inherited_msa);
        for mp in 0..run.size_all_mpoints() {
            let (source_mp, valid) = match single_point_start {
                Some(start) => (0, self.plugins.iter().skip(start).all(|p| !p.activated() || p.valid_at(0))),
                None => (mp, self.is_valid(mp)),
            };
            let mut signals = Vec::with_capacity(channel_ids.len());
            for (position, &channel_id) in channel_ids.iter().enumerate() {
                let signal = match self.plugins.last() {
                    Some(last) => last.buffer().get(source_mp, position).cloned(),
                    None => run
                        .pre(source_mp)
                        .and_then(|p| p.signal(self.signal_type, channel_id))
                        .cloned(),
                };
                let mut signal = signal.unwrap_or_else(|| Signal::new(self.signal_type, channel_id));
                signal.signal_type = self.signal_type;
                signal.channel_id = channel_id;
                if !self.plugins.is_empty() && !valid {
                    signal.clear();
                }
                signals.push(signal);
            }
            let post = run.post_mut(mp)?;
            for signal in signals {
                post.set_signal(signal)?;
            }
        }
        if let Some(last) = self.plugins.last_mut() {
            if !last.step_buffer_enabled() {
                last.buffer_mut().release();
            }
        }
        Ok(())
    }

    /// Process every plugin in order and publish the result to `run`'s post data.
    ///
    /// `stop` is checked between stages. Returns the per-plugin error messages.
    pub fn process(&mut self, run: &mut RunData, inherited_msa: bool, stop: &AtomicBool) -> ProcessingResult<Vec<String>> {
        let channel_ids = run.channel_ids(self.signal_type);
        self.initialize_calculation(run.size_all_mpoints(), channel_ids.len());
        for index in 0..self.plugins.len() {
            if stop.load(Ordering::Relaxed) {
                return Err(ProcessingError::Cancelled);
            }
            self.process_stage(index, run, &channel_ids, inherited_msa);
        }
        if stop.load(Ordering::Relaxed) {
            return Err(ProcessingError::Cancelled);
        }
        self.commit_post(run, &channel_ids, inherited_msa)?;
        Ok(self
            .plugins
            .iter()
            .filter_map(|p| p.last_error().map(|e| format!("{}: {e}", p.name())))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::PluginFactory;
    use crate::plugins::{Baseline, Overwrite, TemperatureCalculator};

    fn chain_with(names: &[&str]) -> (PluginFactory, ProcessingChain) {
        let factory = PluginFactory::default();
        let mut chain = ProcessingChain::new(SignalType::Raw, BusyFlag::default());
        for name in names {
            chain.add(factory.create(name, SignalType::Raw).unwrap()).unwrap();
        }
        (factory, chain)
    }

    #[test]
    fn positions_follow_edits() {
        let (factory, mut chain) = chain_with(&[Baseline::NAME, Overwrite::NAME]);
        let extra = factory.create(Baseline::NAME, SignalType::Raw).unwrap();
        let uid = extra.uid();
        assert_eq!(chain.insert(extra, 0).unwrap(), 0);
        assert!(chain.plugins().iter().enumerate().all(|(i, p)| p.position() == i));
        assert_eq!(chain.move_plugin(uid, 9).unwrap(), 2);
        assert_eq!(chain.plugin(2).unwrap().uid(), uid);
        chain.remove(uid).unwrap();
        assert_eq!(chain.len(), 2);
        assert!(chain.plugins().iter().enumerate().all(|(i, p)| p.position() == i));
    }

    #[test]
    fn busy_run_rejects_structural_changes() {
        let (factory, mut chain) = chain_with(&[Baseline::NAME]);
        let uid = chain.plugin(0).unwrap().uid();
        let guard = chain.busy.try_acquire().unwrap();
        assert!(chain.busy.try_acquire().is_none());
        let extra = factory.create(Overwrite::NAME, SignalType::Raw).unwrap();
        assert!(matches!(chain.add(extra), Err(ProcessingError::Busy { .. })));
        assert!(matches!(chain.move_plugin(uid, 0), Err(ProcessingError::Busy { .. })));
        assert!(matches!(chain.set_activated(uid, false), Err(ProcessingError::Busy { .. })));
        assert!(chain.plugin(0).unwrap().activated());
        drop(guard);
        assert!(chain.set_activated(uid, false).is_ok());
    }

    #[test]
    fn temperature_calculators_stay_in_front() {
        let factory = PluginFactory::default();
        let mut chain = ProcessingChain::new(SignalType::Temperature, BusyFlag::default());
        let smoothing = factory.create(Overwrite::NAME, SignalType::Temperature).unwrap();
        let smoothing_uid = smoothing.uid();
        chain.add(smoothing).unwrap();
        let tc1 = factory.create(TemperatureCalculator::NAME, SignalType::Temperature).unwrap();
        let tc2 = factory.create(TemperatureCalculator::NAME, SignalType::Temperature).unwrap();
        assert_eq!(chain.add(tc1).unwrap(), 0);
        assert_eq!(chain.add(tc2).unwrap(), 1);
        assert_eq!(chain.move_plugin(smoothing_uid, 0).unwrap(), 2);
        let names: Vec<_> = chain.plugins().iter().map(|p| p.name()).collect();
        assert_eq!(names, vec![TemperatureCalculator::NAME, TemperatureCalculator::NAME, Overwrite::NAME]);
    }

    #[test]
    fn calculator_rejected_on_detector_chain() {
        let factory = PluginFactory::default();
        let mut chain = ProcessingChain::new(SignalType::Abs, BusyFlag::default());
        let tc = factory.create(TemperatureCalculator::NAME, SignalType::Temperature).unwrap();
        assert!(chain.add(tc).is_err());
    }
}

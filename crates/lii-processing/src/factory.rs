//! Name-keyed registry of plugin constructors.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use lii_core::TemperatureChannelRegistry;
use lii_signal::SignalType;

use crate::error::{ProcessingError, ProcessingResult};
use crate::plugin::{PluginUid, ProcessingPlugin, SignalProcessor};
use crate::plugins::{self, *};

type Constructor = fn(&TemperatureChannelRegistry) -> Box<dyn SignalProcessor>;

struct PluginDescriptor {
    name: &'static str,
    supported: &'static [SignalType],
    create: Constructor,
}

fn boxed<T: SignalProcessor + Default + 'static>(_: &TemperatureChannelRegistry) -> Box<dyn SignalProcessor> {
    Box::new(T::default())
}

fn temperature_calculator(registry: &TemperatureChannelRegistry) -> Box<dyn SignalProcessor> {
    Box::new(TemperatureCalculator::new(registry))
}

const DESCRIPTORS: &[PluginDescriptor] = &[
    PluginDescriptor { name: Arithmetic::NAME, supported: plugins::ALL_TYPES, create: boxed::<Arithmetic> },
    PluginDescriptor { name: Baseline::NAME, supported: plugins::DETECTOR_TYPES, create: boxed::<Baseline> },
    PluginDescriptor { name: Calibration::NAME, supported: plugins::ABS_ONLY, create: boxed::<Calibration> },
    PluginDescriptor { name: Filter::NAME, supported: plugins::DETECTOR_TYPES, create: boxed::<Filter> },
    PluginDescriptor { name: GetSignalSection::NAME, supported: plugins::ALL_TYPES, create: boxed::<GetSignalSection> },
    PluginDescriptor { name: MovingAverage::NAME, supported: plugins::ALL_TYPES, create: boxed::<MovingAverage> },
    PluginDescriptor {
        name: MultiSignalAverage::NAME,
        supported: plugins::DETECTOR_TYPES,
        create: boxed::<MultiSignalAverage>,
    },
    PluginDescriptor { name: Normalize::NAME, supported: plugins::DETECTOR_TYPES, create: boxed::<Normalize> },
    PluginDescriptor { name: Overwrite::NAME, supported: plugins::ALL_TYPES, create: boxed::<Overwrite> },
    PluginDescriptor {
        name: ResolutionReducer::NAME,
        supported: plugins::ALL_TYPES,
        create: boxed::<ResolutionReducer>,
    },
    PluginDescriptor { name: SavitzkyGolay::NAME, supported: plugins::ALL_TYPES, create: boxed::<SavitzkyGolay> },
    PluginDescriptor {
        name: SignalArithmetic::NAME,
        supported: plugins::ALL_TYPES,
        create: boxed::<SignalArithmetic>,
    },
    PluginDescriptor {
        name: SimpleDataReducer::NAME,
        supported: plugins::ALL_TYPES,
        create: boxed::<SimpleDataReducer>,
    },
    PluginDescriptor {
        name: SimplePeakValidator::NAME,
        supported: plugins::ALL_TYPES,
        create: boxed::<SimplePeakValidator>,
    },
    PluginDescriptor { name: SwapChannels::NAME, supported: plugins::DETECTOR_TYPES, create: boxed::<SwapChannels> },
    PluginDescriptor {
        name: TemperatureCalculator::NAME,
        supported: plugins::TEMPERATURE_ONLY,
        create: temperature_calculator,
    },
    PluginDescriptor { name: Transfer::NAME, supported: plugins::ABS_ONLY, create: boxed::<Transfer> },
    PluginDescriptor { name: XShiftSignals::NAME, supported: plugins::DETECTOR_TYPES, create: boxed::<XShiftSignals> },
];

/// Creates plugins by display name and hands out session-unique UIDs.
///
/// Clones share the UID counter and the temperature channel registry.
#[derive(Clone, Debug, Default)]
pub struct PluginFactory {
    registry: TemperatureChannelRegistry,
    next_uid: Arc<AtomicU64>,
}

impl PluginFactory {
    pub fn new(registry: TemperatureChannelRegistry) -> Self {
        Self {
            registry,
            next_uid: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn registry(&self) -> &TemperatureChannelRegistry {
        &self.registry
    }

    /// Every registered plugin name.
    pub fn names(&self) -> Vec<&'static str> {
        DESCRIPTORS.iter().map(|d| d.name).collect()
    }

    /// Plugin names usable on chains of `signal_type`, sorted.
    pub fn available(&self, signal_type: SignalType) -> Vec<&'static str> {
        let mut names: Vec<_> = DESCRIPTORS
            .iter()
            .filter(|d| d.supported.contains(&signal_type))
            .map(|d| d.name)
            .collect();
        names.sort_unstable();
        names
    }

    pub fn supports(&self, name: &str, signal_type: SignalType) -> bool {
        DESCRIPTORS
            .iter()
            .any(|d| d.name == name && d.supported.contains(&signal_type))
    }

    fn next_uid(&self) -> PluginUid {
        self.next_uid.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn create(&self, name: &str, signal_type: SignalType) -> ProcessingResult<ProcessingPlugin> {
        let descriptor = DESCRIPTORS
            .iter()
            .find(|d| d.name == name && d.supported.contains(&signal_type))
            .ok_or_else(|| ProcessingError::UnknownPlugin {
                name: name.to_string(),
                signal_type,
            })?;
        ProcessingPlugin::new((descriptor.create)(&self.registry), self.next_uid())
    }

    /// Copy `plugin` under a new UID. Temperature calculators keep the source's
    /// channel when `share_channel` is set and get a fresh channel otherwise.
    pub fn duplicate(&self, plugin: &ProcessingPlugin, share_channel: bool) -> ProcessingPlugin {
        let mut copy = plugin.duplicate(self.next_uid());
        if copy.is_temperature_calculator() && !share_channel {
            copy.kernel_mut().adopt_temperature_channel(self.registry.allocate());
        }
        copy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eighteen_plugins_registered() {
        let factory = PluginFactory::default();
        let mut names = factory.names();
        assert_eq!(names.len(), 18);
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 18);
    }

    #[test]
    fn availability_follows_signal_type() {
        let factory = PluginFactory::default();
        assert!(factory.available(SignalType::Temperature).contains(&TemperatureCalculator::NAME));
        assert!(!factory.available(SignalType::Raw).contains(&TemperatureCalculator::NAME));
        assert!(factory.available(SignalType::Abs).contains(&Calibration::NAME));
        assert!(matches!(
            factory.create(Calibration::NAME, SignalType::Raw),
            Err(ProcessingError::UnknownPlugin { .. })
        ));
        assert!(factory.create("Nonexistent", SignalType::Raw).is_err());
    }

    #[test]
    fn uids_are_unique_and_shared_by_clones() {
        let factory = PluginFactory::default();
        let other = factory.clone();
        let a = factory.create(Baseline::NAME, SignalType::Raw).unwrap();
        let b = other.create(Baseline::NAME, SignalType::Raw).unwrap();
        assert_ne!(a.uid(), b.uid());
        let c = factory.duplicate(&a, false);
        assert_ne!(c.uid(), a.uid());
        assert_eq!(c.inputs(), a.inputs());
    }

    #[test]
    fn duplicated_calculator_channel_follows_sharing_flag() {
        let factory = PluginFactory::default();
        let tc = factory.create(TemperatureCalculator::NAME, SignalType::Temperature).unwrap();
        let shared = factory.duplicate(&tc, true);
        let separate = factory.duplicate(&tc, false);
        assert_eq!(shared.temperature_channel(), tc.temperature_channel());
        assert_ne!(separate.temperature_channel(), tc.temperature_channel());
    }
}

use std::any::Any;

use lii_core::{ChannelIdLease, TemperatureChannelRegistry};
use lii_materials::{Material, catalog};
use lii_signal::{RunDataSource, Signal, SignalType};
use lii_temperature::{FitConfig, FitError, calc_spectrum_fit, calc_two_color};

use super::{missing_channel, positive_channel};
use crate::error::{ProcessingError, ProcessingResult};
use crate::input::{ChannelSelection, InputList, PluginInput};
use crate::plugin::{ProcessContext, SignalProcessor};

/// How the temperature trace is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemperatureMethod {
    TwoColor,
    Spectrum,
    /// Constant temperature, for checking downstream steps.
    Test,
    /// Copy of another temperature channel.
    Copy,
}

impl TemperatureMethod {
    pub const NAMES: [&'static str; 4] = ["Two-Color", "Spectrum", "Test", "Copy"];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TwoColor => Self::NAMES[0],
            Self::Spectrum => Self::NAMES[1],
            Self::Test => Self::NAMES[2],
            Self::Copy => Self::NAMES[3],
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Two-Color" => Some(Self::TwoColor),
            "Spectrum" => Some(Self::Spectrum),
            "Test" => Some(Self::Test),
            "Copy" => Some(Self::Copy),
            _ => None,
        }
    }

    /// Parameter group shown for this method.
    fn group(&self) -> u32 {
        match self {
            Self::TwoColor => 1,
            Self::Spectrum => 2,
            Self::Test => 3,
            Self::Copy => 4,
        }
    }
}

/// Derives a temperature channel from processed RAW or ABS signals.
///
/// Owns one lease on its temperature channel ID. Linked calculators in other
/// runs hold leases on the same ID. All other temperature channels of the
/// stage pass through.
#[derive(Debug, Clone)]
pub struct TemperatureCalculator {
    channel: ChannelIdLease,
    method: TemperatureMethod,
    source: SignalType,
    material: Material,
    two_color: (u32, u32),
    spectrum_channels: ChannelSelection,
    fit: FitConfig,
    test_temperature: f64,
    copy_channel: u32,
}

impl TemperatureCalculator {
    pub const NAME: &'static str = "Temperature Calculator";

    pub fn new(registry: &TemperatureChannelRegistry) -> Self {
        Self {
            channel: registry.allocate(),
            method: TemperatureMethod::TwoColor,
            source: SignalType::Abs,
            material: catalog::soot(),
            two_color: (1, 2),
            spectrum_channels: ChannelSelection::default(),
            fit: FitConfig::default(),
            test_temperature: 1500.0,
            copy_channel: 1,
        }
    }

    pub fn method(&self) -> TemperatureMethod {
        self.method
    }

    fn calculation_error(&self, error: FitError) -> ProcessingError {
        ProcessingError::Calculation {
            what: format!("{} (temperature channel {}): {error}", self.method.as_str(), self.channel.id()),
        }
    }

    fn source<'a>(&self, ctx: &ProcessContext<'a>, channel: u32) -> ProcessingResult<&'a Signal> {
        ctx.source_signal(self.source, channel).ok_or_else(|| missing_channel(channel))
    }

    fn wavelength_nm(ctx: &ProcessContext<'_>, channel: u32) -> ProcessingResult<f64> {
        ctx.settings()
            .channel(channel)
            .map(|c| c.wavelength_nm)
            .ok_or(ProcessingError::InvalidChannel {
                what: "channel missing from instrument settings",
                channel,
            })
    }

    fn two_color(&self, ctx: &ProcessContext<'_>) -> ProcessingResult<Option<Signal>> {
        let (c1, c2) = self.two_color;
        let s1 = self.source(ctx, c1)?;
        let s2 = self.source(ctx, c2)?;
        if s1.is_empty() || s2.is_empty() {
            return Ok(None);
        }
        let trace = calc_two_color(
            s1,
            s2,
            Self::wavelength_nm(ctx, c1)?,
            Self::wavelength_nm(ctx, c2)?,
            &self.material,
        )
        .map_err(|e| self.calculation_error(e))?;
        Ok(Some(trace.temperature))
    }

    fn spectrum(&self, ctx: &ProcessContext<'_>) -> ProcessingResult<Option<Signal>> {
        let all = ctx.run.channel_ids(self.source);
        let selected: Vec<u32> = all
            .iter()
            .enumerate()
            .filter(|(pos, _)| self.spectrum_channels.contains(*pos))
            .map(|(_, id)| *id)
            .collect();
        let mut signals = Vec::with_capacity(selected.len());
        let mut wavelengths = Vec::with_capacity(selected.len());
        let mut bandwidths = Vec::with_capacity(selected.len());
        for id in &selected {
            let signal = self.source(ctx, *id)?;
            if signal.is_empty() {
                return Ok(None);
            }
            signals.push(signal);
            wavelengths.push(Self::wavelength_nm(ctx, *id)?);
            bandwidths.push(ctx.settings().channel(*id).map_or(0.0, |c| c.bandwidth_nm));
        }
        let trace = calc_spectrum_fit(&signals, &wavelengths, &bandwidths, &self.material, &self.fit)
            .map_err(|e| self.calculation_error(e))?;
        let mut temperature = trace.temperature;
        temperature.fit_active_channels = (0..all.len()).map(|pos| self.spectrum_channels.contains(pos)).collect();
        Ok(Some(temperature))
    }

    fn test(&self, ctx: &ProcessContext<'_>, input: &Signal) -> Signal {
        let template = ctx
            .run
            .channel_ids(self.source)
            .first()
            .and_then(|id| ctx.source_signal(self.source, *id))
            .filter(|s| !s.is_empty())
            .unwrap_or(input);
        Signal {
            data: vec![self.test_temperature; template.len()],
            ..Signal::with_data(SignalType::Temperature, self.channel.id(), template.start_time, template.dt, Vec::new())
        }
    }
}

impl SignalProcessor for TemperatureCalculator {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_inputs(&self) -> InputList {
        InputList::new()
            .with(PluginInput::combobox("method", "Method", &TemperatureMethod::NAMES))
            .with(PluginInput::combobox(
                "source",
                "Source signal",
                &[SignalType::Abs.as_str(), SignalType::Raw.as_str()],
            ))
            .with(PluginInput::combobox("material", "Material", &catalog::MATERIAL_NAMES))
            .with(PluginInput::integer("channel_1", "Channel 1", 1).with_range(1.0, 64.0).in_group(1))
            .with(PluginInput::integer("channel_2", "Channel 2", 2).with_range(1.0, 64.0).in_group(1))
            .with(PluginInput::checkbox_group("spectrum_channels", "Channels").in_group(2))
            .with(PluginInput::integer("iterations", "Max. iterations", 50).with_range(1.0, 10000.0).in_group(2))
            .with(PluginInput::double("start_temperature", "Start temperature [K]", 2000.0).in_group(2))
            .with(PluginInput::checkbox("auto_scaling", "Automatic start C", true).in_group(2))
            .with(PluginInput::checkbox("bandpass", "Bandpass integration", false).in_group(2))
            .with(PluginInput::checkbox("weighting", "Weight by stdev", false).in_group(2))
            .with(PluginInput::double("test_temperature", "Temperature [K]", 1500.0).in_group(3))
            .with(PluginInput::integer("copy_channel", "Temperature channel", 1).in_group(4))
    }

    fn set_from_inputs(&mut self, inputs: &mut InputList) -> ProcessingResult<()> {
        let method_name = inputs.text("method")?;
        let method = TemperatureMethod::parse(&method_name)
            .ok_or_else(|| ProcessingError::invalid_parameter("method", format!("unknown method '{method_name}'")))?;
        let source_name = inputs.text("source")?;
        let source = match SignalType::parse(&source_name) {
            Some(t @ (SignalType::Raw | SignalType::Abs)) => t,
            _ => return Err(ProcessingError::invalid_parameter("source", format!("'{source_name}' is not a detector signal"))),
        };
        let material_name = inputs.text("material")?;
        let material = catalog::material_by_name(&material_name)
            .ok_or_else(|| ProcessingError::invalid_parameter("material", format!("unknown material '{material_name}'")))?;
        let two_color = (
            positive_channel("channel_1", inputs.i64("channel_1")?)?,
            positive_channel("channel_2", inputs.i64("channel_2")?)?,
        );
        if method == TemperatureMethod::TwoColor && two_color.0 == two_color.1 {
            return Err(ProcessingError::invalid_parameter("channel_2", "two-color needs two different channels"));
        }
        let iterations = inputs.i64("iterations")?;
        if iterations < 1 {
            return Err(ProcessingError::invalid_parameter("iterations", "must be at least 1"));
        }
        let start_temperature = inputs.f64("start_temperature")?;
        if !(start_temperature.is_finite() && start_temperature > 0.0) {
            return Err(ProcessingError::invalid_parameter("start_temperature", "must be positive"));
        }
        let test_temperature = inputs.f64("test_temperature")?;
        let copy_channel = positive_channel("copy_channel", inputs.i64("copy_channel")?)?;
        let fit = FitConfig {
            max_iterations: iterations as usize,
            start_temperature,
            auto_start_scaling: inputs.bool("auto_scaling")?,
            use_bandpass: inputs.bool("bandpass")?,
            weight_by_stdev: inputs.bool("weighting")?,
            ..FitConfig::default()
        };

        self.spectrum_channels = inputs.channel_flags("spectrum_channels")?;
        inputs.show_group(method.group());
        self.method = method;
        self.source = source;
        self.material = material;
        self.two_color = two_color;
        self.fit = fit;
        self.test_temperature = test_temperature;
        self.copy_channel = copy_channel;
        Ok(())
    }

    fn process(&self, ctx: &ProcessContext<'_>, input: &Signal, output: &mut Signal) -> ProcessingResult<bool> {
        if input.channel_id != self.channel.id() {
            return Ok(ctx.input_valid(ctx.mp_index));
        }
        let result = match self.method {
            TemperatureMethod::TwoColor => self.two_color(ctx)?,
            TemperatureMethod::Spectrum => self.spectrum(ctx)?,
            TemperatureMethod::Test => Some(self.test(ctx, input)),
            TemperatureMethod::Copy => ctx.input(self.copy_channel).cloned(),
        };
        match result {
            Some(signal) if !signal.is_empty() => {
                *output = signal;
                Ok(true)
            }
            _ => {
                output.clear();
                Ok(false)
            }
        }
    }

    fn is_temperature_calculator(&self) -> bool {
        true
    }

    fn temperature_channel(&self) -> Option<u32> {
        Some(self.channel.id())
    }

    fn adopt_temperature_channel(&mut self, lease: ChannelIdLease) {
        self.channel = lease;
    }

    fn source_type(&self) -> Option<SignalType> {
        Some(self.source)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn clone_box(&self) -> Box<dyn SignalProcessor> {
        Box::new(self.clone())
    }
}

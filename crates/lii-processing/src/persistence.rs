//! Flat key/value persistence of processing chains.
//!
//! ```toml
//! [proc_step_0]
//! pName = "Baseline"
//! pActivated = "true"
//! pLinkState = "-1"
//! pLinkType = "-1"
//! pVisible = "false"
//! sbFlag = "false"
//! start-0 = "0"
//! end-0 = "0.00000001"
//! ```
//!
//! Parameters are stored as `<identifier>-<type code>` with their raw string
//! value. Comboboxes store only the selected option.

use lii_signal::SignalType;
use toml::{Table, Value};
use tracing::debug;

use crate::chain::ProcessingChain;
use crate::error::{ProcessingError, ProcessingResult};
use crate::factory::PluginFactory;
use crate::plugin::{LinkState, ProcessingPlugin};

const STEP_PREFIX: &str = "proc_step_";
const NAME: &str = "pName";
const ACTIVATED: &str = "pActivated";
const LINK_STATE: &str = "pLinkState";
const LINK_ID: &str = "pLinkType";
const VISIBLE: &str = "pVisible";
const STEP_BUFFER: &str = "sbFlag";

fn parameter_key(identifier: &str, type_code: u8) -> String {
    format!("{identifier}-{type_code}")
}

fn step_table(plugin: &ProcessingPlugin) -> Table {
    let mut table = Table::new();
    let mut put = |key: String, value: String| {
        table.insert(key, Value::String(value));
    };
    put(NAME.into(), plugin.name().to_string());
    put(ACTIVATED.into(), plugin.activated().to_string());
    put(LINK_STATE.into(), plugin.link_state().code().to_string());
    put(LINK_ID.into(), plugin.link_id().map_or("-1".to_string(), |id| id.to_string()));
    put(VISIBLE.into(), plugin.plot_visible().to_string());
    put(STEP_BUFFER.into(), plugin.step_buffer_enabled().to_string());
    for input in plugin.inputs().iter() {
        put(parameter_key(&input.identifier, input.input_type.code()), input.raw_string());
    }
    table
}

/// Serialize a chain to TOML text.
pub fn save_chain(chain: &ProcessingChain) -> ProcessingResult<String> {
    let mut root = Table::new();
    for (i, plugin) in chain.plugins().iter().enumerate() {
        root.insert(format!("{STEP_PREFIX}{i}"), Value::Table(step_table(plugin)));
    }
    Ok(toml::to_string(&root)?)
}

fn text<'a>(table: &'a Table, step: usize, key: &str) -> ProcessingResult<&'a str> {
    table
        .get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| ProcessingError::Persistence {
            what: format!("step {step} lacks '{key}'"),
        })
}

fn flag(table: &Table, step: usize, key: &str) -> ProcessingResult<bool> {
    match text(table, step, key)?.trim() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        other => Err(ProcessingError::Persistence {
            what: format!("step {step}: '{key}' = '{other}' is not a boolean"),
        }),
    }
}

fn integer(table: &Table, step: usize, key: &str) -> ProcessingResult<i64> {
    let raw = text(table, step, key)?;
    raw.trim().parse().map_err(|_| ProcessingError::Persistence {
        what: format!("step {step}: '{key}' = '{raw}' is not an integer"),
    })
}

fn build_plugin(
    factory: &PluginFactory,
    signal_type: SignalType,
    step: usize,
    table: &Table,
) -> ProcessingResult<ProcessingPlugin> {
    let mut plugin = factory.create(text(table, step, NAME)?, signal_type)?;

    let mut inputs = plugin.inputs().clone();
    let identifiers: Vec<(String, u8)> = inputs
        .iter()
        .map(|i| (i.identifier.clone(), i.input_type.code()))
        .collect();
    for (identifier, code) in identifiers {
        let key = parameter_key(&identifier, code);
        match table.get(&key).and_then(Value::as_str) {
            Some(raw) => {
                if let Some(input) = inputs.input_mut(&identifier) {
                    input.set_from_raw(raw)?;
                }
            }
            None => debug!(step, key, "parameter not stored, keeping default"),
        }
    }
    plugin.set_parameters(&inputs)?;

    let link_state = LinkState::from_code(integer(table, step, LINK_STATE)?).ok_or_else(|| {
        ProcessingError::Persistence {
            what: format!("step {step}: unknown link state"),
        }
    })?;
    let link_id = u64::try_from(integer(table, step, LINK_ID)?).ok();
    plugin.set_link(link_state, link_id);
    plugin.set_activated_flag(flag(table, step, ACTIVATED)?);
    plugin.set_plot_visible(flag(table, step, VISIBLE)?);
    plugin.set_step_buffer_enabled(flag(table, step, STEP_BUFFER)?);
    Ok(plugin)
}

/// Parse chain TOML into plugins for a chain of `signal_type`, in step order.
///
/// Every named plugin must be available for `signal_type`.
pub fn load_chain(text: &str, factory: &PluginFactory, signal_type: SignalType) -> ProcessingResult<Vec<ProcessingPlugin>> {
    let root: Table = toml::from_str(text)?;
    let mut steps: Vec<(usize, &Table)> = Vec::with_capacity(root.len());
    for (key, value) in &root {
        let Some(index) = key.strip_prefix(STEP_PREFIX).and_then(|n| n.parse::<usize>().ok()) else {
            debug!(key, "ignoring non-step group");
            continue;
        };
        let table = value.as_table().ok_or_else(|| ProcessingError::Persistence {
            what: format!("'{key}' is not a group"),
        })?;
        steps.push((index, table));
    }
    steps.sort_by_key(|(index, _)| *index);
    let plugins = steps
        .into_iter()
        .map(|(index, table)| build_plugin(factory, signal_type, index, table))
        .collect::<ProcessingResult<Vec<_>>>()?;
    debug!(chain = %signal_type, steps = plugins.len(), "chain configuration loaded");
    Ok(plugins)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::BusyFlag;
    use crate::input::InputValue;
    use crate::plugins::{Baseline, Calibration, MovingAverage, Normalize};

    #[test]
    fn unknown_plugin_fails_loudly() {
        let factory = PluginFactory::default();
        let text = "[proc_step_0]\npName = \"Calibration\"\npActivated = \"true\"\npLinkState = \"-1\"\npLinkType = \"-1\"\npVisible = \"false\"\nsbFlag = \"false\"\n";
        assert!(load_chain(text, &factory, SignalType::Abs).is_ok());
        assert!(matches!(
            load_chain(text, &factory, SignalType::Raw),
            Err(ProcessingError::UnknownPlugin { .. })
        ));
    }

    #[test]
    fn steps_sorted_numerically() {
        let factory = PluginFactory::default();
        let mut chain = ProcessingChain::new(SignalType::Abs, BusyFlag::default());
        for i in 0..12 {
            let name = if i == 11 { Calibration::NAME } else { Baseline::NAME };
            chain.add(factory.create(name, SignalType::Abs).unwrap()).unwrap();
        }
        let loaded = load_chain(&save_chain(&chain).unwrap(), &factory, SignalType::Abs).unwrap();
        assert_eq!(loaded.len(), 12);
        assert_eq!(loaded[11].name(), Calibration::NAME);
    }

    #[test]
    fn combobox_persists_selection_only() {
        let factory = PluginFactory::default();
        let mut chain = ProcessingChain::new(SignalType::Raw, BusyFlag::default());
        let mut plugin = factory.create(Normalize::NAME, SignalType::Raw).unwrap();
        let mut inputs = plugin.inputs().clone();
        inputs.set_value("mode", InputValue::Text("Value at time".into())).unwrap();
        plugin.set_parameters(&inputs).unwrap();
        chain.add(plugin).unwrap();
        chain.add(factory.create(MovingAverage::NAME, SignalType::Raw).unwrap()).unwrap();
        let text = save_chain(&chain).unwrap();
        assert!(text.contains("\"Value at time\""));
        assert!(!text.contains("Peak"));
        let loaded = load_chain(&text, &factory, SignalType::Raw).unwrap();
        assert_eq!(loaded[0].inputs().text("mode").unwrap(), "Value at time");
        assert_eq!(loaded[0].inputs().input("mode").unwrap().options(), vec!["Peak", "Value at time"]);
    }
}

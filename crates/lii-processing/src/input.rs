//! Typed, named plugin parameters.
//!
//! Combobox values use the encoding `selected;option1;option2;…`: the first
//! token is the selection, the remaining tokens are the full option list in
//! their original order.

use std::fmt;

use crate::error::{ProcessingError, ProcessingResult};

/// Widget kind of a parameter; the discriminant is the persisted type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputType {
    Double = 0,
    Integer = 1,
    Checkbox = 2,
    Combobox = 3,
    NoGui = 4,
    CheckboxGroup = 5,
}

impl InputType {
    pub fn code(&self) -> u8 {
        *self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Double),
            1 => Some(Self::Integer),
            2 => Some(Self::Checkbox),
            3 => Some(Self::Combobox),
            4 => Some(Self::NoGui),
            5 => Some(Self::CheckboxGroup),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InputValue {
    Double(f64),
    Integer(i64),
    Bool(bool),
    Text(String),
}

impl fmt::Display for InputValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Double(v) => write!(f, "{v}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// One parameter descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct PluginInput {
    pub identifier: String,
    pub label: String,
    pub input_type: InputType,
    pub value: InputValue,
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// 0 = always visible; other groups are mutually exclusive panels
    pub group_id: u32,
    pub enabled: bool,
    pub visible: bool,
}

impl PluginInput {
    fn new(identifier: &str, label: &str, input_type: InputType, value: InputValue) -> Self {
        Self {
            identifier: identifier.to_string(),
            label: label.to_string(),
            input_type,
            value,
            min: None,
            max: None,
            group_id: 0,
            enabled: true,
            visible: true,
        }
    }

    pub fn double(identifier: &str, label: &str, value: f64) -> Self {
        Self::new(identifier, label, InputType::Double, InputValue::Double(value))
    }

    pub fn integer(identifier: &str, label: &str, value: i64) -> Self {
        Self::new(identifier, label, InputType::Integer, InputValue::Integer(value))
    }

    pub fn checkbox(identifier: &str, label: &str, value: bool) -> Self {
        Self::new(identifier, label, InputType::Checkbox, InputValue::Bool(value))
    }

    /// Combobox with `options[0]` selected.
    pub fn combobox(identifier: &str, label: &str, options: &[&str]) -> Self {
        let selected = options.first().copied().unwrap_or_default();
        let encoded = std::iter::once(selected)
            .chain(options.iter().copied())
            .collect::<Vec<_>>()
            .join(";");
        Self::new(identifier, label, InputType::Combobox, InputValue::Text(encoded))
    }

    /// Per-channel checkboxes stored as `1,0,1`; an empty value selects all.
    pub fn checkbox_group(identifier: &str, label: &str) -> Self {
        Self::new(
            identifier,
            label,
            InputType::CheckboxGroup,
            InputValue::Text(String::new()),
        )
    }

    pub fn with_range(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    pub fn in_group(mut self, group_id: u32) -> Self {
        self.group_id = group_id;
        self
    }

    /// The value as read by plugins; comboboxes yield only the selection.
    pub fn get(&self) -> InputValue {
        match (&self.input_type, &self.value) {
            (InputType::Combobox, InputValue::Text(encoded)) => {
                InputValue::Text(combobox_selection(encoded).to_string())
            }
            (_, value) => value.clone(),
        }
    }

    /// Combobox option list (without the selection prefix).
    pub fn options(&self) -> Vec<String> {
        match (&self.input_type, &self.value) {
            (InputType::Combobox, InputValue::Text(encoded)) => {
                encoded.split(';').skip(1).map(str::to_string).collect()
            }
            _ => Vec::new(),
        }
    }

    /// Persisted string form. Comboboxes persist only their selection.
    pub fn raw_string(&self) -> String {
        self.get().to_string()
    }

    fn check_kind(&self, value: &InputValue) -> ProcessingResult<()> {
        let ok = matches!(
            (self.input_type, value),
            (InputType::Double, InputValue::Double(_))
                | (InputType::Integer, InputValue::Integer(_))
                | (InputType::Checkbox, InputValue::Bool(_))
                | (InputType::Combobox, InputValue::Text(_))
                | (InputType::CheckboxGroup, InputValue::Text(_))
                | (InputType::NoGui, _)
        );
        if ok {
            Ok(())
        } else {
            Err(ProcessingError::invalid_parameter(
                &self.identifier,
                format!("{value:?} does not fit a {:?} input", self.input_type),
            ))
        }
    }

    /// Replace the value. Comboboxes keep their option list and take the
    /// first token of `value` as the new selection.
    pub fn set(&mut self, value: InputValue) -> ProcessingResult<()> {
        self.check_kind(&value)?;
        self.value = match (self.input_type, value) {
            (InputType::Combobox, InputValue::Text(text)) => {
                let selected = combobox_selection(&text).to_string();
                let options = self.options();
                InputValue::Text(
                    std::iter::once(selected)
                        .chain(options)
                        .collect::<Vec<_>>()
                        .join(";"),
                )
            }
            (_, value) => value,
        };
        Ok(())
    }

    /// Parse a persisted string according to the input type.
    pub fn set_from_raw(&mut self, raw: &str) -> ProcessingResult<()> {
        let parse_err = |what: &str| ProcessingError::invalid_parameter(&self.identifier, what.to_string());
        let value = match self.input_type {
            InputType::Double => InputValue::Double(raw.trim().parse().map_err(|_| parse_err("not a number"))?),
            InputType::Integer => InputValue::Integer(raw.trim().parse().map_err(|_| parse_err("not an integer"))?),
            InputType::Checkbox => InputValue::Bool(parse_bool(raw).ok_or_else(|| parse_err("not a boolean"))?),
            InputType::Combobox | InputType::CheckboxGroup => InputValue::Text(raw.to_string()),
            InputType::NoGui => match &self.value {
                InputValue::Double(_) => InputValue::Double(raw.trim().parse().map_err(|_| parse_err("not a number"))?),
                InputValue::Integer(_) => {
                    InputValue::Integer(raw.trim().parse().map_err(|_| parse_err("not an integer"))?)
                }
                InputValue::Bool(_) => InputValue::Bool(parse_bool(raw).ok_or_else(|| parse_err("not a boolean"))?),
                InputValue::Text(_) => InputValue::Text(raw.to_string()),
            },
        };
        self.set(value)
    }
}

fn combobox_selection(encoded: &str) -> &str {
    encoded.split(';').next().unwrap_or_default()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// Ordered parameter list keyed by identifier.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InputList {
    items: Vec<PluginInput>,
}

impl InputList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, input: PluginInput) -> Self {
        self.push(input);
        self
    }

    /// Append an input; an existing input with the same identifier is replaced.
    pub fn push(&mut self, input: PluginInput) {
        match self.items.iter_mut().find(|i| i.identifier == input.identifier) {
            Some(existing) => *existing = input,
            None => self.items.push(input),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PluginInput> {
        self.items.iter()
    }

    pub fn input(&self, identifier: &str) -> Option<&PluginInput> {
        self.items.iter().find(|i| i.identifier == identifier)
    }

    pub fn input_mut(&mut self, identifier: &str) -> Option<&mut PluginInput> {
        self.items.iter_mut().find(|i| i.identifier == identifier)
    }

    fn require(&self, identifier: &str) -> ProcessingResult<&PluginInput> {
        self.input(identifier)
            .ok_or_else(|| ProcessingError::invalid_parameter(identifier, "unknown parameter"))
    }

    /// Value of `identifier`; comboboxes yield the selected token.
    pub fn get_value(&self, identifier: &str) -> Option<InputValue> {
        self.input(identifier).map(PluginInput::get)
    }

    pub fn set_value(&mut self, identifier: &str, value: InputValue) -> ProcessingResult<()> {
        self.input_mut(identifier)
            .ok_or_else(|| ProcessingError::invalid_parameter(identifier, "unknown parameter"))?
            .set(value)
    }

    pub fn set_enabled(&mut self, identifier: &str, enabled: bool) {
        if let Some(input) = self.input_mut(identifier) {
            input.enabled = enabled;
        }
    }

    /// Show group `group_id` and hide every other nonzero group.
    pub fn show_group(&mut self, group_id: u32) {
        for input in self.items.iter_mut().filter(|i| i.group_id != 0) {
            input.visible = input.group_id == group_id;
        }
    }

    pub fn f64(&self, identifier: &str) -> ProcessingResult<f64> {
        match self.require(identifier)?.get() {
            InputValue::Double(v) => Ok(v),
            InputValue::Integer(v) => Ok(v as f64),
            _ => Err(ProcessingError::invalid_parameter(identifier, "expected a number")),
        }
    }

    pub fn i64(&self, identifier: &str) -> ProcessingResult<i64> {
        match self.require(identifier)?.get() {
            InputValue::Integer(v) => Ok(v),
            _ => Err(ProcessingError::invalid_parameter(identifier, "expected an integer")),
        }
    }

    pub fn bool(&self, identifier: &str) -> ProcessingResult<bool> {
        match self.require(identifier)?.get() {
            InputValue::Bool(v) => Ok(v),
            _ => Err(ProcessingError::invalid_parameter(identifier, "expected a checkbox")),
        }
    }

    pub fn text(&self, identifier: &str) -> ProcessingResult<String> {
        match self.require(identifier)?.get() {
            InputValue::Text(v) => Ok(v),
            _ => Err(ProcessingError::invalid_parameter(identifier, "expected text")),
        }
    }

    /// Checkbox-group flags by channel position; positions past the stored
    /// flags are selected.
    pub fn channel_flags(&self, identifier: &str) -> ProcessingResult<ChannelSelection> {
        let text = self.text(identifier)?;
        let flags = text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| parse_bool(s).ok_or_else(|| ProcessingError::invalid_parameter(identifier, "expected 0/1 flags")))
            .collect::<ProcessingResult<Vec<_>>>()?;
        Ok(ChannelSelection { flags })
    }

    /// Check that `other` has the same identifiers and types in the same order.
    pub fn check_schema(&self, other: &InputList) -> ProcessingResult<()> {
        if self.items.len() != other.items.len() {
            return Err(ProcessingError::SchemaMismatch {
                what: format!("expected {} parameters, got {}", self.items.len(), other.items.len()),
            });
        }
        for (mine, theirs) in self.items.iter().zip(&other.items) {
            if mine.identifier != theirs.identifier || mine.input_type != theirs.input_type {
                return Err(ProcessingError::SchemaMismatch {
                    what: format!(
                        "'{}' ({:?}) does not match '{}' ({:?})",
                        theirs.identifier, theirs.input_type, mine.identifier, mine.input_type
                    ),
                });
            }
        }
        Ok(())
    }
}

/// Channel selection of a checkbox group.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChannelSelection {
    flags: Vec<bool>,
}

impl ChannelSelection {
    /// Whether the channel at zero-based `position` is selected.
    pub fn contains(&self, position: usize) -> bool {
        self.flags.get(position).copied().unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list() -> InputList {
        InputList::new()
            .with(PluginInput::double("start", "Start", 0.0))
            .with(PluginInput::combobox("mode", "Mode", &["A", "B", "C"]))
            .with(PluginInput::integer("a", "A", 1).in_group(1))
            .with(PluginInput::integer("b", "B", 2).in_group(2))
    }

    #[test]
    fn combobox_returns_selected_token() {
        let mut inputs = list();
        assert_eq!(inputs.get_value("mode"), Some(InputValue::Text("A".into())));
        inputs.set_value("mode", InputValue::Text("B;A;B;C".into())).unwrap();
        assert_eq!(inputs.text("mode").unwrap(), "B");
        assert_eq!(inputs.input("mode").unwrap().options(), vec!["A", "B", "C"]);
        assert_eq!(inputs.input("mode").unwrap().raw_string(), "B");
    }

    #[test]
    fn show_group_toggles_only_nonzero_groups() {
        let mut inputs = list();
        inputs.show_group(2);
        assert!(inputs.input("start").unwrap().visible);
        assert!(!inputs.input("a").unwrap().visible);
        assert!(inputs.input("b").unwrap().visible);
    }

    #[test]
    fn schema_check_detects_type_change() {
        let mine = list();
        let mut other = list();
        other.push(PluginInput::checkbox("start", "Start", true));
        assert!(matches!(mine.check_schema(&other), Err(ProcessingError::SchemaMismatch { .. })));
        assert!(mine.check_schema(&list()).is_ok());
    }

    #[test]
    fn raw_strings_parse_back() {
        let mut inputs = list();
        let input = inputs.input_mut("start").unwrap();
        input.set_from_raw("1.5e-8").unwrap();
        assert_eq!(input.raw_string(), "0.000000015");
        assert!(input.set_from_raw("abc").is_err());
        assert!(inputs.set_value("start", InputValue::Bool(true)).is_err());
    }

    #[test]
    fn checkbox_group_defaults_to_all() {
        let mut inputs = InputList::new().with(PluginInput::checkbox_group("channels", "Channels"));
        assert!(inputs.channel_flags("channels").unwrap().contains(3));
        inputs.set_value("channels", InputValue::Text("1,0".into())).unwrap();
        let sel = inputs.channel_flags("channels").unwrap();
        assert!(sel.contains(0) && !sel.contains(1) && sel.contains(2));
    }
}

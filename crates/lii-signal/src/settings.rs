//! LII instrument description, persisted as YAML.
//!
//! ```yaml
//! name: two-color PMT
//! channels:
//!   - wavelength_nm: 650.0
//!     bandwidth_nm: 10.0
//!     calibration: 1.0
//! filters:
//!   - name: ND1
//!     transmission: [10.0]
//! ```

use std::path::Path;

use lii_core::nm_to_m;
use serde::{Deserialize, Serialize};

use crate::error::{SignalError, SignalResult};

/// Optical properties of one detector channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelSettings {
    /// Center wavelength [nm]
    pub wavelength_nm: f64,
    /// Full bandpass width [nm]
    #[serde(default)]
    pub bandwidth_nm: f64,
    /// Multiplicative factor converting raw counts into absolute intensity
    #[serde(default = "default_calibration")]
    pub calibration: f64,
}

fn default_calibration() -> f64 {
    1.0
}

/// Neutral density / bandpass filter in front of the detectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    pub name: String,
    /// Transmission per channel [%]
    pub transmission: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiiSettings {
    pub name: String,
    #[serde(default)]
    pub channels: Vec<ChannelSettings>,
    #[serde(default)]
    pub filters: Vec<FilterSettings>,
}

impl Default for LiiSettings {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            channels: Vec::new(),
            filters: Vec::new(),
        }
    }
}

impl LiiSettings {
    /// Settings with one channel per wavelength, unit calibration and no bandpass.
    pub fn from_wavelengths(name: &str, wavelengths_nm: &[f64]) -> Self {
        Self {
            name: name.to_string(),
            channels: wavelengths_nm
                .iter()
                .map(|w| ChannelSettings {
                    wavelength_nm: *w,
                    bandwidth_nm: 0.0,
                    calibration: 1.0,
                })
                .collect(),
            filters: Vec::new(),
        }
    }

    pub fn from_yaml_str(content: &str) -> SignalResult<Self> {
        let settings: Self = serde_yaml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load_yaml(path: &Path) -> SignalResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn save_yaml(&self, path: &Path) -> SignalResult<()> {
        self.validate()?;
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn validate(&self) -> SignalResult<()> {
        for (i, ch) in self.channels.iter().enumerate() {
            if !ch.wavelength_nm.is_finite() || ch.wavelength_nm <= 0.0 {
                return Err(SignalError::InvalidSettings {
                    what: format!("channel {} wavelength must be positive", i + 1),
                });
            }
            if !ch.bandwidth_nm.is_finite() || ch.bandwidth_nm < 0.0 {
                return Err(SignalError::InvalidSettings {
                    what: format!("channel {} bandwidth must be non-negative", i + 1),
                });
            }
            if !ch.calibration.is_finite() || ch.calibration == 0.0 {
                return Err(SignalError::InvalidSettings {
                    what: format!("channel {} calibration must be finite and non-zero", i + 1),
                });
            }
        }
        for filter in &self.filters {
            if filter.transmission.len() != self.channels.len() {
                return Err(SignalError::InvalidSettings {
                    what: format!(
                        "filter '{}' has {} transmission values for {} channels",
                        filter.name,
                        filter.transmission.len(),
                        self.channels.len()
                    ),
                });
            }
            if filter.transmission.iter().any(|t| !t.is_finite() || *t <= 0.0) {
                return Err(SignalError::InvalidSettings {
                    what: format!("filter '{}' transmission must be positive", filter.name),
                });
            }
        }
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn channel(&self, channel_id: u32) -> Option<&ChannelSettings> {
        (channel_id as usize)
            .checked_sub(1)
            .and_then(|i| self.channels.get(i))
    }

    /// Center wavelength of a channel [m].
    pub fn wavelength_m(&self, channel_id: u32) -> Option<f64> {
        self.channel(channel_id).map(|c| nm_to_m(c.wavelength_nm))
    }

    /// Bandpass width of a channel [m].
    pub fn bandwidth_m(&self, channel_id: u32) -> Option<f64> {
        self.channel(channel_id).map(|c| nm_to_m(c.bandwidth_nm))
    }

    pub fn calibration(&self, channel_id: u32) -> Option<f64> {
        self.channel(channel_id).map(|c| c.calibration)
    }

    pub fn filter(&self, name: &str) -> Option<&FilterSettings> {
        self.filters.iter().find(|f| f.name == name)
    }

    /// Filter transmission of a channel as a fraction (0..=1 for physical filters).
    pub fn transmission(&self, filter: &str, channel_id: u32) -> Option<f64> {
        let idx = (channel_id as usize).checked_sub(1)?;
        self.filter(filter)?
            .transmission
            .get(idx)
            .map(|percent| percent / 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
name: test rig
channels:
  - wavelength_nm: 650.0
    bandwidth_nm: 10.0
  - wavelength_nm: 780.0
    calibration: 2.5
filters:
  - name: ND1
    transmission: [10.0, 20.0]
"#;

    #[test]
    fn parse_yaml_with_defaults() {
        let settings = LiiSettings::from_yaml_str(YAML).unwrap();
        assert_eq!(settings.channel_count(), 2);
        assert_eq!(settings.calibration(1), Some(1.0));
        assert_eq!(settings.calibration(2), Some(2.5));
        assert_eq!(settings.bandwidth_m(2), Some(0.0));
        let w = settings.wavelength_m(1).unwrap();
        assert!((w - 650e-9).abs() < 1e-18);
        assert_eq!(settings.transmission("ND1", 2), Some(0.2));
        assert_eq!(settings.transmission("ND2", 1), None);
    }

    #[test]
    fn filter_length_mismatch_is_rejected() {
        let yaml = "name: bad\nchannels:\n  - wavelength_nm: 650.0\nfilters:\n  - name: F\n    transmission: [1.0, 2.0]\n";
        let err = LiiSettings::from_yaml_str(yaml).unwrap_err();
        assert!(err.to_string().contains("transmission"));
    }

    #[test]
    fn negative_wavelength_is_rejected() {
        let mut settings = LiiSettings::from_wavelengths("x", &[650.0]);
        settings.channels[0].wavelength_nm = -1.0;
        assert!(settings.validate().is_err());
    }
}

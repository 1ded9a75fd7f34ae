//! Bath gas properties and gas mixtures.

use std::collections::BTreeMap;

use lii_core::constants::GAS_CONSTANT_R;
use lii_core::numeric::{Tolerances, nearly_equal};

use crate::error::{MaterialError, MaterialResult};
use crate::property::Property;

/// Temperature-dependent gas quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GasProperty {
    /// Heat capacity ratio cp/cv [-]
    Gamma,
    /// Thermal conductivity [W/(m K)]
    ThermalConductivity,
    /// Internal (rotational/vibrational) degrees of freedom [-]
    Zeta,
}

impl GasProperty {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gamma => "gamma",
            Self::ThermalConductivity => "therm_cond",
            Self::Zeta => "zeta",
        }
    }
}

/// Interface consumed by heat transfer models.
pub trait GasProperties: Send + Sync {
    fn name(&self) -> &str;

    /// Molar mass [kg/mol].
    fn molar_mass(&self) -> f64;

    fn has_property(&self, key: GasProperty) -> bool;

    fn property(&self, key: GasProperty, t: f64) -> MaterialResult<f64>;

    fn gamma(&self, t: f64) -> MaterialResult<f64> {
        self.property(GasProperty::Gamma, t)
    }

    fn therm_cond(&self, t: f64) -> MaterialResult<f64> {
        self.property(GasProperty::ThermalConductivity, t)
    }

    fn zeta(&self, t: f64) -> MaterialResult<f64> {
        self.property(GasProperty::Zeta, t)
    }

    /// Mean thermal molecular speed `sqrt(8RT / (π M))` [m/s].
    fn c_tg(&self, t: f64) -> MaterialResult<f64> {
        let molar_mass = self.molar_mass();
        if molar_mass <= 0.0 || t <= 0.0 {
            return Err(MaterialError::InvalidArg {
                what: "c_tg requires positive molar mass and temperature",
            });
        }
        Ok((8.0 * GAS_CONSTANT_R * t / (std::f64::consts::PI * molar_mass)).sqrt())
    }
}

/// Property-table gas.
#[derive(Debug, Clone, PartialEq)]
pub struct Gas {
    name: String,
    molar_mass: f64,
    properties: BTreeMap<GasProperty, Property>,
}

impl Gas {
    pub fn new(name: impl Into<String>, molar_mass: f64) -> Self {
        Self {
            name: name.into(),
            molar_mass,
            properties: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: GasProperty, property: impl Into<Property>) -> Self {
        self.properties.insert(key, property.into());
        self
    }
}

impl GasProperties for Gas {
    fn name(&self) -> &str {
        &self.name
    }

    fn molar_mass(&self) -> f64 {
        self.molar_mass
    }

    fn has_property(&self, key: GasProperty) -> bool {
        self.properties.contains_key(&key)
    }

    fn property(&self, key: GasProperty, t: f64) -> MaterialResult<f64> {
        let property = self
            .properties
            .get(&key)
            .ok_or_else(|| MaterialError::MissingProperty {
                owner: self.name.clone(),
                property: key.name(),
            })?;
        let value = property.eval(t);
        if !value.is_finite() {
            return Err(MaterialError::NonPhysical {
                what: key.name(),
                value,
            });
        }
        Ok(value)
    }
}

/// Gas mixture defined by normalized mole fractions.
///
/// Mixture properties are mole-fraction weighted averages of the components.
#[derive(Debug, Clone, PartialEq)]
pub struct GasMixture {
    name: String,
    items: Vec<(Gas, f64)>,
}

impl GasMixture {
    /// Single-gas mixture.
    pub fn pure(gas: Gas) -> Self {
        Self {
            name: gas.name.clone(),
            items: vec![(gas, 1.0)],
        }
    }

    /// Validates that all fractions are finite, non-negative, and have a positive sum,
    /// then normalizes to sum=1.
    pub fn new(name: impl Into<String>, fractions: Vec<(Gas, f64)>) -> MaterialResult<Self> {
        if fractions.is_empty() {
            return Err(MaterialError::InvalidArg {
                what: "empty gas mixture",
            });
        }
        let mut sum = 0.0;
        for (_, frac) in &fractions {
            if !frac.is_finite() || *frac < 0.0 {
                return Err(MaterialError::NonPhysical {
                    what: "mole fraction",
                    value: *frac,
                });
            }
            sum += frac;
        }
        if sum <= 0.0 {
            return Err(MaterialError::NonPhysical {
                what: "mole fraction sum",
                value: sum,
            });
        }
        let items = fractions
            .into_iter()
            .map(|(g, f)| (g, f / sum))
            .filter(|(_, f)| *f > 1e-15)
            .collect();
        Ok(Self {
            name: name.into(),
            items,
        })
    }

    /// Mole fraction of a gas by name (0.0 if absent).
    pub fn mole_fraction(&self, gas_name: &str) -> f64 {
        self.items
            .iter()
            .find(|(g, _)| g.name == gas_name)
            .map(|(_, f)| *f)
            .unwrap_or(0.0)
    }

    pub fn gases(&self) -> impl Iterator<Item = (&Gas, f64)> + '_ {
        self.items.iter().map(|(g, f)| (g, *f))
    }

    pub fn is_pure(&self) -> bool {
        self.items.len() == 1
            && nearly_equal(self.items[0].1, 1.0, Tolerances::uniform(1e-10))
    }
}

impl GasProperties for GasMixture {
    fn name(&self) -> &str {
        &self.name
    }

    fn molar_mass(&self) -> f64 {
        self.items.iter().map(|(g, f)| g.molar_mass * f).sum()
    }

    fn has_property(&self, key: GasProperty) -> bool {
        self.items.iter().all(|(g, _)| g.has_property(key))
    }

    fn property(&self, key: GasProperty, t: f64) -> MaterialResult<f64> {
        let mut value = 0.0;
        for (gas, frac) in &self.items {
            value += frac * gas.property(key, t)?;
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argon() -> Gas {
        Gas::new("Ar", 0.039948)
            .with(GasProperty::Gamma, 5.0 / 3.0)
            .with(GasProperty::Zeta, 0.0)
    }

    fn nitrogen() -> Gas {
        Gas::new("N2", 0.028014)
            .with(GasProperty::Gamma, 1.4)
            .with(GasProperty::Zeta, 2.0)
    }

    #[test]
    fn mixture_weights_by_mole_fraction() {
        let mix = GasMixture::new("air-ish", vec![(argon(), 1.0), (nitrogen(), 3.0)]).unwrap();
        assert!((mix.mole_fraction("Ar") - 0.25).abs() < 1e-12);
        let zeta = mix.zeta(1000.0).unwrap();
        assert!((zeta - 1.5).abs() < 1e-12);
        let mm = mix.molar_mass();
        assert!((mm - (0.25 * 0.039948 + 0.75 * 0.028014)).abs() < 1e-12);
        assert!(!mix.is_pure());
    }

    #[test]
    fn missing_component_property_fails() {
        let mix = GasMixture::pure(argon());
        assert!(mix.is_pure());
        assert!(!mix.has_property(GasProperty::ThermalConductivity));
        assert!(mix.therm_cond(300.0).is_err());
    }

    #[test]
    fn thermal_speed_of_argon() {
        let c = argon().c_tg(300.0).unwrap();
        assert!((c - 398.8).abs() < 1.0);
    }

    #[test]
    fn negative_fraction_rejected() {
        assert!(GasMixture::new("bad", vec![(argon(), -1.0)]).is_err());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn normalized_fractions_sum_to_one(fracs in prop::collection::vec(0.01_f64..1.0_f64, 1..4)) {
            let gases: Vec<(Gas, f64)> = fracs
                .iter()
                .enumerate()
                .map(|(i, f)| (Gas::new(format!("g{i}"), 0.028), *f))
                .collect();
            let mix = GasMixture::new("mix", gases).unwrap();
            let sum: f64 = mix.gases().map(|(_, f)| f).sum();
            prop_assert!((sum - 1.0).abs() < 1e-9);
        }
    }
}

//! Particle material properties.

use std::collections::BTreeMap;

use crate::absorption::AbsorptionFunction;
use crate::error::{MaterialError, MaterialResult};
use crate::property::Property;

/// Temperature-dependent particle material quantities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MaterialProperty {
    /// Particle density [kg/m³]
    RhoP,
    /// Molar heat capacity [J/(mol K)]
    CpMol,
    /// Enthalpy of vaporization [J/mol]
    Hv,
    /// Molar mass of the evaporating species [kg/mol]
    MolarMassV,
    /// Vapor pressure [Pa]
    VaporPressure,
    /// Evaporation (mass accommodation) coefficient [-]
    ThetaE,
    /// Effective thermal accommodation coefficient [-]
    AlphaTEff,
    /// Total emissivity [-]
    Eps,
    /// Surface tension [N/m]
    SurfaceTension,
}

impl MaterialProperty {
    pub fn name(&self) -> &'static str {
        match self {
            Self::RhoP => "rho_p",
            Self::CpMol => "C_p_mol",
            Self::Hv => "H_v",
            Self::MolarMassV => "molar_mass_v",
            Self::VaporPressure => "vapor_pressure",
            Self::ThetaE => "theta_e",
            Self::AlphaTEff => "alpha_T_eff",
            Self::Eps => "eps",
            Self::SurfaceTension => "surface_tension",
        }
    }
}

/// Interface consumed by heat transfer models and temperature fits.
///
/// Implementations must be thread-safe; processing runs evaluate materials
/// from several worker threads.
pub trait MaterialProperties: Send + Sync {
    fn name(&self) -> &str;

    /// Molar mass of the particle material [kg/mol].
    fn molar_mass(&self) -> f64;

    fn has_property(&self, key: MaterialProperty) -> bool;

    fn property(&self, key: MaterialProperty, t: f64) -> MaterialResult<f64>;

    /// Absorption function E(m) at a wavelength [m].
    fn em(&self, wavelength: f64) -> MaterialResult<f64>;

    fn rho_p(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::RhoP, t)
    }

    fn c_p_mol(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::CpMol, t)
    }

    /// Mass-specific heat capacity [J/(kg K)].
    fn c_p(&self, t: f64) -> MaterialResult<f64> {
        let molar_mass = self.molar_mass();
        if molar_mass <= 0.0 {
            return Err(MaterialError::NonPhysical {
                what: "molar mass",
                value: molar_mass,
            });
        }
        Ok(self.c_p_mol(t)? / molar_mass)
    }

    fn h_v(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::Hv, t)
    }

    fn molar_mass_v(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::MolarMassV, t)
    }

    fn vapor_pressure(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::VaporPressure, t)
    }

    fn theta_e(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::ThetaE, t)
    }

    fn alpha_t_eff(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::AlphaTEff, t)
    }

    fn eps(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::Eps, t)
    }

    fn surface_tension(&self, t: f64) -> MaterialResult<f64> {
        self.property(MaterialProperty::SurfaceTension, t)
    }
}

/// Property-table material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    name: String,
    molar_mass: f64,
    properties: BTreeMap<MaterialProperty, Property>,
    em: Option<AbsorptionFunction>,
}

impl Material {
    pub fn new(name: impl Into<String>, molar_mass: f64) -> Self {
        Self {
            name: name.into(),
            molar_mass,
            properties: BTreeMap::new(),
            em: None,
        }
    }

    pub fn with(mut self, key: MaterialProperty, property: impl Into<Property>) -> Self {
        self.properties.insert(key, property.into());
        self
    }

    pub fn with_em(mut self, em: AbsorptionFunction) -> Self {
        self.em = Some(em);
        self
    }

    pub fn set_property(&mut self, key: MaterialProperty, property: Property) {
        self.properties.insert(key, property);
    }

    pub fn absorption(&self) -> Option<&AbsorptionFunction> {
        self.em.as_ref()
    }
}

impl MaterialProperties for Material {
    fn name(&self) -> &str {
        &self.name
    }

    fn molar_mass(&self) -> f64 {
        self.molar_mass
    }

    fn has_property(&self, key: MaterialProperty) -> bool {
        self.properties.contains_key(&key)
    }

    fn property(&self, key: MaterialProperty, t: f64) -> MaterialResult<f64> {
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

    fn em(&self, wavelength: f64) -> MaterialResult<f64> {
        if !(wavelength > 0.0) {
            return Err(MaterialError::InvalidArg {
                what: "wavelength must be positive",
            });
        }
        let em = self.em.as_ref().ok_or_else(|| MaterialError::MissingProperty {
            owner: self.name.clone(),
            property: "E(m)",
        })?;
        let value = em.eval(wavelength);
        if !value.is_finite() || value <= 0.0 {
            return Err(MaterialError::NonPhysical {
                what: "E(m)",
                value,
            });
        }
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_property_is_reported_by_name() {
        let m = Material::new("bare", 0.012);
        let err = m.rho_p(1000.0).unwrap_err();
        assert!(err.to_string().contains("rho_p"));
        assert!(m.em(650e-9).is_err());
    }

    #[test]
    fn mass_specific_heat_divides_molar_mass() {
        let m = Material::new("c", 0.012).with(MaterialProperty::CpMol, 24.0);
        assert!((m.c_p(2000.0).unwrap() - 2000.0).abs() < 1e-9);
    }

    #[test]
    fn em_rejects_non_positive_wavelength() {
        let m = Material::new("c", 0.012).with_em(AbsorptionFunction::Constant(0.3));
        assert!(m.em(0.0).is_err());
        assert_eq!(m.em(650e-9).unwrap(), 0.3);
    }
}

//! Illustrative property sets for common LII materials and bath gases.
//!
//! Values are representative literature magnitudes suitable for simulations and
//! tests, not a replacement for a curated property database.

use crate::absorption::AbsorptionFunction;
use crate::gas::{Gas, GasProperty};
use crate::material::{Material, MaterialProperty};
use crate::property::Property;

/// Soot with C3 as the dominant evaporating species.
pub fn soot() -> Material {
    Material::new("soot", 0.012011)
        .with(MaterialProperty::RhoP, 1860.0)
        .with(MaterialProperty::CpMol, Property::Polynomial(vec![17.0, 2.5e-3]))
        .with(MaterialProperty::Hv, 7.78e5)
        .with(MaterialProperty::MolarMassV, 0.036033)
        .with(
            MaterialProperty::VaporPressure,
            Property::clausius_clapeyron(101_325.0, 3900.0, 7.78e5),
        )
        .with(MaterialProperty::ThetaE, 0.77)
        .with(MaterialProperty::AlphaTEff, 0.37)
        .with(MaterialProperty::Eps, 0.9)
        .with(MaterialProperty::SurfaceTension, 0.18)
        .with_em(AbsorptionFunction::Constant(0.35))
}

/// Liquid iron nanoparticles.
pub fn iron() -> Material {
    Material::new("iron", 0.055845)
        .with(MaterialProperty::RhoP, Property::Polynomial(vec![8171.0, -0.64985]))
        .with(MaterialProperty::CpMol, 46.0)
        .with(MaterialProperty::Hv, 3.5e5)
        .with(MaterialProperty::MolarMassV, 0.055845)
        .with(
            MaterialProperty::VaporPressure,
            Property::clausius_clapeyron(101_325.0, 3134.0, 3.5e5),
        )
        .with(MaterialProperty::ThetaE, 1.0)
        .with(MaterialProperty::AlphaTEff, 0.13)
        .with(MaterialProperty::Eps, 0.2)
        .with(MaterialProperty::SurfaceTension, Property::Polynomial(vec![2.858, -5.2e-4]))
        .with_em(AbsorptionFunction::Drude {
            plasma_frequency: 1.2e16,
            relaxation_time: 3.0e-16,
            epsilon_inf: 1.0,
        })
}

/// Liquid silicon nanoparticles.
pub fn silicon() -> Material {
    Material::new("silicon", 0.028086)
        .with(MaterialProperty::RhoP, Property::Polynomial(vec![2820.0, -0.1]))
        .with(MaterialProperty::CpMol, 27.2)
        .with(MaterialProperty::Hv, 3.84e5)
        .with(MaterialProperty::MolarMassV, 0.028086)
        .with(
            MaterialProperty::VaporPressure,
            Property::clausius_clapeyron(101_325.0, 3538.0, 3.84e5),
        )
        .with(MaterialProperty::ThetaE, 1.0)
        .with(MaterialProperty::AlphaTEff, 0.3)
        .with(MaterialProperty::Eps, 0.2)
        .with(MaterialProperty::SurfaceTension, Property::Polynomial(vec![0.9, -1.0e-4]))
        .with_em(AbsorptionFunction::Drude {
            plasma_frequency: 2.6e16,
            relaxation_time: 2.1e-16,
            epsilon_inf: 1.0,
        })
}

pub fn argon() -> Gas {
    Gas::new("Ar", 0.039948)
        .with(GasProperty::Gamma, 5.0 / 3.0)
        .with(
            GasProperty::ThermalConductivity,
            Property::Polynomial(vec![7.6e-3, 3.36e-5]),
        )
        .with(GasProperty::Zeta, 0.0)
}

pub fn nitrogen() -> Gas {
    Gas::new("N2", 0.028014)
        .with(GasProperty::Gamma, Property::Polynomial(vec![1.41, -6.0e-5]))
        .with(
            GasProperty::ThermalConductivity,
            Property::Polynomial(vec![1.05e-2, 5.15e-5]),
        )
        .with(GasProperty::Zeta, 2.0)
}

pub fn helium() -> Gas {
    Gas::new("He", 0.0040026)
        .with(GasProperty::Gamma, 5.0 / 3.0)
        .with(
            GasProperty::ThermalConductivity,
            Property::Polynomial(vec![7.37e-2, 2.71e-4]),
        )
        .with(GasProperty::Zeta, 0.0)
}

/// Names accepted by [`material_by_name`].
pub const MATERIAL_NAMES: [&str; 3] = ["soot", "iron", "silicon"];

pub fn material_by_name(name: &str) -> Option<Material> {
    match name.to_ascii_lowercase().as_str() {
        "soot" => Some(soot()),
        "iron" => Some(iron()),
        "silicon" => Some(silicon()),
        _ => None,
    }
}

/// Names accepted by [`gas_by_name`].
pub const GAS_NAMES: [&str; 3] = ["Ar", "N2", "He"];

pub fn gas_by_name(name: &str) -> Option<Gas> {
    match name.to_ascii_lowercase().as_str() {
        "ar" | "argon" => Some(argon()),
        "n2" | "nitrogen" => Some(nitrogen()),
        "he" | "helium" => Some(helium()),
        _ => None,
    }
}

//! Plausibility checks on the built-in property sets.

use lii_materials::catalog::{self, GAS_NAMES, MATERIAL_NAMES};
use lii_materials::{GasProperties, MaterialProperties, MaterialProperty};

#[test]
fn every_catalog_material_defines_all_properties() {
    let keys = [
        MaterialProperty::RhoP,
        MaterialProperty::CpMol,
        MaterialProperty::Hv,
        MaterialProperty::MolarMassV,
        MaterialProperty::VaporPressure,
        MaterialProperty::ThetaE,
        MaterialProperty::AlphaTEff,
        MaterialProperty::Eps,
        MaterialProperty::SurfaceTension,
    ];
    for name in MATERIAL_NAMES {
        let material = catalog::material_by_name(name).expect("catalog material");
        for key in keys {
            assert!(material.has_property(key), "{name} lacks {}", key.name());
            let v = material.property(key, 2500.0).unwrap();
            assert!(v.is_finite() && v > 0.0, "{name} {} = {v}", key.name());
        }
        assert!(material.em(650e-9).unwrap() > 0.0);
    }
}

#[test]
fn vapor_pressure_rises_with_temperature() {
    for name in MATERIAL_NAMES {
        let material = catalog::material_by_name(name).unwrap();
        let low = material.vapor_pressure(2000.0).unwrap();
        let high = material.vapor_pressure(3000.0).unwrap();
        assert!(high > low * 10.0, "{name}: {low} -> {high}");
    }
}

#[test]
fn catalog_gases_are_physical() {
    for name in GAS_NAMES {
        let gas = catalog::gas_by_name(name).expect("catalog gas");
        let gamma = gas.gamma(1500.0).unwrap();
        assert!(gamma > 1.0 && gamma <= 5.0 / 3.0 + 1e-12);
        assert!(gas.therm_cond(1500.0).unwrap() > 0.0);
        assert!(gas.c_tg(1500.0).unwrap() > 0.0);
    }
}

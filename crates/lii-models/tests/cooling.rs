use lii_core::units::{bar, k};
use lii_materials::{Material, MaterialProperty, catalog};
use lii_models::{
    EnergyTerm, HeatTransferContext, HeatTransferModel, ModelError, ParticleState,
    ProcessConditions, SimOptions, TermGates, all_models, model_by_name, simulate_cooling,
};
use proptest::prelude::*;

fn conditions() -> ProcessConditions {
    ProcessConditions::new(bar(1.0), k(1500.0))
}

#[test]
fn every_model_cools_a_hot_soot_particle() {
    let soot = catalog::soot();
    let argon = catalog::argon();
    let ctx = HeatTransferContext::new(&soot, &argon, conditions());
    for model in all_models() {
        let dtdt = model.derivative_t(&ctx, 3500.0, 30e-9).unwrap();
        assert!(dtdt < 0.0, "{} should cool, got {dtdt}", model.identifier());
        let ddp = model.derivative_dp(&ctx, 3500.0, 30e-9).unwrap();
        assert!(ddp <= 0.0, "{} should not grow", model.identifier());
    }
}

#[test]
fn simulated_trace_decreases_monotonically() {
    let soot = catalog::soot();
    let argon = catalog::argon();
    let ctx = HeatTransferContext::new(&soot, &argon, conditions());
    let model = model_by_name("Kock").unwrap();
    let opts = SimOptions {
        dt: 1e-9,
        t_end: 500e-9,
        record_every: 5,
        ..SimOptions::default()
    };
    let trace = simulate_cooling(
        model.as_ref(),
        ctx,
        ParticleState {
            temperature: 3500.0,
            diameter: 30e-9,
        },
        &opts,
    )
    .unwrap();
    assert_eq!(trace.len(), 101);
    assert!(trace.temperature.windows(2).all(|w| w[1] < w[0]));
    assert!(trace.diameter.windows(2).all(|w| w[1] <= w[0]));
    assert!(*trace.temperature.last().unwrap() > 1500.0);
}

#[test]
fn unsupported_terms_contribute_nothing() {
    let soot = catalog::soot();
    let argon = catalog::argon();
    let ctx = HeatTransferContext::new(&soot, &argon, conditions());
    for model in all_models() {
        for term in [EnergyTerm::Oxidation, EnergyTerm::Annealing, EnergyTerm::Thermionic] {
            assert_eq!(model.term(term, &ctx, 3000.0, 20e-9).unwrap(), 0.0);
        }
    }
}

#[test]
fn missing_properties_are_reported() {
    let bare = Material::new("bare", 0.012).with(MaterialProperty::RhoP, 2000.0);
    let argon = catalog::argon();
    let model = model_by_name("menser").unwrap();
    match model.check_availability(&bare, &argon) {
        Err(ModelError::MissingProperties { model, missing }) => {
            assert_eq!(model, "menser");
            assert!(missing.contains(&"C_p_mol".to_string()));
            assert!(missing.contains(&"surface_tension".to_string()));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(model.check_availability(&catalog::silicon(), &argon).is_ok());
}

#[test]
fn gating_removes_requirements() {
    let mut model = model_by_name("melton").unwrap();
    model.set_gates(TermGates {
        use_conduction: false,
        ..TermGates::default()
    });
    assert!(model.active_terms().iter().all(|t| *t != EnergyTerm::Conduction));
    let needs_gas = model
        .required_properties()
        .iter()
        .any(|r| matches!(r, lii_models::Requirement::Gas(_)));
    assert!(!needs_gas);
}

proptest! {
    #[test]
    fn all_terms_gated_off_freezes_temperature(
        t in 500.0f64..5000.0,
        dp in 1e-9f64..200e-9,
        idx in 0usize..5,
    ) {
        let soot = catalog::soot();
        let argon = catalog::argon();
        let ctx = HeatTransferContext::new(&soot, &argon, conditions());
        let mut model = all_models().swap_remove(idx);
        model.set_gates(TermGates::none());
        prop_assert_eq!(model.derivative_t(&ctx, t, dp).unwrap(), 0.0);
        prop_assert_eq!(model.derivative_dp(&ctx, t, dp).unwrap(), 0.0);
    }

    #[test]
    fn conduction_sign_follows_temperature_difference(t in 300.0f64..5000.0, idx in 0usize..5) {
        let soot = catalog::soot();
        let nitrogen = catalog::nitrogen();
        let ctx = HeatTransferContext::new(&soot, &nitrogen, conditions());
        let model = all_models().swap_remove(idx);
        let q = model.conduction(&ctx, t, 20e-9).unwrap();
        if t > 1500.0 {
            prop_assert!(q > 0.0);
        } else if t < 1500.0 {
            prop_assert!(q < 0.0);
        }
    }
}

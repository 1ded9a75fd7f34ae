//! Concrete heat transfer closures.

mod kock;
mod liu;
mod mansmann;
mod melton;
mod menser;

pub use kock::Kock;
pub use liu::Liu;
pub use mansmann::Mansmann;
pub use melton::Melton;
pub use menser::Menser;

use crate::error::ModelResult;
use crate::kinetics::hertz_knudsen_mass_loss;
use crate::model::{EnergyTerm, HeatTransferContext, HeatTransferModel};

pub(crate) const STANDARD_TERMS: &[EnergyTerm] = &[
    EnergyTerm::Conduction,
    EnergyTerm::Evaporation,
    EnergyTerm::Radiation,
];

/// Plain Hertz-Knudsen evaporation shared by every closure except Menser.
pub(crate) fn free_molecular_evaporation(ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
    let material = ctx.material;
    Ok(hertz_knudsen_mass_loss(
        material.theta_e(t)?,
        dp,
        material.vapor_pressure(t)?,
        material.molar_mass_v(t)?,
        t,
    ))
}

/// Every model with default settings.
pub fn all_models() -> Vec<Box<dyn HeatTransferModel>> {
    vec![
        Box::new(Kock::default()),
        Box::new(Liu::default()),
        Box::new(Mansmann::default()),
        Box::new(Melton::default()),
        Box::new(Menser::default()),
    ]
}

/// Look up a model by identifier (case-insensitive).
pub fn model_by_name(identifier: &str) -> Option<Box<dyn HeatTransferModel>> {
    all_models()
        .into_iter()
        .find(|m| m.identifier().eq_ignore_ascii_case(identifier))
}

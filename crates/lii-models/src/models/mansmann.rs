use lii_materials::{GasProperty, MaterialProperty};

use crate::error::ModelResult;
use crate::kinetics::free_molecular_conduction;
use crate::model::{
    EnergyTerm, HeatTransferContext, HeatTransferModel, ModelInfo, Requirement, SystemFunction,
    TermGates, common_requirements,
};

static INFO: ModelInfo = ModelInfo {
    identifier: "mansmann",
    name: "Mansmann 2017",
    description: "Free-molecular conduction from internal degrees of freedom of the gas",
    version: "1.0",
    system: SystemFunction::TemperatureMass,
};

/// Metal nanoparticle closure. The heat capacity factor is written as
/// `4 + ζ(Tg)`, which equals `(γ+1)/(γ−1)` for an ideal gas.
#[derive(Debug, Clone, Default)]
pub struct Mansmann {
    gates: TermGates,
}

impl HeatTransferModel for Mansmann {
    fn info(&self) -> &ModelInfo {
        &INFO
    }

    fn supported_terms(&self) -> &'static [EnergyTerm] {
        super::STANDARD_TERMS
    }

    fn gates(&self) -> TermGates {
        self.gates
    }

    fn set_gates(&mut self, gates: TermGates) {
        self.gates = gates;
    }

    fn conduction(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        let tg = ctx.gas_temperature()?;
        let zeta = ctx.gas.zeta(tg)?;
        Ok(free_molecular_conduction(
            ctx.material.alpha_t_eff(t)?,
            dp,
            ctx.gas_pressure()?,
            ctx.gas.c_tg(tg)?,
            4.0 + zeta,
            t,
            tg,
        ))
    }

    fn mass_loss_evap(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        super::free_molecular_evaporation(ctx, t, dp)
    }

    fn required_properties(&self) -> Vec<Requirement> {
        let mut out = common_requirements(self.gates);
        if self.gates.use_conduction {
            out.push(Requirement::Material(MaterialProperty::AlphaTEff));
            out.push(Requirement::Gas(GasProperty::Zeta));
        }
        out
    }
}

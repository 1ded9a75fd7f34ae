use lii_materials::GasProperty;

use crate::error::ModelResult;
use crate::kinetics::{free_molecular_conduction, gamma_factor};
use crate::model::{
    EnergyTerm, HeatTransferContext, HeatTransferModel, ModelInfo, Requirement, SystemFunction,
    TermGates, common_requirements,
};

static INFO: ModelInfo = ModelInfo {
    identifier: "kock",
    name: "Kock 2006",
    description: "Free-molecular conduction with the heat capacity ratio at gas temperature",
    version: "1.0",
    system: SystemFunction::TemperatureDiameter,
};

/// Free-molecular regime closure.
#[derive(Debug, Clone, Default)]
pub struct Kock {
    gates: TermGates,
}

impl HeatTransferModel for Kock {
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
        let gamma = ctx.gas.gamma(tg)?;
        Ok(free_molecular_conduction(
            ctx.material.alpha_t_eff(t)?,
            dp,
            ctx.gas_pressure()?,
            ctx.gas.c_tg(tg)?,
            gamma_factor(gamma),
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
            out.push(Requirement::Material(lii_materials::MaterialProperty::AlphaTEff));
            out.push(Requirement::Gas(GasProperty::Gamma));
        }
        out
    }
}

use lii_materials::{GasProperty, MaterialProperty};

use crate::error::ModelResult;
use crate::kinetics::{free_molecular_conduction, gamma_factor, hertz_knudsen_mass_loss, kelvin_factor};
use crate::model::{
    EnergyTerm, HeatTransferContext, HeatTransferModel, ModelInfo, Requirement, SystemFunction,
    TermGates, common_requirements,
};

static INFO: ModelInfo = ModelInfo {
    identifier: "menser",
    name: "Menser 2016",
    description: "Free-molecular closure with Kelvin-corrected vapor pressure",
    version: "1.0",
    system: SystemFunction::TemperatureDiameter,
};

/// Silicon nanoparticle closure. Evaporation uses the vapor pressure above the
/// curved particle surface.
#[derive(Debug, Clone, Default)]
pub struct Menser {
    gates: TermGates,
}

impl HeatTransferModel for Menser {
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
        Ok(free_molecular_conduction(
            ctx.material.alpha_t_eff(t)?,
            dp,
            ctx.gas_pressure()?,
            ctx.gas.c_tg(tg)?,
            gamma_factor(ctx.gas.gamma(tg)?),
            t,
            tg,
        ))
    }

    fn mass_loss_evap(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        let material = ctx.material;
        let molar_mass_v = material.molar_mass_v(t)?;
        let kelvin = kelvin_factor(
            material.surface_tension(t)?,
            molar_mass_v,
            t,
            material.rho_p(t)?,
            dp,
        );
        let p_v = material.vapor_pressure(t)? * kelvin;
        Ok(hertz_knudsen_mass_loss(material.theta_e(t)?, dp, p_v, molar_mass_v, t))
    }

    fn required_properties(&self) -> Vec<Requirement> {
        let mut out = common_requirements(self.gates);
        if self.gates.use_evaporation {
            out.push(Requirement::Material(MaterialProperty::SurfaceTension));
        }
        if self.gates.use_conduction {
            out.push(Requirement::Material(MaterialProperty::AlphaTEff));
            out.push(Requirement::Gas(GasProperty::Gamma));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProcessConditions;
    use crate::models::Kock;
    use lii_materials::catalog;

    #[test]
    fn kelvin_correction_increases_evaporation() {
        let si = catalog::silicon();
        let argon = catalog::argon();
        let ctx = HeatTransferContext::new(&si, &argon, ProcessConditions::default());
        let menser = Menser::default().mass_loss_evap(&ctx, 3000.0, 5e-9).unwrap();
        let plain = Kock::default().mass_loss_evap(&ctx, 3000.0, 5e-9).unwrap();
        assert!(menser > plain);
    }
}

use lii_materials::{GasProperty, MaterialProperty};

use crate::error::ModelResult;
use crate::model::{
    EnergyTerm, HeatTransferContext, HeatTransferModel, ModelInfo, Requirement, SystemFunction,
    TermGates, common_requirements,
};

static INFO: ModelInfo = ModelInfo {
    identifier: "melton",
    name: "Melton 1984",
    description: "Transition-regime conduction with the Eucken correction",
    version: "1.0",
    system: SystemFunction::TemperatureDiameter,
};

/// Transition regime closure
/// `q = 2π k dp (T−Tg) / (1 + 2Gλ/dp)` with `G = 8f/(α(γ+1))`
/// and the Eucken factor `f = (9γ−5)/4`.
#[derive(Debug, Clone, Default)]
pub struct Melton {
    gates: TermGates,
}

impl Melton {
    /// Eucken factor relating thermal conductivity to viscosity.
    pub fn eucken_factor(gamma: f64) -> f64 {
        (9.0 * gamma - 5.0) / 4.0
    }

    /// Gas mean free path [m] consistent with the Eucken relation.
    pub fn mean_free_path(&self, ctx: &HeatTransferContext<'_>) -> ModelResult<f64> {
        let tg = ctx.gas_temperature()?;
        let gamma = ctx.gas.gamma(tg)?;
        let k_g = ctx.gas.therm_cond(tg)?;
        let p = ctx.gas_pressure()?;
        let c_tg = ctx.gas.c_tg(tg)?;
        Ok(k_g * tg * (gamma - 1.0) / (Self::eucken_factor(gamma) * p * c_tg))
    }
}

impl HeatTransferModel for Melton {
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
        if ctx.gas_pressure()? == 0.0 {
            return Ok(0.0);
        }
        let gamma = ctx.gas.gamma(tg)?;
        let alpha = ctx.material.alpha_t_eff(t)?;
        let k_g = ctx.gas.therm_cond(tg)?;
        let g = 8.0 * Self::eucken_factor(gamma) / (alpha * (gamma + 1.0));
        let lambda = self.mean_free_path(ctx)?;
        Ok(2.0 * std::f64::consts::PI * k_g * dp * (t - tg) / (1.0 + 2.0 * g * lambda / dp))
    }

    fn mass_loss_evap(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        super::free_molecular_evaporation(ctx, t, dp)
    }

    fn required_properties(&self) -> Vec<Requirement> {
        let mut out = common_requirements(self.gates);
        if self.gates.use_conduction {
            out.push(Requirement::Material(MaterialProperty::AlphaTEff));
            out.push(Requirement::Gas(GasProperty::Gamma));
            out.push(Requirement::Gas(GasProperty::ThermalConductivity));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Kock;
    use crate::model::ProcessConditions;
    use lii_core::units::{k, pa};
    use lii_materials::catalog;

    #[test]
    fn approaches_free_molecular_limit_at_low_pressure() {
        let soot = catalog::soot();
        let argon = catalog::argon();
        let ctx = HeatTransferContext::new(&soot, &argon, ProcessConditions::new(pa(100.0), k(300.0)));
        let dp = 10e-9;
        let melton = Melton::default().conduction(&ctx, 3000.0, dp).unwrap();
        let kock = Kock::default().conduction(&ctx, 3000.0, dp).unwrap();
        assert!((melton - kock).abs() / kock < 1e-3);
    }

    #[test]
    fn conduction_below_free_molecular_at_high_pressure() {
        let soot = catalog::soot();
        let argon = catalog::argon();
        let ctx = HeatTransferContext::new(&soot, &argon, ProcessConditions::new(pa(1e6), k(300.0)));
        let dp = 200e-9;
        let melton = Melton::default().conduction(&ctx, 3000.0, dp).unwrap();
        let kock = Kock::default().conduction(&ctx, 3000.0, dp).unwrap();
        assert!(melton > 0.0 && melton < kock);
    }
}

use lii_materials::{GasProperty, MaterialProperty};

use crate::error::ModelResult;
use crate::kinetics::{free_molecular_conduction, gamma_factor};
use crate::model::{
    EnergyTerm, HeatTransferContext, HeatTransferModel, ModelInfo, Requirement, SystemFunction,
    TermGates, common_requirements,
};

static INFO: ModelInfo = ModelInfo {
    identifier: "liu",
    name: "Liu 2006",
    description: "Free-molecular conduction with a temperature-averaged heat capacity ratio",
    version: "1.0",
    system: SystemFunction::TemperatureDiameter,
};

const GAMMA_INTERVALS: usize = 20;

/// Free-molecular closure with the mean heat capacity ratio
/// `1/(γ*−1) = 1/(T−Tg) ∫ dT'/(γ(T')−1)` between gas and particle temperature.
#[derive(Debug, Clone, Default)]
pub struct Liu {
    gates: TermGates,
}

impl Liu {
    /// Mean heat capacity ratio via trapezoidal integration.
    pub fn mean_gamma(&self, ctx: &HeatTransferContext<'_>, t: f64) -> ModelResult<f64> {
        let tg = ctx.gas_temperature()?;
        if (t - tg).abs() < 1e-6 {
            return Ok(ctx.gas.gamma(tg)?);
        }
        let h = (t - tg) / GAMMA_INTERVALS as f64;
        let mut sum = 0.0;
        for i in 0..=GAMMA_INTERVALS {
            let weight = if i == 0 || i == GAMMA_INTERVALS { 0.5 } else { 1.0 };
            let gamma = ctx.gas.gamma(tg + h * i as f64)?;
            sum += weight / (gamma - 1.0);
        }
        let mean_inv = sum * h / (t - tg);
        Ok(1.0 + 1.0 / mean_inv)
    }
}

impl HeatTransferModel for Liu {
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
        let gamma = self.mean_gamma(ctx, t)?;
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
    use lii_materials::catalog;

    #[test]
    fn constant_gamma_is_its_own_mean() {
        let soot = catalog::soot();
        let argon = catalog::argon();
        let ctx = HeatTransferContext::new(&soot, &argon, ProcessConditions::default());
        let g = Liu::default().mean_gamma(&ctx, 3000.0).unwrap();
        assert!((g - 5.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn varying_gamma_mean_lies_between_endpoints() {
        let soot = catalog::soot();
        let n2 = catalog::nitrogen();
        let ctx = HeatTransferContext::new(&soot, &n2, ProcessConditions::default());
        let g = Liu::default().mean_gamma(&ctx, 3000.0).unwrap();
        let g_hot = n2_gamma(3000.0);
        let g_cold = n2_gamma(1500.0);
        assert!(g < g_cold && g > g_hot);
    }

    fn n2_gamma(t: f64) -> f64 {
        use lii_materials::GasProperties;
        catalog::nitrogen().gamma(t).unwrap()
    }
}

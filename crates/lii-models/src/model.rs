//! Heat transfer model interface and generic energy balance.

use lii_core::ensure_positive;
use lii_core::units::{Pressure, Temperature, bar, k};
use lii_materials::{GasProperties, GasProperty, MaterialProperties, MaterialProperty};
use uom::si::{pressure::pascal, thermodynamic_temperature::kelvin};

use crate::error::{ModelError, ModelResult};
use crate::kinetics::{gray_body_radiation, sphere_mass};

/// Energy exchange mechanisms of a heated particle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EnergyTerm {
    Conduction,
    Evaporation,
    Radiation,
    Oxidation,
    Annealing,
    Thermionic,
}

impl EnergyTerm {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Conduction => "conduction",
            Self::Evaporation => "evaporation",
            Self::Radiation => "radiation",
            Self::Oxidation => "oxidation",
            Self::Annealing => "annealing",
            Self::Thermionic => "thermionic",
        }
    }
}

/// Which ODE system a model is formulated for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SystemFunction {
    /// Temperature and particle diameter (dT/dt, ddp/dt)
    TemperatureDiameter,
    /// Temperature and particle mass (dT/dt, dM/dt)
    TemperatureMass,
}

/// Descriptive metadata of a model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelInfo {
    pub identifier: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub system: SystemFunction,
}

/// Runtime switches for the three implemented mechanisms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermGates {
    pub use_conduction: bool,
    pub use_evaporation: bool,
    pub use_radiation: bool,
}

impl Default for TermGates {
    fn default() -> Self {
        Self {
            use_conduction: true,
            use_evaporation: true,
            use_radiation: true,
        }
    }
}

impl TermGates {
    pub fn none() -> Self {
        Self {
            use_conduction: false,
            use_evaporation: false,
            use_radiation: false,
        }
    }

    pub fn allows(&self, term: EnergyTerm) -> bool {
        match term {
            EnergyTerm::Conduction => self.use_conduction,
            EnergyTerm::Evaporation => self.use_evaporation,
            EnergyTerm::Radiation => self.use_radiation,
            EnergyTerm::Oxidation | EnergyTerm::Annealing | EnergyTerm::Thermionic => true,
        }
    }
}

/// Bath gas state around the particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessConditions {
    pub gas_pressure: Pressure,
    pub gas_temperature: Temperature,
}

impl Default for ProcessConditions {
    fn default() -> Self {
        Self {
            gas_pressure: bar(1.0),
            gas_temperature: k(1500.0),
        }
    }
}

impl ProcessConditions {
    pub fn new(gas_pressure: Pressure, gas_temperature: Temperature) -> Self {
        Self {
            gas_pressure,
            gas_temperature,
        }
    }

    pub fn pressure_pa(&self) -> f64 {
        self.gas_pressure.get::<pascal>()
    }

    pub fn temperature_k(&self) -> f64 {
        self.gas_temperature.get::<kelvin>()
    }
}

/// A property a model needs from the material or gas database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Requirement {
    Material(MaterialProperty),
    Gas(GasProperty),
}

impl Requirement {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Material(p) => p.name(),
            Self::Gas(p) => p.name(),
        }
    }
}

/// Everything a model evaluation reads besides T and dp.
#[derive(Clone, Copy)]
pub struct HeatTransferContext<'a> {
    pub material: &'a dyn MaterialProperties,
    pub gas: &'a dyn GasProperties,
    pub conditions: ProcessConditions,
}

impl<'a> HeatTransferContext<'a> {
    pub fn new(
        material: &'a dyn MaterialProperties,
        gas: &'a dyn GasProperties,
        conditions: ProcessConditions,
    ) -> Self {
        Self {
            material,
            gas,
            conditions,
        }
    }

    pub(crate) fn gas_pressure(&self) -> ModelResult<f64> {
        let p = self.conditions.pressure_pa();
        if !(p.is_finite() && p >= 0.0) {
            return Err(ModelError::NonPhysical {
                what: "gas pressure must be finite and non-negative",
            });
        }
        Ok(p)
    }

    pub(crate) fn gas_temperature(&self) -> ModelResult<f64> {
        let tg = self.conditions.temperature_k();
        if !(tg.is_finite() && tg > 0.0) {
            return Err(ModelError::NonPhysical {
                what: "gas temperature must be positive",
            });
        }
        Ok(tg)
    }
}

fn check_state(t: f64, dp: f64) -> ModelResult<()> {
    ensure_positive(t, "particle temperature")?;
    ensure_positive(dp, "particle diameter")?;
    Ok(())
}

/// Closed-form closure of a nanoparticle energy and mass balance.
///
/// Heat rates are in W and positive when the particle loses energy. Models only
/// implement the terms they list in [`supported_terms`](Self::supported_terms);
/// every other term evaluates to zero.
pub trait HeatTransferModel: Send + Sync {
    fn info(&self) -> &ModelInfo;

    fn supported_terms(&self) -> &'static [EnergyTerm];

    fn gates(&self) -> TermGates;

    fn set_gates(&mut self, gates: TermGates);

    /// Heat conduction to the bath gas [W].
    fn conduction(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64>;

    /// Evaporative mass loss [kg/s], positive for shrinking particles.
    fn mass_loss_evap(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64>;

    /// Properties needed by the currently active terms.
    fn required_properties(&self) -> Vec<Requirement>;

    /// Evaporative heat loss [W].
    fn evaporation(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        let mass_loss = self.mass_loss_evap(ctx, t, dp)?;
        let h_v = ctx.material.h_v(t)?;
        let molar_mass_v = ctx.material.molar_mass_v(t)?;
        Ok(mass_loss * h_v / molar_mass_v)
    }

    /// Thermal radiation [W].
    fn radiation(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        let eps = ctx.material.eps(t)?;
        Ok(gray_body_radiation(eps, dp, t, ctx.gas_temperature()?))
    }

    fn identifier(&self) -> &'static str {
        self.info().identifier
    }

    fn name(&self) -> &'static str {
        self.info().name
    }

    /// Supported terms that are switched on.
    fn active_terms(&self) -> Vec<EnergyTerm> {
        let gates = self.gates();
        self.supported_terms()
            .iter()
            .copied()
            .filter(|term| gates.allows(*term))
            .collect()
    }

    /// Heat rate of one term [W]; zero for inactive or unsupported terms.
    fn term(&self, term: EnergyTerm, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        if !self.active_terms().contains(&term) {
            return Ok(0.0);
        }
        match term {
            EnergyTerm::Conduction => self.conduction(ctx, t, dp),
            EnergyTerm::Evaporation => self.evaporation(ctx, t, dp),
            EnergyTerm::Radiation => self.radiation(ctx, t, dp),
            EnergyTerm::Oxidation | EnergyTerm::Annealing | EnergyTerm::Thermionic => Ok(0.0),
        }
    }

    /// Particle mass [kg].
    fn mass(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        Ok(sphere_mass(ctx.material.rho_p(t)?, dp))
    }

    /// Temperature derivative dT/dt [K/s].
    fn derivative_t(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        check_state(t, dp)?;
        let mut losses = 0.0;
        for term in self.active_terms() {
            losses += self.term(term, ctx, t, dp)?;
        }
        if losses == 0.0 {
            return Ok(0.0);
        }
        let mass = self.mass(ctx, t, dp)?;
        let c_p = ctx.material.c_p(t)?;
        Ok(-losses / (mass * c_p))
    }

    /// Diameter derivative ddp/dt [m/s] from evaporative mass loss.
    fn derivative_dp(&self, ctx: &HeatTransferContext<'_>, t: f64, dp: f64) -> ModelResult<f64> {
        check_state(t, dp)?;
        if !self.active_terms().contains(&EnergyTerm::Evaporation) {
            return Ok(0.0);
        }
        let mass_loss = self.mass_loss_evap(ctx, t, dp)?;
        let rho_p = ctx.material.rho_p(t)?;
        Ok(-2.0 * mass_loss / (rho_p * std::f64::consts::PI * dp * dp))
    }

    /// Fail with the list of required properties the databases do not define.
    fn check_availability(
        &self,
        material: &dyn MaterialProperties,
        gas: &dyn GasProperties,
    ) -> ModelResult<()> {
        let missing: Vec<String> = self
            .required_properties()
            .into_iter()
            .filter(|req| match req {
                Requirement::Material(p) => !material.has_property(*p),
                Requirement::Gas(p) => !gas.has_property(*p),
            })
            .map(|req| req.name().to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            tracing::warn!(model = self.identifier(), ?missing, "model properties unavailable");
            Err(ModelError::MissingProperties {
                model: self.identifier().to_string(),
                missing,
            })
        }
    }
}

/// Material properties every model needs for the balance itself, plus the
/// radiation and evaporation inputs when those terms are active.
pub(crate) fn common_requirements(gates: TermGates) -> Vec<Requirement> {
    let mut out = vec![
        Requirement::Material(MaterialProperty::RhoP),
        Requirement::Material(MaterialProperty::CpMol),
    ];
    if gates.use_evaporation {
        out.extend([
            Requirement::Material(MaterialProperty::Hv),
            Requirement::Material(MaterialProperty::MolarMassV),
            Requirement::Material(MaterialProperty::VaporPressure),
            Requirement::Material(MaterialProperty::ThetaE),
        ]);
    }
    if gates.use_radiation {
        out.push(Requirement::Material(MaterialProperty::Eps));
    }
    out
}

//! Particle heat transfer models for laser-induced incandescence.
//!
//! Provides:
//! - `HeatTransferModel`: energy/mass balance closure of a heated nanoparticle
//! - five closures (Kock, Liu, Mansmann, Melton, Menser)
//! - fixed-step RK4 / forward Euler integration of particle cooling
//!
//! # Architecture
//!
//! A model lists the energy terms it supports; the generic balance sums the
//! active ones. Terms a model does not list (oxidation, annealing, thermionic
//! emission in all current closures) contribute zero without any per-model code.

pub mod error;
pub mod integrator;
pub mod kinetics;
pub mod model;
pub mod models;
pub mod simulation;

pub use error::{ModelError, ModelResult};
pub use integrator::{ForwardEuler, Integrator, RK4};
pub use model::{
    EnergyTerm, HeatTransferContext, HeatTransferModel, ModelInfo, ProcessConditions,
    Requirement, SystemFunction, TermGates,
};
pub use models::{Kock, Liu, Mansmann, Melton, Menser, all_models, model_by_name};
pub use simulation::{
    CoolingTrace, IntegratorType, ParticleCooling, ParticleState, SimOptions, SimRecord,
    TransientModel, run_sim, simulate_cooling,
};

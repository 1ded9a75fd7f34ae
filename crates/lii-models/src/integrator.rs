//! Fixed-step integrators for the particle cooling ODE.
//!
//! The state advanced here is the particle `(T, dp)` pair of
//! [`crate::simulation::ParticleCooling`]. Right after the laser pulse the
//! evaporation term dominates and T falls fastest, so the simulation defaults
//! to RK4 with a 1 ns step.

use crate::error::ModelResult;
use crate::simulation::TransientModel;

/// Advances a transient model by one fixed step.
pub trait Integrator {
    fn step<M: TransientModel>(&self, model: &mut M, t: f64, x: &M::State, dt: f64) -> ModelResult<M::State>;
}

/// Classical fourth-order Runge-Kutta, four heat-balance evaluations per step.
#[derive(Clone, Debug)]
pub struct RK4;

/// Stage time offsets `c_i` of the classical tableau (in units of dt).
const RK4_NODES: [f64; 4] = [0.0, 0.5, 0.5, 1.0];
/// Quadrature weights `b_i`.
const RK4_WEIGHTS: [f64; 4] = [1.0 / 6.0, 1.0 / 3.0, 1.0 / 3.0, 1.0 / 6.0];

impl Integrator for RK4 {
    fn step<M: TransientModel>(&self, model: &mut M, t: f64, x: &M::State, dt: f64) -> ModelResult<M::State> {
        // stage i is evaluated at x + c_i dt k_{i-1}
        let mut slope = model.rhs(t, x)?;
        let mut weighted = model.scale(&slope, RK4_WEIGHTS[0]);
        for (node, weight) in RK4_NODES.iter().zip(RK4_WEIGHTS).skip(1) {
            let stage = model.add(x, &model.scale(&slope, node * dt));
            slope = model.rhs(t + node * dt, &stage)?;
            weighted = model.add(&weighted, &model.scale(&slope, weight));
        }
        Ok(model.add(x, &model.scale(&weighted, dt)))
    }
}

/// Explicit Euler. Cheap, but needs a much smaller step while evaporation
/// is active.
#[derive(Clone, Debug)]
pub struct ForwardEuler;

impl Integrator for ForwardEuler {
    fn step<M: TransientModel>(&self, model: &mut M, t: f64, x: &M::State, dt: f64) -> ModelResult<M::State> {
        let slope = model.rhs(t, x)?;
        Ok(model.add(x, &model.scale(&slope, dt)))
    }
}

//! Transient particle cooling simulations.

use tracing::debug;

use crate::error::{ModelError, ModelResult};
use crate::integrator::{ForwardEuler, Integrator, RK4};
use crate::model::{HeatTransferContext, HeatTransferModel};

/// A dynamic system `x' = f(t, x)` with vector-space state arithmetic.
pub trait TransientModel {
    type State: Clone;

    fn initial_state(&self) -> Self::State;

    /// State derivative at `(t, x)`.
    fn rhs(&mut self, t: f64, x: &Self::State) -> ModelResult<Self::State>;

    fn add(&self, a: &Self::State, b: &Self::State) -> Self::State;

    fn scale(&self, a: &Self::State, scale: f64) -> Self::State;
}

/// Integrator selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IntegratorType {
    #[default]
    RK4,
    ForwardEuler,
}

/// Options for simulation runs.
#[derive(Clone, Debug)]
pub struct SimOptions {
    /// Fixed time step [s]
    pub dt: f64,
    /// Final simulation time [s]
    pub t_end: f64,
    /// Safety limit on the number of steps
    pub max_steps: usize,
    /// Record every N-th step
    pub record_every: usize,
    pub integrator: IntegratorType,
}

impl Default for SimOptions {
    fn default() -> Self {
        Self {
            dt: 1e-9,
            t_end: 1e-6,
            max_steps: 100_000,
            record_every: 1,
            integrator: IntegratorType::default(),
        }
    }
}

/// Recorded simulation output.
#[derive(Clone, Debug)]
pub struct SimRecord<S> {
    pub t: Vec<f64>,
    pub x: Vec<S>,
}

/// Integrate `model` from t = 0 with a fixed step.
pub fn run_sim<M: TransientModel>(model: &mut M, opts: &SimOptions) -> ModelResult<SimRecord<M::State>> {
    if !(opts.dt > 0.0) {
        return Err(ModelError::InvalidArg {
            what: "dt must be positive",
        });
    }
    if opts.t_end < 0.0 {
        return Err(ModelError::InvalidArg {
            what: "t_end must be non-negative",
        });
    }
    if opts.max_steps == 0 || opts.record_every == 0 {
        return Err(ModelError::InvalidArg {
            what: "max_steps and record_every must be positive",
        });
    }

    let mut t = 0.0;
    let mut x = model.initial_state();

    let mut t_record = vec![t];
    let mut x_record = vec![x.clone()];

    let mut step = 0;
    // half-step slack keeps accumulated rounding from adding a step
    while t + 0.5 * opts.dt < opts.t_end && step < opts.max_steps {
        x = match opts.integrator {
            IntegratorType::RK4 => RK4.step(model, t, &x, opts.dt)?,
            IntegratorType::ForwardEuler => ForwardEuler.step(model, t, &x, opts.dt)?,
        };
        step += 1;
        t = step as f64 * opts.dt;

        if step % opts.record_every == 0 {
            t_record.push(t);
            x_record.push(x.clone());
        }
    }

    if step % opts.record_every != 0 {
        t_record.push(t);
        x_record.push(x);
    }

    Ok(SimRecord {
        t: t_record,
        x: x_record,
    })
}

/// Particle temperature [K] and diameter [m].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleState {
    pub temperature: f64,
    pub diameter: f64,
}

/// Cooling of a single laser-heated particle under a heat transfer model.
pub struct ParticleCooling<'a> {
    model: &'a dyn HeatTransferModel,
    ctx: HeatTransferContext<'a>,
    initial: ParticleState,
}

impl<'a> ParticleCooling<'a> {
    pub fn new(model: &'a dyn HeatTransferModel, ctx: HeatTransferContext<'a>, initial: ParticleState) -> Self {
        Self { model, ctx, initial }
    }
}

impl TransientModel for ParticleCooling<'_> {
    type State = ParticleState;

    fn initial_state(&self) -> ParticleState {
        self.initial
    }

    fn rhs(&mut self, _t: f64, x: &ParticleState) -> ModelResult<ParticleState> {
        Ok(ParticleState {
            temperature: self.model.derivative_t(&self.ctx, x.temperature, x.diameter)?,
            diameter: self.model.derivative_dp(&self.ctx, x.temperature, x.diameter)?,
        })
    }

    fn add(&self, a: &ParticleState, b: &ParticleState) -> ParticleState {
        ParticleState {
            temperature: a.temperature + b.temperature,
            diameter: a.diameter + b.diameter,
        }
    }

    fn scale(&self, a: &ParticleState, scale: f64) -> ParticleState {
        ParticleState {
            temperature: a.temperature * scale,
            diameter: a.diameter * scale,
        }
    }
}

/// Column-wise cooling curve.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CoolingTrace {
    /// Time after the laser pulse [s]
    pub time: Vec<f64>,
    /// Particle temperature [K]
    pub temperature: Vec<f64>,
    /// Particle diameter [m]
    pub diameter: Vec<f64>,
}

impl CoolingTrace {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

impl From<SimRecord<ParticleState>> for CoolingTrace {
    fn from(record: SimRecord<ParticleState>) -> Self {
        Self {
            temperature: record.x.iter().map(|s| s.temperature).collect(),
            diameter: record.x.iter().map(|s| s.diameter).collect(),
            time: record.t,
        }
    }
}

/// Simulate the cooling of a particle heated to `initial.temperature`.
pub fn simulate_cooling(
    model: &dyn HeatTransferModel,
    ctx: HeatTransferContext<'_>,
    initial: ParticleState,
    opts: &SimOptions,
) -> ModelResult<CoolingTrace> {
    model.check_availability(ctx.material, ctx.gas)?;
    let mut cooling = ParticleCooling::new(model, ctx, initial);
    let record = run_sim(&mut cooling, opts)?;
    debug!(
        model = model.identifier(),
        material = ctx.material.name(),
        gas = ctx.gas.name(),
        samples = record.t.len(),
        "cooling simulation finished"
    );
    Ok(record.into())
}

use crate::error::{DomainError, IntegrationError, Result};
use crate::time_grid::TimeGrid;
use crate::traits::{checked_apply, DynamicalSystem, Steppable};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IntegratorMethod {
    /// Dormand–Prince 4(5) with local error control.
    Dopri5,
    /// Classic fixed-step Runge-Kutta 4, `step` being the largest internal step.
    Rk4 { step: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverSettings {
    pub method: IntegratorMethod,
    pub rtol: f64,
    pub atol: f64,
    /// First trial step; chosen from the span when absent.
    pub initial_step: Option<f64>,
    pub min_step: f64,
    pub max_step: Option<f64>,
    /// Budget of attempted internal steps, rejected ones included.
    pub max_steps: usize,
    /// Undershoot below zero that is clipped instead of reported.
    pub negative_tolerance: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            method: IntegratorMethod::Dopri5,
            rtol: 1e-6,
            atol: 1e-9,
            initial_step: None,
            min_step: 1e-12,
            max_step: None,
            max_steps: 100_000,
            negative_tolerance: 1e-6,
        }
    }
}

impl SolverSettings {
    fn validate(&self) -> Result<(), IntegrationError> {
        if !self.rtol.is_finite() || self.rtol <= 0.0 {
            return Err(IntegrationError::InvalidSettings("rtol must be finite and positive"));
        }
        if !self.atol.is_finite() || self.atol <= 0.0 {
            return Err(IntegrationError::InvalidSettings("atol must be finite and positive"));
        }
        if self.max_steps == 0 {
            return Err(IntegrationError::InvalidSettings("max_steps must be greater than zero"));
        }
        if !(self.min_step > 0.0) {
            return Err(IntegrationError::InvalidSettings("min_step must be positive"));
        }
        if matches!(self.max_step, Some(h) if !(h >= self.min_step)) {
            return Err(IntegrationError::InvalidSettings("max_step must be at least min_step"));
        }
        if !(self.negative_tolerance >= 0.0) {
            return Err(IntegrationError::InvalidSettings("negative_tolerance must be non-negative"));
        }
        if let IntegratorMethod::Rk4 { step } = self.method {
            if !step.is_finite() || step <= 0.0 {
                return Err(IntegrationError::InvalidSettings("rk4 step must be finite and positive"));
            }
        }
        Ok(())
    }

    fn max_step(&self) -> f64 {
        self.max_step.unwrap_or(f64::INFINITY)
    }

    fn first_step(&self, span: f64) -> f64 {
        self.initial_step
            .unwrap_or(span * 1e-3)
            .max(self.min_step)
            .min(self.max_step())
            .min(span)
    }
}

/// States sampled on a time grid, one row per grid point.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    times: Vec<f64>,
    states: Vec<Vec<f64>>,
}

impl Trajectory {
    fn with_capacity(len: usize) -> Self {
        Self {
            times: Vec::with_capacity(len),
            states: Vec::with_capacity(len),
        }
    }

    fn push(&mut self, t: f64, state: &[f64]) {
        self.times.push(t);
        self.states.push(state.to_vec());
    }

    pub fn times(&self) -> &[f64] {
        &self.times
    }

    pub fn states(&self) -> &[Vec<f64>] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    /// Column `index` of the trajectory as a time series.
    pub fn component(&self, index: usize) -> Vec<f64> {
        self.states.iter().map(|state| state[index]).collect()
    }
}

/// Classic Runge-Kutta 4th Order Solver
pub struct Rk4 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    tmp: Vec<f64>,
}

impl Rk4 {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            tmp: vec![0.0; dim],
        }
    }
}

impl Steppable for Rk4 {
    fn step(
        &mut self,
        system: &impl DynamicalSystem,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<(), DomainError> {
        let t0 = *t;

        // k1 = f(t, y)
        checked_apply(system, t0, state, &mut self.k1)?;

        // k2 = f(t + dt/2, y + dt*k1/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + 0.5 * dt * self.k1[i];
        }
        checked_apply(system, t0 + 0.5 * dt, &self.tmp, &mut self.k2)?;

        // k3 = f(t + dt/2, y + dt*k2/2)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + 0.5 * dt * self.k2[i];
        }
        checked_apply(system, t0 + 0.5 * dt, &self.tmp, &mut self.k3)?;

        // k4 = f(t + dt, y + dt*k3)
        for i in 0..state.len() {
            self.tmp[i] = state[i] + dt * self.k3[i];
        }
        checked_apply(system, t0 + dt, &self.tmp, &mut self.k4)?;

        for i in 0..state.len() {
            state[i] += dt / 6.0 * (self.k1[i] + 2.0 * self.k2[i] + 2.0 * self.k3[i] + self.k4[i]);
        }

        *t = t0 + dt;
        Ok(())
    }
}

// Dormand–Prince tableau
const C2: f64 = 1.0 / 5.0;
const C3: f64 = 3.0 / 10.0;
const C4: f64 = 4.0 / 5.0;
const C5: f64 = 8.0 / 9.0;

const A21: f64 = 1.0 / 5.0;
const A31: f64 = 3.0 / 40.0;
const A32: f64 = 9.0 / 40.0;
const A41: f64 = 44.0 / 45.0;
const A42: f64 = -56.0 / 15.0;
const A43: f64 = 32.0 / 9.0;
const A51: f64 = 19372.0 / 6561.0;
const A52: f64 = -25360.0 / 2187.0;
const A53: f64 = 64448.0 / 6561.0;
const A54: f64 = -212.0 / 729.0;
const A61: f64 = 9017.0 / 3168.0;
const A62: f64 = -355.0 / 33.0;
const A63: f64 = 46732.0 / 5247.0;
const A64: f64 = 49.0 / 176.0;
const A65: f64 = -5103.0 / 18656.0;

// 5th-order weights (advancing solution)
const B1: f64 = 35.0 / 384.0;
const B3: f64 = 500.0 / 1113.0;
const B4: f64 = 125.0 / 192.0;
const B5: f64 = -2187.0 / 6784.0;
const B6: f64 = 11.0 / 84.0;

// 5th minus embedded 4th-order weights
const E1: f64 = 71.0 / 57600.0;
const E3: f64 = -71.0 / 16695.0;
const E4: f64 = 71.0 / 1920.0;
const E5: f64 = -17253.0 / 339200.0;
const E6: f64 = 22.0 / 525.0;
const E7: f64 = -1.0 / 40.0;

/// Dormand–Prince 4(5) stepper with first-same-as-last reuse of `k7`.
pub struct Dopri5 {
    k1: Vec<f64>,
    k2: Vec<f64>,
    k3: Vec<f64>,
    k4: Vec<f64>,
    k5: Vec<f64>,
    k6: Vec<f64>,
    k7: Vec<f64>,
    tmp: Vec<f64>,
    candidate: Vec<f64>,
}

impl Dopri5 {
    pub fn new(dim: usize) -> Self {
        Self {
            k1: vec![0.0; dim],
            k2: vec![0.0; dim],
            k3: vec![0.0; dim],
            k4: vec![0.0; dim],
            k5: vec![0.0; dim],
            k6: vec![0.0; dim],
            k7: vec![0.0; dim],
            tmp: vec![0.0; dim],
            candidate: vec![0.0; dim],
        }
    }

    /// Evaluates `k1 = f(t, state)`; needed before the first attempt and after any
    /// external change to the state.
    fn prime(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        state: &[f64],
    ) -> Result<(), DomainError> {
        checked_apply(system, t, state, &mut self.k1)
    }

    /// Computes a candidate step of size `h` and returns its scaled RMS error.
    fn attempt(
        &mut self,
        system: &impl DynamicalSystem,
        t: f64,
        y: &[f64],
        h: f64,
        settings: &SolverSettings,
    ) -> Result<f64, DomainError> {
        let n = y.len();

        for i in 0..n {
            self.tmp[i] = y[i] + h * A21 * self.k1[i];
        }
        checked_apply(system, t + C2 * h, &self.tmp, &mut self.k2)?;

        for i in 0..n {
            self.tmp[i] = y[i] + h * (A31 * self.k1[i] + A32 * self.k2[i]);
        }
        checked_apply(system, t + C3 * h, &self.tmp, &mut self.k3)?;

        for i in 0..n {
            self.tmp[i] = y[i] + h * (A41 * self.k1[i] + A42 * self.k2[i] + A43 * self.k3[i]);
        }
        checked_apply(system, t + C4 * h, &self.tmp, &mut self.k4)?;

        for i in 0..n {
            self.tmp[i] = y[i]
                + h * (A51 * self.k1[i] + A52 * self.k2[i] + A53 * self.k3[i] + A54 * self.k4[i]);
        }
        checked_apply(system, t + C5 * h, &self.tmp, &mut self.k5)?;

        for i in 0..n {
            self.tmp[i] = y[i]
                + h * (A61 * self.k1[i]
                    + A62 * self.k2[i]
                    + A63 * self.k3[i]
                    + A64 * self.k4[i]
                    + A65 * self.k5[i]);
        }
        checked_apply(system, t + h, &self.tmp, &mut self.k6)?;

        for i in 0..n {
            self.candidate[i] = y[i]
                + h * (B1 * self.k1[i]
                    + B3 * self.k3[i]
                    + B4 * self.k4[i]
                    + B5 * self.k5[i]
                    + B6 * self.k6[i]);
        }
        checked_apply(system, t + h, &self.candidate, &mut self.k7)?;

        let mut sum = 0.0;
        for i in 0..n {
            let err = h
                * (E1 * self.k1[i]
                    + E3 * self.k3[i]
                    + E4 * self.k4[i]
                    + E5 * self.k5[i]
                    + E6 * self.k6[i]
                    + E7 * self.k7[i]);
            let scale = settings.atol + settings.rtol * y[i].abs().max(self.candidate[i].abs());
            sum += (err / scale) * (err / scale);
        }
        Ok((sum / n as f64).sqrt())
    }

    /// Moves the last candidate into `state` and recycles `k7` as the next `k1`.
    fn accept(&mut self, state: &mut [f64]) {
        state.copy_from_slice(&self.candidate);
        std::mem::swap(&mut self.k1, &mut self.k7);
    }
}

fn step_factor(err_norm: f64) -> f64 {
    if err_norm == 0.0 {
        5.0
    } else if !err_norm.is_finite() {
        0.2
    } else {
        (0.9 * err_norm.powf(-0.2)).clamp(0.2, 5.0)
    }
}

/// Clips benign negative undershoot in non-negative components to zero.
///
/// Returns whether anything was clipped. Values below `-tolerance` are a
/// domain failure.
pub fn enforce_domain(
    system: &impl DynamicalSystem,
    t: f64,
    state: &mut [f64],
    tolerance: f64,
) -> Result<bool, DomainError> {
    let mut clipped = false;
    for (index, value) in state.iter_mut().enumerate() {
        if !value.is_finite() {
            return Err(DomainError::NonFiniteState {
                index,
                value: *value,
                t,
            });
        }
        if *value < 0.0 && system.is_non_negative(index) {
            if *value < -tolerance {
                return Err(DomainError::NegativePopulation {
                    index,
                    value: *value,
                    t,
                });
            }
            warn!("clipping component {index} undershoot {value:e} to zero at t = {t}");
            *value = 0.0;
            clipped = true;
        }
    }
    Ok(clipped)
}

/// Integrates `system` from `initial_state` over the span of `grid`, sampling
/// the state at every grid point.
///
/// Internal steps are independent of the grid; they are only shortened so a
/// step ends exactly on the next sampling time.
pub fn integrate(
    system: &impl DynamicalSystem,
    initial_state: &[f64],
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<Trajectory> {
    settings.validate()?;
    let dim = system.dimension();
    if initial_state.len() != dim {
        return Err(DomainError::DimensionMismatch {
            expected: dim,
            actual: initial_state.len(),
        }
        .into());
    }

    let mut state = initial_state.to_vec();
    enforce_domain(system, grid.start(), &mut state, settings.negative_tolerance)?;

    debug!(
        "integrating {dim}-dimensional system over [{}, {}] with {} samples ({:?})",
        grid.start(),
        grid.end(),
        grid.len(),
        settings.method
    );

    match settings.method {
        IntegratorMethod::Dopri5 => integrate_adaptive(system, state, grid, settings),
        IntegratorMethod::Rk4 { step } => integrate_fixed(system, state, grid, settings, step),
    }
}

fn integrate_adaptive(
    system: &impl DynamicalSystem,
    mut state: Vec<f64>,
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<Trajectory> {
    let mut stepper = Dopri5::new(state.len());
    let mut trajectory = Trajectory::with_capacity(grid.len());
    let max_step = settings.max_step();

    let mut t = grid.start();
    let mut h = settings.first_step(grid.end() - grid.start());
    let mut accepted = 0usize;
    let mut rejected = 0usize;

    trajectory.push(t, &state);
    stepper.prime(system, t, &state)?;

    for &target in &grid.points()[1..] {
        while t < target {
            if accepted + rejected >= settings.max_steps {
                return Err(IntegrationError::StepBudgetExhausted {
                    max_steps: settings.max_steps,
                    last_t: t,
                    target: grid.end(),
                }
                .into());
            }

            let remaining = target - t;
            let lands = h >= remaining;
            let h_try = if lands { remaining } else { h };
            // A trial that leaves the finite domain is a rejected step, not a failure.
            let err_norm = match stepper.attempt(system, t, &state, h_try, settings) {
                Ok(norm) => norm,
                Err(
                    err @ (DomainError::NonFiniteDerivative { .. }
                    | DomainError::NonFiniteState { .. }),
                ) => {
                    trace!("trial step h = {h_try:e} at t = {t} is not finite: {err}");
                    f64::INFINITY
                }
                Err(err) => return Err(err.into()),
            };
            let ok = err_norm <= 1.0;

            if ok {
                t = if lands { target } else { t + h_try };
                stepper.accept(&mut state);
                if enforce_domain(system, t, &mut state, settings.negative_tolerance)? {
                    stepper.prime(system, t, &state)?;
                }
                accepted += 1;
            } else {
                rejected += 1;
                trace!("rejected step h = {h_try:e} at t = {t} (error {err_norm:.3})");
            }

            let h_next = (h_try * step_factor(err_norm)).min(max_step);
            // A step shortened to land on the grid says nothing about the usable step size.
            h = if ok && lands { h_next.max(h) } else { h_next };
            if h < settings.min_step {
                return Err(IntegrationError::StepSizeUnderflow { step: h, last_t: t }.into());
            }
        }
        trajectory.push(t, &state);
    }

    debug!("dopri5 finished: {accepted} accepted, {rejected} rejected steps");
    Ok(trajectory)
}

fn integrate_fixed(
    system: &impl DynamicalSystem,
    mut state: Vec<f64>,
    grid: &TimeGrid,
    settings: &SolverSettings,
    max_dt: f64,
) -> Result<Trajectory> {
    let mut stepper = Rk4::new(state.len());
    let mut trajectory = Trajectory::with_capacity(grid.len());
    let mut t = grid.start();
    let mut steps = 0usize;

    trajectory.push(t, &state);
    for &target in &grid.points()[1..] {
        let substeps = ((target - t) / max_dt).ceil().max(1.0) as usize;
        let dt = (target - t) / substeps as f64;
        for _ in 0..substeps {
            if steps >= settings.max_steps {
                return Err(IntegrationError::StepBudgetExhausted {
                    max_steps: settings.max_steps,
                    last_t: t,
                    target: grid.end(),
                }
                .into());
            }
            stepper.step(system, &mut t, &mut state, dt)?;
            enforce_domain(system, t, &mut state, settings.negative_tolerance)?;
            steps += 1;
        }
        t = target;
        trajectory.push(t, &state);
    }

    debug!("rk4 finished: {steps} steps");
    Ok(trajectory)
}

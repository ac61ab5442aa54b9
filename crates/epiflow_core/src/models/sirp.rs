//! SIR with perceived risk driving compliance.
//!
//! Perceived risk `P` grows with incidence and decays at rate `delta`.
//! Compliance `compliance_max·(1 − e^{−k·P})` scales transmission down to
//! `beta_eff = beta_0·(1 − compliance)`, closing a negative feedback loop.

use super::{run, seeded_population, EpidemicModel};
use crate::behavior::{basic_reproduction_number, compliance, effective_beta, incidence};
use crate::derived::DerivedQuantities;
use crate::error::{DomainError, ParameterError, Result};
use crate::parameters::{non_negative, positive, unit_interval, ParameterSet};
use crate::registry::{ModelSpec, PresentationProfile};
use crate::result::{Meta, SimulationResult};
use crate::solvers::{SolverSettings, Trajectory};
use crate::time_grid::TimeGrid;
use crate::traits::DynamicalSystem;

pub const ID: &str = "sirp";
pub const PARAMETERS: &[&str] = &[
    "I0",
    "N",
    "beta_0",
    "gamma",
    "alpha",
    "delta",
    "compliance_max",
    "k",
];
pub const LABELS: &[&str] = &["Susceptible", "Infected", "Recovered", "Perceived Risk"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sirp {
    pub n: f64,
    pub i0: f64,
    pub beta_0: f64,
    pub gamma: f64,
    /// Perception growth per new infection.
    pub alpha: f64,
    /// Perception decay rate.
    pub delta: f64,
    pub compliance_max: f64,
    /// Compliance sensitivity to perceived risk.
    pub k: f64,
}

impl Sirp {
    fn compliance(&self, p: f64) -> f64 {
        compliance(self.compliance_max, self.k, p)
    }
}

impl DynamicalSystem for Sirp {
    fn dimension(&self) -> usize {
        4
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) -> Result<(), DomainError> {
        let (s, i, p) = (x[0], x[1], x[3]);
        let beta_eff = effective_beta(self.beta_0, self.compliance(p));
        let new_infections = incidence(beta_eff, s, i, self.n);
        out[0] = -new_infections;
        out[1] = new_infections - self.gamma * i;
        out[2] = self.gamma * i;
        out[3] = self.alpha * new_infections - self.delta * p;
        Ok(())
    }
}

impl EpidemicModel for Sirp {
    const LABELS: &'static [&'static str] = LABELS;

    fn from_parameters(params: &ParameterSet) -> Result<Self, ParameterError> {
        let (n, i0) = seeded_population(params)?;
        Ok(Self {
            n,
            i0,
            beta_0: non_negative(params, "beta_0")?,
            gamma: positive(params, "gamma")?,
            alpha: non_negative(params, "alpha")?,
            delta: non_negative(params, "delta")?,
            compliance_max: unit_interval(params, "compliance_max")?,
            k: non_negative(params, "k")?,
        })
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![self.n - self.i0, self.i0, 0.0, 0.0]
    }

    fn derived_quantities(&self, trajectory: &Trajectory) -> Meta {
        let s = trajectory.component(0);
        let i = trajectory.component(1);
        let compliance: Vec<f64> = trajectory
            .component(3)
            .into_iter()
            .map(|p| self.compliance(p))
            .collect();
        let beta_eff: Vec<f64> = compliance
            .iter()
            .map(|&c| effective_beta(self.beta_0, c))
            .collect();
        DerivedQuantities::new()
            .scalar("beta_0", self.beta_0)
            .scalar("R0", basic_reproduction_number(self.beta_0, self.gamma))
            .transmission(&beta_eff, &s, &i, self.n, self.gamma)
            .series("compliance", compliance)
            .series("beta_eff", beta_eff)
            .finish()
    }
}

pub fn defaults() -> ParameterSet {
    ParameterSet::from_pairs([
        ("I0", 10.0),
        ("N", 10_000.0),
        ("beta_0", 0.3),
        ("gamma", 1.0 / 6.5),
        ("alpha", 1e-3),
        ("delta", 0.05),
        ("compliance_max", 0.75),
        ("k", 1.0),
    ])
}

pub fn simulate(
    params: &ParameterSet,
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<SimulationResult> {
    run::<Sirp>(params, grid, settings)
}

pub fn spec() -> ModelSpec {
    ModelSpec::new(ID, simulate, PARAMETERS, LABELS, PresentationProfile::SirpDashboard)
        .with_defaults(defaults)
}

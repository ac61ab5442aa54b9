//! Compartmental model variants.
//!
//! Each variant binds its parameters into a [`DynamicalSystem`], lists its
//! displayed compartments first in the state vector (hidden feedback
//! dimensions trail them), and recomputes its derived quantities from the
//! sampled trajectory.

pub mod sir;
pub mod sirc_pf;
pub mod sirp;

use crate::error::{DomainError, ParameterError, Result};
use crate::parameters::ParameterSet;
use crate::result::{Meta, SimulationResult};
use crate::solvers::{integrate, SolverSettings, Trajectory};
use crate::time_grid::TimeGrid;
use crate::traits::{checked_apply, DynamicalSystem};

pub(crate) trait EpidemicModel: DynamicalSystem + Sized {
    /// Display names of the leading state components.
    const LABELS: &'static [&'static str];

    fn from_parameters(params: &ParameterSet) -> Result<Self, ParameterError>;

    fn initial_state(&self) -> Vec<f64>;

    fn derived_quantities(&self, trajectory: &Trajectory) -> Meta;
}

/// Builds the model from `params`, integrates it on `grid` and packages the result.
pub(crate) fn run<M: EpidemicModel>(
    params: &ParameterSet,
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<SimulationResult> {
    let model = M::from_parameters(params)?;
    let trajectory = integrate(&model, &model.initial_state(), grid, settings)?;
    let meta = model.derived_quantities(&trajectory);
    Ok(SimulationResult::package(M::LABELS, &trajectory, meta))
}

/// Evaluates `system` at `(t, state)` into a fresh vector.
pub fn derivative(
    system: &impl DynamicalSystem,
    t: f64,
    state: &[f64],
) -> Result<Vec<f64>, DomainError> {
    let mut out = vec![0.0; system.dimension()];
    checked_apply(system, t, state, &mut out)?;
    Ok(out)
}

/// Reads `I0` and `N` and checks the seed fits in the population.
fn seeded_population(params: &ParameterSet) -> Result<(f64, f64), ParameterError> {
    let n = params.get("N")?;
    let i0 = params.get("I0")?;
    if n < 0.0 {
        return Err(ParameterError::NegativePopulation {
            name: "N".to_string(),
            value: n,
        });
    }
    if i0 < 0.0 {
        return Err(ParameterError::NegativePopulation {
            name: "I0".to_string(),
            value: i0,
        });
    }
    if i0 > n {
        return Err(ParameterError::out_of_range("I0", i0, "must not exceed N"));
    }
    Ok((n, i0))
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::result::SimulationResult;

    pub(crate) fn series<'a>(result: &'a SimulationResult, label: &str) -> &'a [f64] {
        result
            .compartment(label)
            .or_else(|| result.meta_series(label))
            .unwrap_or_else(|| panic!("missing series {label}"))
    }

    pub(crate) fn peak(values: &[f64]) -> f64 {
        values.iter().copied().fold(f64::MIN, f64::max)
    }
}

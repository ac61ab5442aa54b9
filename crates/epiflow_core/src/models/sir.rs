//! Plain SIR model without behavioral feedback.

use super::{run, seeded_population, EpidemicModel};
use crate::behavior::{basic_reproduction_number, incidence};
use crate::derived::DerivedQuantities;
use crate::error::{DomainError, ParameterError, Result};
use crate::parameters::{non_negative, positive, ParameterSet};
use crate::registry::{ModelSpec, PresentationProfile};
use crate::result::{Meta, SimulationResult};
use crate::solvers::{SolverSettings, Trajectory};
use crate::time_grid::TimeGrid;
use crate::traits::DynamicalSystem;

pub const ID: &str = "sir";
pub const PARAMETERS: &[&str] = &["I0", "N", "beta", "gamma"];
pub const LABELS: &[&str] = &["Susceptible", "Infected", "Recovered"];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sir {
    pub n: f64,
    pub i0: f64,
    pub beta: f64,
    pub gamma: f64,
}

impl DynamicalSystem for Sir {
    fn dimension(&self) -> usize {
        3
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) -> Result<(), DomainError> {
        let (s, i) = (x[0], x[1]);
        let new_infections = incidence(self.beta, s, i, self.n);
        out[0] = -new_infections;
        out[1] = new_infections - self.gamma * i;
        out[2] = self.gamma * i;
        Ok(())
    }
}

impl EpidemicModel for Sir {
    const LABELS: &'static [&'static str] = LABELS;

    fn from_parameters(params: &ParameterSet) -> Result<Self, ParameterError> {
        let (n, i0) = seeded_population(params)?;
        Ok(Self {
            n,
            i0,
            beta: non_negative(params, "beta")?,
            gamma: positive(params, "gamma")?,
        })
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![self.n - self.i0, self.i0, 0.0]
    }

    fn derived_quantities(&self, trajectory: &Trajectory) -> Meta {
        let s = trajectory.component(0);
        let i = trajectory.component(1);
        let beta_eff = vec![self.beta; trajectory.len()];
        DerivedQuantities::new()
            .scalar("beta_0", self.beta)
            .scalar("R0", basic_reproduction_number(self.beta, self.gamma))
            .transmission(&beta_eff, &s, &i, self.n, self.gamma)
            .series("beta_eff", beta_eff)
            .finish()
    }
}

pub fn defaults() -> ParameterSet {
    ParameterSet::from_pairs([
        ("I0", 10.0),
        ("N", 10_000.0),
        ("beta", 0.3),
        ("gamma", 1.0 / 6.5),
    ])
}

pub fn simulate(
    params: &ParameterSet,
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<SimulationResult> {
    run::<Sir>(params, grid, settings)
}

pub fn spec() -> ModelSpec {
    ModelSpec::new(ID, simulate, PARAMETERS, LABELS, PresentationProfile::Default)
        .with_defaults(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SimulationError;
    use crate::models::test_support::{peak, series};

    fn scenario() -> SimulationResult {
        let grid = TimeGrid::linspace(0.0, 160.0, 161).unwrap();
        simulate(&defaults(), &grid, &SolverSettings::default()).expect("sir should integrate")
    }

    #[test]
    fn scenario_has_single_peak_and_monotone_s_r() {
        let result = scenario();
        assert_eq!(result.time_grid().len(), 161);
        assert_eq!(result.labels().collect::<Vec<_>>(), LABELS);

        let s = series(&result, "Susceptible");
        let i = series(&result, "Infected");
        let r = series(&result, "Recovered");

        assert!(s.windows(2).all(|w| w[1] <= w[0]), "S must not increase");
        assert!(r.windows(2).all(|w| w[1] >= w[0]), "R must not decrease");

        let peak_index = i
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(idx, _)| idx)
            .unwrap();
        assert!(peak_index > 0 && peak_index < 160);
        assert!(i[..=peak_index].windows(2).all(|w| w[1] >= w[0]));
        assert!(i[peak_index..].windows(2).all(|w| w[1] <= w[0]));
        assert!(i[160] < 0.01 * i[peak_index], "epidemic should be over by day 160");
    }

    #[test]
    fn conserves_population() {
        let result = scenario();
        let s = series(&result, "Susceptible");
        let i = series(&result, "Infected");
        let r = series(&result, "Recovered");
        for k in 0..s.len() {
            assert!((s[k] + i[k] + r[k] - 10_000.0).abs() < 1e-6 * 10_000.0);
        }
    }

    #[test]
    fn no_infection_without_seed() {
        let grid = TimeGrid::linspace(0.0, 50.0, 51).unwrap();
        let params = defaults().with("I0", 0.0);
        let result = simulate(&params, &grid, &SolverSettings::default()).unwrap();
        assert!(series(&result, "Infected").iter().all(|&v| v == 0.0));
        assert!(series(&result, "Susceptible").iter().all(|&v| v == 10_000.0));
        assert!(series(&result, "Recovered").iter().all(|&v| v == 0.0));
    }

    #[test]
    fn meta_reports_reproduction_numbers() {
        let result = scenario();
        let r0 = result.meta_scalar("R0").unwrap();
        assert!((r0 - 0.3 * 6.5).abs() < 1e-12);
        assert_eq!(result.meta_scalar("beta_0"), Some(0.3));
        assert!(result.meta().get("compliance").is_none());
        assert!(result.is_aligned());

        let r_eff = series(&result, "R_eff");
        assert!((r_eff[0] - r0 * 9_990.0 / 10_000.0).abs() < 1e-12);
        let phases = result.phases().unwrap();
        assert_eq!(phases.len(), 161);
        assert_eq!(phases[0], crate::result::EpidemicPhase::Growth);
        assert_eq!(phases[160], crate::result::EpidemicPhase::Decline);
        assert!(peak(series(&result, "incidence")) > 0.0);
    }

    #[test]
    fn empty_population_is_a_domain_error() {
        let grid = TimeGrid::linspace(0.0, 10.0, 11).unwrap();
        let params = defaults().with("N", 0.0).with("I0", 0.0);
        assert!(matches!(
            simulate(&params, &grid, &SolverSettings::default()),
            Err(SimulationError::Domain(_))
        ));
    }

    #[test]
    fn rejects_seed_larger_than_population() {
        let grid = TimeGrid::linspace(0.0, 10.0, 11).unwrap();
        let params = defaults().with("I0", 20_000.0);
        let err = simulate(&params, &grid, &SolverSettings::default()).unwrap_err();
        assert!(err.to_string().contains("'I0'"));
    }

    #[test]
    fn derivative_matches_closed_form() {
        let model = Sir {
            n: 100.0,
            i0: 1.0,
            beta: 0.5,
            gamma: 0.25,
        };
        let dx = crate::models::derivative(&model, 0.0, &[90.0, 10.0, 0.0]).unwrap();
        assert!((dx[0] + 4.5).abs() < 1e-12);
        assert!((dx[1] - 2.0).abs() < 1e-12);
        assert!((dx[2] - 2.5).abs() < 1e-12);
    }
}

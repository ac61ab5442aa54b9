//! SIR with perception-driven compliance, delayed case reporting and
//! compliance fatigue.
//!
//! State order is `S, I, C, R, P, F`. `C` (reported cases) lags `I` through a
//! first-order reporting channel with mean delay `1/rho`. `F` is hidden: it
//! builds up while people comply and lowers the compliance ceiling to
//! `compliance_max·(1 − phi·F)`.

use super::{run, seeded_population, EpidemicModel};
use crate::behavior::{
    basic_reproduction_number, compliance, effective_beta, fatigued_ceiling, incidence,
};
use crate::derived::DerivedQuantities;
use crate::error::{DomainError, ParameterError, Result};
use crate::parameters::{non_negative, positive, unit_interval, ParameterSet};
use crate::registry::{ModelSpec, PresentationProfile};
use crate::result::{Meta, SimulationResult};
use crate::solvers::{SolverSettings, Trajectory};
use crate::time_grid::TimeGrid;
use crate::traits::DynamicalSystem;

pub const ID: &str = "sirc_pf";
pub const PARAMETERS: &[&str] = &[
    "I0",
    "N",
    "beta_0",
    "gamma",
    "alpha",
    "delta",
    "compliance_max",
    "k",
    "rho",
    "gamma_F",
    "epsilon",
    "phi",
];
pub const LABELS: &[&str] = &[
    "Susceptible",
    "Infected",
    "Reported Cases",
    "Recovered",
    "Perceived Risk",
];

const S: usize = 0;
const I: usize = 1;
const C: usize = 2;
const R: usize = 3;
const P: usize = 4;
const F: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SircPf {
    pub n: f64,
    pub i0: f64,
    pub beta_0: f64,
    pub gamma: f64,
    pub alpha: f64,
    pub delta: f64,
    pub compliance_max: f64,
    pub k: f64,
    /// Reporting rate; `1/rho` is the mean reporting delay.
    pub rho: f64,
    /// Fatigue recovery rate.
    pub gamma_f: f64,
    /// Fatigue build-up per unit of compliance.
    pub epsilon: f64,
    /// Share of the compliance ceiling fatigue can erode.
    pub phi: f64,
}

impl SircPf {
    fn ceiling(&self, f: f64) -> f64 {
        fatigued_ceiling(self.compliance_max, self.phi, f)
    }
}

impl DynamicalSystem for SircPf {
    fn dimension(&self) -> usize {
        6
    }

    fn apply(&self, _t: f64, x: &[f64], out: &mut [f64]) -> Result<(), DomainError> {
        let (s, i, c, p, f) = (x[S], x[I], x[C], x[P], x[F]);
        let compliance = compliance(self.ceiling(f), self.k, p);
        let beta_eff = effective_beta(self.beta_0, compliance);
        let new_infections = incidence(beta_eff, s, i, self.n);

        out[S] = -new_infections;
        out[I] = new_infections - self.gamma * i;
        out[C] = self.rho * (i - c);
        out[R] = self.gamma * i;
        out[P] = self.alpha * new_infections - self.delta * p;
        out[F] = self.epsilon * compliance * (1.0 - f) - self.gamma_f * f;
        Ok(())
    }
}

impl EpidemicModel for SircPf {
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
            rho: positive(params, "rho")?,
            gamma_f: non_negative(params, "gamma_F")?,
            epsilon: non_negative(params, "epsilon")?,
            phi: unit_interval(params, "phi")?,
        })
    }

    fn initial_state(&self) -> Vec<f64> {
        vec![self.n - self.i0, self.i0, 0.0, 0.0, 0.0, 0.0]
    }

    fn derived_quantities(&self, trajectory: &Trajectory) -> Meta {
        let s = trajectory.component(S);
        let i = trajectory.component(I);
        let p = trajectory.component(P);
        let fatigue = trajectory.component(F);

        let ceiling: Vec<f64> = fatigue.iter().map(|&f| self.ceiling(f)).collect();
        let compliance: Vec<f64> = ceiling
            .iter()
            .zip(&p)
            .map(|(&cap, &p)| compliance(cap, self.k, p))
            .collect();
        let beta_eff: Vec<f64> = compliance
            .iter()
            .map(|&c| effective_beta(self.beta_0, c))
            .collect();

        DerivedQuantities::new()
            .scalar("beta_0", self.beta_0)
            .scalar("R0", basic_reproduction_number(self.beta_0, self.gamma))
            .scalar("rho", self.rho)
            .transmission(&beta_eff, &s, &i, self.n, self.gamma)
            .series("compliance", compliance)
            .series("compliance_ceiling", ceiling)
            .series("fatigue", fatigue)
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
        ("rho", 1.0 / 7.0),
        ("gamma_F", 0.02),
        ("epsilon", 0.05),
        ("phi", 0.5),
    ])
}

pub fn simulate(
    params: &ParameterSet,
    grid: &TimeGrid,
    settings: &SolverSettings,
) -> Result<SimulationResult> {
    run::<SircPf>(params, grid, settings)
}

pub fn spec() -> ModelSpec {
    ModelSpec::new(ID, simulate, PARAMETERS, LABELS, PresentationProfile::SircpDashboard)
        .with_defaults(defaults)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sirp;
    use crate::models::test_support::{peak, series};

    fn grid() -> TimeGrid {
        TimeGrid::linspace(0.0, 365.0, 731).unwrap()
    }

    fn run_with(params: &ParameterSet) -> SimulationResult {
        simulate(params, &grid(), &SolverSettings::default()).expect("sirc-pf should integrate")
    }

    #[test]
    fn compartments_follow_dashboard_order() {
        let result = run_with(&defaults());
        assert_eq!(result.labels().collect::<Vec<_>>(), LABELS);
        assert_eq!(result.meta_scalar("rho"), Some(1.0 / 7.0));
        assert!(result.is_aligned());
        assert_eq!(series(&result, "fatigue").len(), 731);
    }

    #[test]
    fn side_channels_do_not_break_conservation() {
        let result = run_with(&defaults());
        let s = series(&result, "Susceptible");
        let i = series(&result, "Infected");
        let r = series(&result, "Recovered");
        for k in 0..s.len() {
            assert!((s[k] + i[k] + r[k] - 10_000.0).abs() < 1e-2);
        }
    }

    #[test]
    fn reported_cases_lag_infections() {
        let result = run_with(&defaults());
        let i = series(&result, "Infected");
        let c = series(&result, "Reported Cases");
        let argmax = |v: &[f64]| {
            v.iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(idx, _)| idx)
                .unwrap()
        };
        assert!(argmax(c) > argmax(i));
        assert!(peak(c) <= peak(i));
    }

    #[test]
    fn fatigue_stays_bounded_and_erodes_ceiling() {
        let result = run_with(&defaults());
        let fatigue = series(&result, "fatigue");
        let ceiling = series(&result, "compliance_ceiling");
        let compliance = series(&result, "compliance");
        assert!(fatigue.iter().all(|&f| (0.0..=1.0).contains(&f)));
        assert!(peak(fatigue) > 0.0);
        for ((&f, &cap), &c) in fatigue.iter().zip(ceiling).zip(compliance) {
            assert!((cap - 0.75 * (1.0 - 0.5 * f)).abs() < 1e-12);
            assert!(c <= cap);
        }
    }

    #[test]
    fn without_fatigue_matches_sirp_core() {
        let params = defaults().with("epsilon", 0.0);
        let result = run_with(&params);
        assert!(series(&result, "fatigue").iter().all(|&f| f == 0.0));

        let sirp_params = ParameterSet::from_pairs(
            sirp::PARAMETERS
                .iter()
                .map(|&name| (name, params.get(name).unwrap())),
        );
        let reference = sirp::simulate(&sirp_params, &grid(), &SolverSettings::default()).unwrap();
        for label in ["Susceptible", "Infected", "Recovered", "Perceived Risk"] {
            for (a, b) in series(&result, label).iter().zip(series(&reference, label)) {
                assert!((a - b).abs() < 1e-3 * (1.0 + b.abs()), "{label}: {a} vs {b}");
            }
        }
    }

    #[test]
    fn beta_eff_is_consistent_with_compliance() {
        let result = run_with(&defaults());
        let beta_0 = result.meta_scalar("beta_0").unwrap();
        for (c, b) in series(&result, "compliance")
            .iter()
            .zip(series(&result, "beta_eff"))
        {
            assert!((beta_0 * (1.0 - c) - b).abs() < 1e-12);
        }
    }

    #[test]
    fn no_infection_without_seed() {
        let result = run_with(&defaults().with("I0", 0.0));
        assert!(series(&result, "Susceptible").iter().all(|&v| v == 10_000.0));
        for label in ["Infected", "Reported Cases", "Recovered", "Perceived Risk", "fatigue"] {
            assert!(series(&result, label).iter().all(|&v| v == 0.0), "{label}");
        }
    }

    #[test]
    fn sharp_compliance_switch_still_integrates() {
        let params = defaults()
            .with("k", 1e4)
            .with("alpha", 1.0)
            .with("epsilon", 5.0)
            .with("phi", 1.0);
        let result = simulate(
            &params,
            &TimeGrid::linspace(0.0, 365.0, 366).unwrap(),
            &SolverSettings::default(),
        )
        .expect("steep compliance should shrink steps, not abort");
        assert!(result.is_aligned());

        let s = series(&result, "Susceptible");
        let i = series(&result, "Infected");
        let r = series(&result, "Recovered");
        for k in 0..s.len() {
            assert!((s[k] + i[k] + r[k] - 10_000.0).abs() < 1e-2);
        }
        assert!(peak(i) > 10.0 && peak(i) < 10_000.0);
        assert!(series(&result, "compliance")
            .iter()
            .all(|&c| (0.0..=0.75).contains(&c)));
    }

    #[test]
    fn rejects_zero_reporting_rate() {
        let err = simulate(&defaults().with("rho", 0.0), &grid(), &SolverSettings::default())
            .unwrap_err();
        assert!(err.to_string().contains("'rho'"));
    }
}

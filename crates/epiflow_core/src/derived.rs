//! Post-processing of integrated trajectories into derived meta series.
//!
//! Everything here is recomputed from the sampled states. Values seen by the
//! solver at off-grid stage points are never reused.

use crate::behavior::{effective_reproduction_number, incidence};
use crate::result::{EpidemicPhase, Meta, MetaValue};

#[derive(Debug, Default)]
pub(crate) struct DerivedQuantities {
    meta: Meta,
}

impl DerivedQuantities {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn scalar(mut self, name: &str, value: f64) -> Self {
        self.meta.insert(name.to_string(), MetaValue::Scalar(value));
        self
    }

    pub(crate) fn series(mut self, name: &str, values: Vec<f64>) -> Self {
        self.meta.insert(name.to_string(), MetaValue::Series(values));
        self
    }

    /// Adds `incidence`, `R_eff` and the per-sample `state` phase.
    pub(crate) fn transmission(
        mut self,
        beta_eff: &[f64],
        s: &[f64],
        i: &[f64],
        n: f64,
        gamma: f64,
    ) -> Self {
        let new_infections = beta_eff
            .iter()
            .zip(s.iter().zip(i))
            .map(|(&beta, (&s, &i))| incidence(beta, s, i, n))
            .collect();
        let r_eff: Vec<f64> = beta_eff
            .iter()
            .zip(s)
            .map(|(&beta, &s)| effective_reproduction_number(beta, s, n, gamma))
            .collect();
        let phases = r_eff
            .iter()
            .map(|&r| EpidemicPhase::from_reproduction_number(r))
            .collect();

        self.meta
            .insert("incidence".to_string(), MetaValue::Series(new_infections));
        self.meta.insert("R_eff".to_string(), MetaValue::Series(r_eff));
        self.meta.insert("state".to_string(), MetaValue::Phases(phases));
        self
    }

    pub(crate) fn finish(self) -> Meta {
        self.meta
    }
}

use crate::solvers::Trajectory;
use serde::Serialize;
use std::collections::BTreeMap;

/// Per-sample epidemic phase, read from the effective reproduction number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EpidemicPhase {
    Growth,
    Decline,
}

impl EpidemicPhase {
    pub fn from_reproduction_number(r_eff: f64) -> Self {
        if r_eff > 1.0 {
            EpidemicPhase::Growth
        } else {
            EpidemicPhase::Decline
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetaValue {
    Scalar(f64),
    Series(Vec<f64>),
    Phases(Vec<EpidemicPhase>),
}

impl MetaValue {
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            MetaValue::Scalar(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_series(&self) -> Option<&[f64]> {
        match self {
            MetaValue::Series(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_phases(&self) -> Option<&[EpidemicPhase]> {
        match self {
            MetaValue::Phases(values) => Some(values),
            _ => None,
        }
    }

    /// Length of a time-indexed value; `None` for scalars.
    fn series_len(&self) -> Option<usize> {
        match self {
            MetaValue::Scalar(_) => None,
            MetaValue::Series(values) => Some(values.len()),
            MetaValue::Phases(values) => Some(values.len()),
        }
    }
}

pub type Meta = BTreeMap<String, MetaValue>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compartment {
    pub label: String,
    pub values: Vec<f64>,
}

/// Output of one simulate call. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationResult {
    time_grid: Vec<f64>,
    compartments: Vec<Compartment>,
    meta: Meta,
}

impl SimulationResult {
    /// Packages the first `labels.len()` state components as labelled
    /// compartments; trailing hidden feedback dimensions are left out.
    pub(crate) fn package(labels: &[&str], trajectory: &Trajectory, meta: Meta) -> Self {
        let compartments = labels
            .iter()
            .enumerate()
            .map(|(index, label)| Compartment {
                label: label.to_string(),
                values: trajectory.component(index),
            })
            .collect();
        let result = Self {
            time_grid: trajectory.times().to_vec(),
            compartments,
            meta,
        };
        debug_assert!(result.is_aligned());
        result
    }

    pub fn time_grid(&self) -> &[f64] {
        &self.time_grid
    }

    pub fn compartments(&self) -> &[Compartment] {
        &self.compartments
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.compartments.iter().map(|c| c.label.as_str())
    }

    pub fn compartment(&self, label: &str) -> Option<&[f64]> {
        self.compartments
            .iter()
            .find(|c| c.label == label)
            .map(|c| c.values.as_slice())
    }

    pub fn meta(&self) -> &Meta {
        &self.meta
    }

    pub fn meta_scalar(&self, name: &str) -> Option<f64> {
        self.meta.get(name).and_then(MetaValue::as_scalar)
    }

    pub fn meta_series(&self, name: &str) -> Option<&[f64]> {
        self.meta.get(name).and_then(MetaValue::as_series)
    }

    pub fn phases(&self) -> Option<&[EpidemicPhase]> {
        self.meta.get("state").and_then(MetaValue::as_phases)
    }

    /// Every time-indexed series has one entry per grid point.
    pub fn is_aligned(&self) -> bool {
        let len = self.time_grid.len();
        self.compartments.iter().all(|c| c.values.len() == len)
            && self
                .meta
                .values()
                .filter_map(MetaValue::series_len)
                .all(|l| l == len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_threshold_is_strict() {
        assert_eq!(EpidemicPhase::from_reproduction_number(1.2), EpidemicPhase::Growth);
        assert_eq!(EpidemicPhase::from_reproduction_number(1.0), EpidemicPhase::Decline);
    }

    #[test]
    fn meta_values_serialize_untagged() {
        let mut meta = Meta::new();
        meta.insert("R0".into(), MetaValue::Scalar(2.5));
        meta.insert("state".into(), MetaValue::Phases(vec![EpidemicPhase::Growth]));
        let json = serde_json::to_string(&meta).unwrap();
        assert_eq!(json, r#"{"R0":2.5,"state":["growth"]}"#);
    }
}

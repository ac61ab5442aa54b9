use crate::error::ParameterError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Named scalar parameters for one simulation request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ParameterSet {
    values: BTreeMap<String, f64>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, f64)>) -> Self {
        Self {
            values: pairs
                .into_iter()
                .map(|(name, value)| (name.to_string(), value))
                .collect(),
        }
    }

    /// Returns a copy with `name` set to `value`.
    pub fn with(mut self, name: &str, value: f64) -> Self {
        self.values.insert(name.to_string(), value);
        self
    }

    pub fn insert(&mut self, name: &str, value: f64) -> Option<f64> {
        self.values.insert(name.to_string(), value)
    }

    pub fn get(&self, name: &str) -> Result<f64, ParameterError> {
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| ParameterError::Mismatch {
                missing: vec![name.to_string()],
                unexpected: Vec::new(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Checks this set against a model schema.
    ///
    /// Names must match `required` exactly. Missing and unexpected names are
    /// reported together, each list sorted.
    pub fn validate<R, P>(&self, required: &[R], population: &[P]) -> Result<(), ParameterError>
    where
        R: AsRef<str>,
        P: AsRef<str>,
    {
        let mut missing: Vec<String> = required
            .iter()
            .map(AsRef::as_ref)
            .filter(|name| !self.values.contains_key(*name))
            .map(str::to_string)
            .collect();
        let unexpected: Vec<String> = self
            .values
            .keys()
            .filter(|name| !required.iter().any(|r| r.as_ref() == name.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            missing.sort();
            return Err(ParameterError::Mismatch {
                missing,
                unexpected,
            });
        }

        for (name, &value) in &self.values {
            if !value.is_finite() {
                return Err(ParameterError::NonFinite {
                    name: name.clone(),
                    value,
                });
            }
        }
        for name in population.iter().map(AsRef::as_ref) {
            if let Some(&value) = self.values.get(name) {
                if value < 0.0 {
                    return Err(ParameterError::NegativePopulation {
                        name: name.to_string(),
                        value,
                    });
                }
            }
        }
        Ok(())
    }
}

impl<'a> FromIterator<(&'a str, f64)> for ParameterSet {
    fn from_iter<I: IntoIterator<Item = (&'a str, f64)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

/// Reads `name` and checks it is strictly positive.
pub(crate) fn positive(params: &ParameterSet, name: &str) -> Result<f64, ParameterError> {
    let value = params.get(name)?;
    if value > 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::out_of_range(name, value, "must be positive"))
    }
}

/// Reads `name` and checks it is non-negative.
pub(crate) fn non_negative(params: &ParameterSet, name: &str) -> Result<f64, ParameterError> {
    let value = params.get(name)?;
    if value >= 0.0 {
        Ok(value)
    } else {
        Err(ParameterError::out_of_range(name, value, "must be non-negative"))
    }
}

/// Reads `name` and checks it lies in `[0, 1]`.
pub(crate) fn unit_interval(params: &ParameterSet, name: &str) -> Result<f64, ParameterError> {
    let value = params.get(name)?;
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(ParameterError::out_of_range(name, value, "must lie in [0, 1]"))
    }
}

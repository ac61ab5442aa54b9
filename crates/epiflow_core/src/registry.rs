use crate::error::{Result, SimulationError};
use crate::models::{sir, sirc_pf, sirp};
use crate::parameters::ParameterSet;
use crate::result::SimulationResult;
use crate::solvers::SolverSettings;
use crate::time_grid::TimeGrid;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;

pub type SimulateFn = fn(&ParameterSet, &TimeGrid, &SolverSettings) -> Result<SimulationResult>;

/// Tag telling an external renderer which layout fits a model's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentationProfile {
    Default,
    SirpDashboard,
    SircpDashboard,
}

/// Population-scale parameters every built-in model shares.
const POPULATION_PARAMETERS: &[&str] = &["N", "I0"];

/// Registration contract of one model variant. Immutable once built.
#[derive(Clone)]
pub struct ModelSpec {
    id: String,
    simulate: SimulateFn,
    required_parameters: Vec<String>,
    population_parameters: Vec<String>,
    compartment_labels: Vec<String>,
    presentation_profile: PresentationProfile,
    defaults: Option<fn() -> ParameterSet>,
}

impl ModelSpec {
    pub fn new(
        id: &str,
        simulate: SimulateFn,
        required_parameters: &[&str],
        compartment_labels: &[&str],
        presentation_profile: PresentationProfile,
    ) -> Self {
        Self {
            id: id.to_string(),
            simulate,
            required_parameters: required_parameters.iter().map(|s| s.to_string()).collect(),
            population_parameters: POPULATION_PARAMETERS
                .iter()
                .filter(|name| required_parameters.contains(*name))
                .map(|s| s.to_string())
                .collect(),
            compartment_labels: compartment_labels.iter().map(|s| s.to_string()).collect(),
            presentation_profile,
            defaults: None,
        }
    }

    pub fn with_population_parameters(mut self, names: &[&str]) -> Self {
        self.population_parameters = names.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_defaults(mut self, defaults: fn() -> ParameterSet) -> Self {
        self.defaults = Some(defaults);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn required_parameters(&self) -> &[String] {
        &self.required_parameters
    }

    pub fn population_parameters(&self) -> &[String] {
        &self.population_parameters
    }

    pub fn compartment_labels(&self) -> &[String] {
        &self.compartment_labels
    }

    pub fn presentation_profile(&self) -> PresentationProfile {
        self.presentation_profile
    }

    /// Literal default parameters of the variant, if it ships any.
    pub fn default_parameters(&self) -> Option<ParameterSet> {
        self.defaults.map(|defaults| defaults())
    }

    /// Validates `params` against the schema and runs the model on `grid`.
    pub fn simulate(
        &self,
        params: &ParameterSet,
        grid: &TimeGrid,
        settings: &SolverSettings,
    ) -> Result<SimulationResult> {
        params.validate(&self.required_parameters, &self.population_parameters)?;
        let result = (self.simulate)(params, grid, settings)?;
        if !result.labels().eq(self.compartment_labels.iter().map(String::as_str)) {
            return Err(SimulationError::LabelMismatch {
                model: self.id.clone(),
                expected: self.compartment_labels.clone(),
                actual: result.labels().map(str::to_string).collect(),
            });
        }
        Ok(result)
    }
}

impl fmt::Debug for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelSpec")
            .field("id", &self.id)
            .field("required_parameters", &self.required_parameters)
            .field("population_parameters", &self.population_parameters)
            .field("compartment_labels", &self.compartment_labels)
            .field("presentation_profile", &self.presentation_profile)
            .finish_non_exhaustive()
    }
}

/// Append-only catalog of model variants, looked up by id.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    specs: Vec<ModelSpec>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding SIR, SIRP and SIRC-PF, in that order.
    pub fn with_default_models() -> Result<Self> {
        let mut registry = Self::new();
        registry.register(sir::spec())?;
        registry.register(sirp::spec())?;
        registry.register(sirc_pf::spec())?;
        Ok(registry)
    }

    pub fn register(&mut self, spec: ModelSpec) -> Result<()> {
        if self.specs.iter().any(|s| s.id == spec.id) {
            return Err(SimulationError::DuplicateModel(spec.id));
        }
        debug!(
            "registered model '{}' ({} parameters, {} compartments)",
            spec.id,
            spec.required_parameters.len(),
            spec.compartment_labels.len()
        );
        self.specs.push(spec);
        Ok(())
    }

    pub fn lookup(&self, id: &str) -> Result<&ModelSpec> {
        self.specs
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| SimulationError::UnknownModel(id.to_string()))
    }

    /// Registered ids in registration order.
    pub fn list_ids(&self) -> Vec<&str> {
        self.specs.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn specs(&self) -> &[ModelSpec] {
        &self.specs
    }

    /// Drops every registration. Only meant for isolating tests.
    pub fn reset(&mut self) {
        self.specs.clear();
    }

    /// Runs `id` over `[0, horizon]` sampled at `sample_count` evenly spaced points.
    pub fn simulate(
        &self,
        id: &str,
        params: &ParameterSet,
        horizon: f64,
        sample_count: usize,
    ) -> Result<SimulationResult> {
        self.simulate_with(id, params, horizon, sample_count, &SolverSettings::default())
    }

    pub fn simulate_with(
        &self,
        id: &str,
        params: &ParameterSet,
        horizon: f64,
        sample_count: usize,
        settings: &SolverSettings,
    ) -> Result<SimulationResult> {
        let spec = self.lookup(id)?;
        let grid = TimeGrid::linspace(0.0, horizon, sample_count)?;
        debug!("simulating '{id}' to t = {horizon} with {sample_count} samples");
        spec.simulate(params, &grid, settings)
    }
}

use thiserror::Error;

/// Failures raised while validating a parameter set or sampling request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("parameter mismatch (missing: [{}], unexpected: [{}])", .missing.join(", "), .unexpected.join(", "))]
    Mismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    #[error("parameter '{name}' must be finite, got {value}")]
    NonFinite { name: String, value: f64 },
    #[error("population parameter '{name}' must be non-negative, got {value}")]
    NegativePopulation { name: String, value: f64 },
    #[error("parameter '{name}' = {value} is out of range: {reason}")]
    OutOfRange {
        name: String,
        value: f64,
        reason: &'static str,
    },
    #[error("horizon must be finite and greater than the start time {start}, got {horizon}")]
    InvalidHorizon { start: f64, horizon: f64 },
    #[error("sample_count must be at least 2, got {0}")]
    InvalidSampleCount(usize),
}

impl ParameterError {
    pub(crate) fn out_of_range(name: &str, value: f64, reason: &'static str) -> Self {
        Self::OutOfRange {
            name: name.to_string(),
            value,
            reason,
        }
    }
}

/// A derivative evaluation or an accepted step left the physically valid domain.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("state dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("state component {index} is not finite ({value}) at t = {t}")]
    NonFiniteState { index: usize, value: f64, t: f64 },
    #[error("derivative component {index} is not finite ({value}) at t = {t}")]
    NonFiniteDerivative { index: usize, value: f64, t: f64 },
    #[error("population component {index} became negative ({value}) at t = {t}")]
    NegativePopulation { index: usize, value: f64, t: f64 },
}

/// The solver could not honour its tolerance within its budget.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IntegrationError {
    #[error("exceeded max_steps = {max_steps} at t = {last_t} before reaching t = {target}")]
    StepBudgetExhausted {
        max_steps: usize,
        last_t: f64,
        target: f64,
    },
    #[error("step size {step} fell below min_step at t = {last_t}")]
    StepSizeUnderflow { step: f64, last_t: f64 },
    #[error("invalid solver settings: {0}")]
    InvalidSettings(&'static str),
}

impl IntegrationError {
    /// Last time the solver reached before failing, when there is one.
    pub fn last_time(&self) -> Option<f64> {
        match self {
            IntegrationError::StepBudgetExhausted { last_t, .. }
            | IntegrationError::StepSizeUnderflow { last_t, .. } => Some(*last_t),
            IntegrationError::InvalidSettings(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("model not found: {0}")]
    UnknownModel(String),
    #[error("model '{0}' is already registered")]
    DuplicateModel(String),
    #[error("model '{model}' produced compartments [{}], expected [{}]", .actual.join(", "), .expected.join(", "))]
    LabelMismatch {
        model: String,
        expected: Vec<String>,
        actual: Vec<String>,
    },
    #[error(transparent)]
    Parameter(#[from] ParameterError),
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Integration(#[from] IntegrationError),
}

pub type Result<T, E = SimulationError> = std::result::Result<T, E>;

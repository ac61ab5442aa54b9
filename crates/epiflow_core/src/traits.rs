use crate::error::DomainError;

/// A continuous-time compartmental system `dx/dt = f(t, x)`.
///
/// Parameters are bound into the implementing value, so `apply` must be a
/// pure function of `(t, x)`.
pub trait DynamicalSystem {
    /// Returns the dimension of the state space, hidden feedback variables included.
    fn dimension(&self) -> usize;

    /// Evaluates the vector field.
    /// x: current state
    /// t: current time
    /// out: buffer to write dx/dt
    fn apply(&self, t: f64, x: &[f64], out: &mut [f64]) -> Result<(), DomainError>;

    /// Whether component `index` must stay non-negative (populations, risk, fatigue).
    fn is_non_negative(&self, _index: usize) -> bool {
        true
    }
}

/// A solver that can step a system forward by a fixed `dt`.
pub trait Steppable {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    fn step(
        &mut self,
        system: &impl DynamicalSystem,
        t: &mut f64,
        state: &mut [f64],
        dt: f64,
    ) -> Result<(), DomainError>;
}

/// Runs `system.apply` and rejects non-finite inputs or outputs.
pub fn checked_apply(
    system: &impl DynamicalSystem,
    t: f64,
    x: &[f64],
    out: &mut [f64],
) -> Result<(), DomainError> {
    let dim = system.dimension();
    if x.len() != dim || out.len() != dim {
        return Err(DomainError::DimensionMismatch {
            expected: dim,
            actual: if x.len() != dim { x.len() } else { out.len() },
        });
    }
    if let Some((index, &value)) = x.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(DomainError::NonFiniteState { index, value, t });
    }
    system.apply(t, x, out)?;
    if let Some((index, &value)) = out.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(DomainError::NonFiniteDerivative { index, value, t });
    }
    Ok(())
}

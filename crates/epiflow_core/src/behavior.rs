//! Closed-form feedback relations shared by the derivative functions and the
//! derived-quantity post-processor. Both sides must call these, never inline
//! copies, so the sampled meta series match what the integrator saw.

/// New infections per unit time.
#[inline]
pub fn incidence(beta: f64, s: f64, i: f64, n: f64) -> f64 {
    beta * s * i / n
}

/// Compliance reached at perceived risk `p` under a ceiling, `ceiling·(1 − e^{−k·p})`.
#[inline]
pub fn compliance(ceiling: f64, k: f64, p: f64) -> f64 {
    -ceiling * (-k * p).exp_m1()
}

/// Transmission rate left after compliance, `beta_0·(1 − compliance)`.
#[inline]
pub fn effective_beta(beta_0: f64, compliance: f64) -> f64 {
    beta_0 * (1.0 - compliance)
}

/// Compliance ceiling eroded by fatigue `f ∈ [0, 1]` with strength `phi`.
#[inline]
pub fn fatigued_ceiling(compliance_max: f64, phi: f64, f: f64) -> f64 {
    compliance_max * (1.0 - phi * f)
}

/// `beta / gamma` for a single infectious compartment in a fully susceptible population.
#[inline]
pub fn basic_reproduction_number(beta: f64, gamma: f64) -> f64 {
    beta / gamma
}

#[inline]
pub fn effective_reproduction_number(beta_eff: f64, s: f64, n: f64, gamma: f64) -> f64 {
    beta_eff * s / (gamma * n)
}

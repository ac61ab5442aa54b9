pub mod behavior;
mod derived;
pub mod error;
pub mod models;
pub mod parameters;
pub mod registry;
pub mod result;
pub mod solvers;
pub mod time_grid;
/// The `epiflow_core` crate is the simulation engine behind the epiflow dashboards.
/// It integrates compartmental epidemic models with behavioral feedback and packages
/// their trajectories for external renderers.
///
/// Key components:
/// - **Traits**: `DynamicalSystem` (model vector fields), `Steppable` (fixed-step solvers).
/// - **Models**: SIR, SIRP (perceived risk + compliance) and SIRC-PF (adds reporting delay and fatigue).
/// - **Solvers**: Dormand–Prince 4(5) with error control, classic RK4 as a cross-check.
/// - **Registry**: `ModelRegistry` resolving model ids to their `ModelSpec` contract.
pub mod traits;

pub use error::{DomainError, IntegrationError, ParameterError, SimulationError};
pub use parameters::ParameterSet;
pub use registry::{ModelRegistry, ModelSpec, PresentationProfile};
pub use result::{EpidemicPhase, MetaValue, SimulationResult};
pub use solvers::{IntegratorMethod, SolverSettings};
pub use time_grid::TimeGrid;

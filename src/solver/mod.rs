//! Solver stages
//!
//! Density summation, DFSPH pressure projection and the step pipeline.

pub mod density;
pub mod dfsph;
pub mod integrate;

pub use density::compute_density_and_pressure;
pub use dfsph::DfsphProjector;
pub use integrate::{STEP_STAGES, Stage, step};

use crate::math::Real;

/// Per-step solver diagnostics. Counters, never errors: non-convergence and
/// recovered particles are surfaced here while the step completes
/// best-effort.
#[derive(Clone, Debug, Default)]
pub struct StepDiagnostics {
    /// Iterations taken by the constant-density solve, last step.
    pub density_iterations: u32,
    /// Iterations taken by the divergence-free solve, last step.
    pub divergence_iterations: u32,
    /// Final relative density residual, last step.
    pub density_error: Real,
    /// Final relative divergence residual, last step.
    pub divergence_error: Real,
    /// Per-iteration residuals of the constant-density solve, last step.
    pub density_errors: Vec<Real>,
    /// Times a DFSPH stage hit its iteration cap, cumulative.
    pub non_convergence_events: u64,
    /// Particles recovered by the post-step sanity scan, last step.
    pub failed_particles: u32,
    /// Particles dropped (lost positions or expired lifetime), cumulative.
    pub removed_particles: u64,
    /// Steps advanced since creation.
    pub steps: u64,
}

impl StepDiagnostics {
    pub(crate) fn begin_step(&mut self) {
        self.density_iterations = 0;
        self.divergence_iterations = 0;
        self.density_error = 0.0;
        self.divergence_error = 0.0;
        self.density_errors.clear();
        self.failed_particles = 0;
        self.steps += 1;
    }
}

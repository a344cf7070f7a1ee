//! DFSPH pressure projection
//!
//! Two-stage iterative corrector after Bender & Koschier: a constant-density
//! solve drives predicted density toward the rest density, then a
//! divergence-free solve drives the velocity divergence toward zero. Both
//! stages run Jacobi-style updates over precomputed per-particle alpha
//! factors and write velocity corrections directly (projection, not force
//! accumulation).
//!
//! Non-convergence is not an error: the solver exits with best-effort
//! pressures, logs a warning and bumps a diagnostics counter.

use bevy::prelude::*;
use rayon::prelude::*;

use crate::config::SimParams;
use crate::core::particle::Particle;
use crate::core::spatial_hash::Neighbor;
use crate::math::{Real, Vector, zero_vector};
use crate::solver::StepDiagnostics;

/// Under-relaxation of the Jacobi update. All particles correct
/// simultaneously, so the exact single-particle stiffness overshoots by up
/// to 2x on symmetric configurations.
const RELAXATION: Real = 0.5;

/// Minimum sweeps per stage before the tolerance check may stop the loop.
const MIN_DENSITY_ITERATIONS: u32 = 2;
const MIN_DIVERGENCE_ITERATIONS: u32 = 1;

/// Guard against degenerate alpha denominators (isolated particles).
const ALPHA_EPSILON: Real = 1e-6;

#[derive(Default)]
pub struct DfsphProjector {
    alpha: Vec<Real>,
    stiffness: Vec<Real>,
}

impl DfsphProjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run both solves. Velocity corrections are applied in place;
    /// accumulated forces are read only to predict the advected state.
    pub fn project(
        &mut self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        params: &SimParams,
        dt: Real,
        diagnostics: &mut StepDiagnostics,
    ) {
        if dt <= 0.0 || particles.is_empty() {
            return;
        }

        self.compute_alphas(particles, neighbors);

        let (iterations, error) =
            self.constant_density_solve(particles, neighbors, params, dt, diagnostics);
        diagnostics.density_iterations = iterations;
        diagnostics.density_error = error;
        if iterations >= params.max_pressure_iterations && error > params.density_tolerance {
            diagnostics.non_convergence_events += 1;
            warn!(
                "constant-density solve stopped at {iterations} iterations, \
                 residual {error:.2e}"
            );
        }

        let (iterations, error) = self.divergence_solve(particles, neighbors, params, dt);
        diagnostics.divergence_iterations = iterations;
        diagnostics.divergence_error = error;
        if iterations >= params.max_pressure_iterations && error > params.divergence_tolerance {
            diagnostics.non_convergence_events += 1;
            warn!(
                "divergence-free solve stopped at {iterations} iterations, \
                 residual {error:.2e}"
            );
        }
    }

    /// alpha_i = rho_i / (|sum_j m_j grad_ij|^2 + sum_j |m_j grad_ij|^2).
    /// Zero for particles without enough neighbor support; they receive no
    /// pressure correction.
    fn compute_alphas(&mut self, particles: &[Particle], neighbors: &[Vec<Neighbor>]) {
        self.alpha = particles
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let mut grad_sum = zero_vector();
                let mut grad_sq_sum = 0.0;
                for n in &neighbors[i] {
                    let weighted = particles[n.index].mass * n.gradient;
                    grad_sum += weighted;
                    grad_sq_sum += weighted.length_squared();
                }
                let denominator = grad_sum.length_squared() + grad_sq_sum;
                if denominator > ALPHA_EPSILON {
                    p.density / denominator
                } else {
                    0.0
                }
            })
            .collect();
    }

    /// Predicted velocity including the forces accumulated so far (external
    /// forces at this point of the step).
    fn predicted_velocity(p: &Particle, dt: Real) -> Vector {
        if p.is_boundary {
            zero_vector()
        } else {
            p.velocity + p.acceleration() * dt
        }
    }

    fn constant_density_solve(
        &mut self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        params: &SimParams,
        dt: Real,
        diagnostics: &mut StepDiagnostics,
    ) -> (u32, Real) {
        let rest = params.rest_density;
        let mut iterations = 0;

        loop {
            let snapshot: &[Particle] = particles;
            // Advected density from the current (already corrected)
            // velocities; only compression counts as error.
            let advected: Vec<Real> = snapshot
                .par_iter()
                .enumerate()
                .map(|(i, p)| {
                    let v_i = Self::predicted_velocity(p, dt);
                    let mut rate = 0.0;
                    for n in &neighbors[i] {
                        let q = &snapshot[n.index];
                        rate += q.mass * (v_i - Self::predicted_velocity(q, dt)).dot(n.gradient);
                    }
                    p.density + dt * rate
                })
                .collect();

            let error = average(
                snapshot
                    .iter()
                    .zip(&advected)
                    .filter(|(p, _)| !p.is_boundary)
                    .map(|(_, rho)| (rho - rest).max(0.0) / rest),
            );
            diagnostics.density_errors.push(error);

            if (iterations >= MIN_DENSITY_ITERATIONS && error < params.density_tolerance)
                || iterations >= params.max_pressure_iterations
            {
                return (iterations, error);
            }

            self.ensure_stiffness_len(particles.len());
            for (i, rho) in advected.iter().enumerate() {
                self.stiffness[i] = (self.alpha[i] * (rho - rest).max(0.0) / (dt * dt)) * RELAXATION;
            }
            self.apply_corrections(particles, neighbors, dt);
            iterations += 1;
        }
    }

    fn divergence_solve(
        &mut self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        params: &SimParams,
        dt: Real,
    ) -> (u32, Real) {
        let rest = params.rest_density;
        let mut iterations = 0;

        loop {
            let snapshot: &[Particle] = particles;
            // Material density change rate; positive means compression.
            let rates: Vec<Real> = snapshot
                .par_iter()
                .enumerate()
                .map(|(i, p)| {
                    let v_i = Self::predicted_velocity(p, dt);
                    let mut rate = 0.0;
                    for n in &neighbors[i] {
                        let q = &snapshot[n.index];
                        rate += q.mass * (v_i - Self::predicted_velocity(q, dt)).dot(n.gradient);
                    }
                    rate.max(0.0)
                })
                .collect();

            let error = average(
                snapshot
                    .iter()
                    .zip(&rates)
                    .filter(|(p, _)| !p.is_boundary)
                    .map(|(_, rate)| rate * dt / rest),
            );

            if (iterations >= MIN_DIVERGENCE_ITERATIONS && error < params.divergence_tolerance)
                || iterations >= params.max_pressure_iterations
            {
                return (iterations, error);
            }

            self.ensure_stiffness_len(particles.len());
            for (i, rate) in rates.iter().enumerate() {
                self.stiffness[i] = (self.alpha[i] * rate / dt) * RELAXATION;
            }
            self.apply_corrections(particles, neighbors, dt);
            iterations += 1;
        }
    }

    fn ensure_stiffness_len(&mut self, len: usize) {
        if self.stiffness.len() != len {
            self.stiffness.resize(len, 0.0);
        }
    }

    /// v_i -= dt * sum_j m_j (kappa_i / rho_i + kappa_j / rho_j) grad_ij
    fn apply_corrections(
        &self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        dt: Real,
    ) {
        let snapshot: &[Particle] = particles;
        let corrections: Vec<Vector> = snapshot
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                if p.is_boundary || p.density <= 0.0 {
                    return zero_vector();
                }
                let k_i = self.stiffness[i] / p.density;
                let mut delta = zero_vector();
                for n in &neighbors[i] {
                    let q = &snapshot[n.index];
                    if q.density <= 0.0 {
                        continue;
                    }
                    let k_j = self.stiffness[n.index] / q.density;
                    delta -= dt * q.mass * (k_i + k_j) * n.gradient;
                }
                delta
            })
            .collect();

        for (p, delta) in particles.iter_mut().zip(corrections) {
            p.velocity += delta;
        }
    }
}

fn average(values: impl Iterator<Item = Real>) -> Real {
    let mut sum = 0.0;
    let mut count = 0usize;
    for v in values {
        sum += v;
        count += 1;
    }
    if count > 0 { sum / count as Real } else { 0.0 }
}

//! Step pipeline and integration
//!
//! One step is a fixed, single-path stage sequence; every stage always
//! runs (a disabled effect contributes zero force through its own internal
//! check, not by skipping its stage). Integration is semi-implicit Euler;
//! the domain bounds clamp positions and damp the normal velocity
//! component.

use crate::core::particle::Particle;
use crate::core::sim_state::SimulationState;
use crate::config::SimParams;
use crate::effects::EffectKind;
use crate::math::{Real, zero_matrix, zero_vector};
use crate::solver::{StepDiagnostics, density};

/// The stages of one simulation step, in execution order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    ResetForces,
    BuildNeighbors,
    ComputeDensity,
    ProjectDfsph,
    ComputeViscosity,
    ComputeElasticity,
    Integrate,
    EnforceBoundary,
}

pub const STEP_STAGES: [Stage; 8] = [
    Stage::ResetForces,
    Stage::BuildNeighbors,
    Stage::ComputeDensity,
    Stage::ProjectDfsph,
    Stage::ComputeViscosity,
    Stage::ComputeElasticity,
    Stage::Integrate,
    Stage::EnforceBoundary,
];

/// Advance the state by `dt`. A step either completes every stage or (on a
/// non-positive dt / empty state) runs none of them; there is no partial
/// execution path.
pub fn step(state: &mut SimulationState, dt: Real) {
    if dt <= 0.0 || state.particles.is_empty() {
        return;
    }

    state.diagnostics.begin_step();
    for stage in STEP_STAGES {
        run_stage(state, stage, dt);
    }
    scan_health(&mut state.particles, &state.params, &mut state.diagnostics);
}

fn run_stage(state: &mut SimulationState, stage: Stage, dt: Real) {
    match stage {
        Stage::ResetForces => reset_forces(&mut state.particles, &state.params),
        Stage::BuildNeighbors => {
            state
                .spatial
                .rebuild(&state.particles, state.params.cell_size());
            state
                .spatial
                .build_neighbor_lists(&state.particles, state.params.smoothing_radius);
        }
        Stage::ComputeDensity => density::compute_density_and_pressure(
            &mut state.particles,
            state.spatial.neighbor_lists(),
            &state.params,
        ),
        Stage::ProjectDfsph => state.projector.project(
            &mut state.particles,
            state.spatial.neighbor_lists(),
            &state.params,
            dt,
            &mut state.diagnostics,
        ),
        Stage::ComputeViscosity => {
            for effect in &mut state.effects {
                if effect.kind() != EffectKind::Elasticity {
                    effect.compute_forces(
                        &mut state.particles,
                        state.spatial.neighbor_lists(),
                        &state.params,
                        dt,
                    );
                }
            }
        }
        Stage::ComputeElasticity => {
            for effect in &mut state.effects {
                if effect.kind() == EffectKind::Elasticity {
                    effect.compute_forces(
                        &mut state.particles,
                        state.spatial.neighbor_lists(),
                        &state.params,
                        dt,
                    );
                }
            }
        }
        Stage::Integrate => advance(&mut state.particles, dt),
        Stage::EnforceBoundary => enforce_boundary(&mut state.particles, &state.params),
    }
}

/// Reset the accumulator to the external (gravity) force.
fn reset_forces(particles: &mut [Particle], params: &SimParams) {
    for p in particles.iter_mut() {
        p.force = if p.is_boundary {
            zero_vector()
        } else {
            params.gravity * p.mass
        };
    }
}

/// Semi-implicit Euler: velocity first, then position from the new
/// velocity.
fn advance(particles: &mut [Particle], dt: Real) {
    for p in particles.iter_mut() {
        if p.is_boundary {
            continue;
        }
        p.velocity += p.acceleration() * dt;
        p.position += p.velocity * dt;
    }
}

fn enforce_boundary(particles: &mut [Particle], params: &SimParams) {
    let min = params.bounds_min;
    let max = params.bounds_max;
    let restitution = params.boundary_restitution;

    for p in particles.iter_mut() {
        if p.is_boundary {
            continue;
        }

        if p.position.x < min.x {
            p.position.x = min.x;
            if p.velocity.x < 0.0 {
                p.velocity.x = -p.velocity.x * restitution;
            }
        } else if p.position.x > max.x {
            p.position.x = max.x;
            if p.velocity.x > 0.0 {
                p.velocity.x = -p.velocity.x * restitution;
            }
        }

        if p.position.y < min.y {
            p.position.y = min.y;
            if p.velocity.y < 0.0 {
                p.velocity.y = -p.velocity.y * restitution;
            }
        } else if p.position.y > max.y {
            p.position.y = max.y;
            if p.velocity.y > 0.0 {
                p.velocity.y = -p.velocity.y * restitution;
            }
        }
    }
}

/// Post-step sanity scan. A particle with non-finite state has its velocity
/// and force discarded and its derived quantities restored; only a
/// non-finite position keeps the failed flag set, which removes the
/// particle at the step boundary.
fn scan_health(
    particles: &mut [Particle],
    params: &SimParams,
    diagnostics: &mut StepDiagnostics,
) {
    for p in particles.iter_mut() {
        p.update_health();
        if !p.failed {
            continue;
        }
        diagnostics.failed_particles += 1;

        p.velocity = zero_vector();
        p.force = zero_vector();
        if !p.density.is_finite() {
            p.density = params.rest_density;
        }
        if !p.pressure.is_finite() {
            p.pressure = 0.0;
        }
        if !crate::math::matrix_is_finite(&p.strain) {
            p.strain = zero_matrix();
        }
        if p.position.is_finite() && p.mass.is_finite() && p.mass > 0.0 {
            p.failed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vector;

    #[test]
    fn stage_order_is_fixed() {
        assert_eq!(STEP_STAGES[0], Stage::ResetForces);
        assert_eq!(STEP_STAGES[3], Stage::ProjectDfsph);
        assert_eq!(STEP_STAGES[7], Stage::EnforceBoundary);
    }

    #[test]
    fn semi_implicit_euler_order() {
        let mut particles =
            vec![Particle::new(Vector::new(0.0, 1.0)).with_velocity(Vector::ZERO)];
        particles[0].force = Vector::new(0.0, -9.8);

        advance(&mut particles, 0.01);

        // Position moves with the updated velocity, not the old one.
        assert!((particles[0].velocity.y + 0.098).abs() < 1e-6);
        assert!((particles[0].position.y - (1.0 + -0.098 * 0.01)).abs() < 1e-6);
    }

    #[test]
    fn boundary_clamps_and_zeroes_normal_velocity() {
        let params = SimParams {
            bounds_min: Vector::new(0.0, 0.0),
            bounds_max: Vector::new(1.0, 1.0),
            boundary_restitution: 0.0,
            ..SimParams::default()
        };
        let mut particles =
            vec![Particle::new(Vector::new(-0.1, 0.5)).with_velocity(Vector::new(-2.0, 1.0))];

        enforce_boundary(&mut particles, &params);

        assert_eq!(particles[0].position.x, 0.0);
        assert_eq!(particles[0].velocity.x, 0.0);
        // Tangential component untouched.
        assert_eq!(particles[0].velocity.y, 1.0);
    }

    #[test]
    fn boundary_restitution_reflects() {
        let params = SimParams {
            bounds_min: Vector::new(0.0, 0.0),
            bounds_max: Vector::new(1.0, 1.0),
            boundary_restitution: 0.5,
            ..SimParams::default()
        };
        let mut particles =
            vec![Particle::new(Vector::new(0.5, -0.2)).with_velocity(Vector::new(0.0, -4.0))];

        enforce_boundary(&mut particles, &params);

        assert_eq!(particles[0].position.y, 0.0);
        assert_eq!(particles[0].velocity.y, 2.0);
    }

    #[test]
    fn health_scan_discards_nan_velocity() {
        let params = SimParams::default();
        let mut diagnostics = StepDiagnostics::default();
        let mut particles = vec![Particle::new(Vector::ZERO)];
        particles[0].force = Vector::new(Real::NAN, 0.0);
        particles[0].velocity = Vector::new(Real::INFINITY, 0.0);

        scan_health(&mut particles, &params, &mut diagnostics);

        assert_eq!(diagnostics.failed_particles, 1);
        assert_eq!(particles[0].velocity, Vector::ZERO);
        assert_eq!(particles[0].force, Vector::ZERO);
        // Position stayed finite, so the particle was recovered in place.
        assert!(!particles[0].failed);
    }

    #[test]
    fn health_scan_keeps_failed_flag_for_lost_positions() {
        let params = SimParams::default();
        let mut diagnostics = StepDiagnostics::default();
        let mut particles = vec![Particle::new(Vector::new(Real::NAN, 0.0))];

        scan_health(&mut particles, &params, &mut diagnostics);

        assert!(particles[0].failed);
    }
}

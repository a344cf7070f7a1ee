//! Viscosity force models
//!
//! Three interchangeable models behind [`EffectForce`]:
//!
//! * [`ArtificialViscosity`] - pairwise damping of relative radial motion,
//!   with a separate coefficient for boundary neighbors.
//! * [`DfsphViscosity`] - implicit velocity diffusion solved by a short
//!   Jacobi iteration; stable at coefficients where the explicit pairwise
//!   model would blow up.
//! * [`XsphViscosity`] - kernel-weighted velocity smoothing.

use rayon::prelude::*;

use crate::config::SimParams;
use crate::core::particle::Particle;
use crate::core::spatial_hash::Neighbor;
use crate::effects::config::{EffectConfig, EffectKind};
use crate::effects::EffectForce;
use crate::math::{Real, Vector, zero_vector};

/// Softening of the 1/r² term, scaled by h².
const SEPARATION_EPSILON: Real = 0.01;

/// Jacobi sweeps of the implicit diffusion solve. The update is a convex
/// combination of neighbor velocities, so a fixed short iteration is enough.
const DIFFUSION_SWEEPS: usize = 15;

pub struct ArtificialViscosity {
    fluid_viscosity_coefficient: Real,
    boundary_viscosity_coefficient: Real,
}

impl ArtificialViscosity {
    pub fn new(fluid_viscosity_coefficient: Real, boundary_viscosity_coefficient: Real) -> Self {
        Self {
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        }
    }
}

impl EffectForce for ArtificialViscosity {
    fn kind(&self) -> EffectKind {
        EffectKind::ViscosityArtificial
    }

    fn reconfigure(&mut self, config: &EffectConfig) -> bool {
        if let EffectConfig::ViscosityArtificial {
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        } = *config
        {
            self.fluid_viscosity_coefficient = fluid_viscosity_coefficient;
            self.boundary_viscosity_coefficient = boundary_viscosity_coefficient;
            true
        } else {
            false
        }
    }

    fn compute_forces(
        &mut self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        params: &SimParams,
        _dt: Real,
    ) {
        if self.fluid_viscosity_coefficient == 0.0 && self.boundary_viscosity_coefficient == 0.0 {
            return;
        }

        let h2 = params.smoothing_radius * params.smoothing_radius;
        let softening = SEPARATION_EPSILON * h2;

        let snapshot: &[Particle] = particles;
        let forces: Vec<Vector> = snapshot
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                if p.is_boundary {
                    return zero_vector();
                }
                let mut force = zero_vector();
                for n in &neighbors[i] {
                    let q = &snapshot[n.index];
                    let nu = if q.is_boundary {
                        self.boundary_viscosity_coefficient
                    } else {
                        self.fluid_viscosity_coefficient
                    };
                    if nu == 0.0 {
                        continue;
                    }
                    let r_ij = p.position - q.position;
                    let v_ij = p.velocity - q.velocity;
                    let radial = v_ij.dot(r_ij) / (r_ij.length_squared() + softening);
                    // n.gradient points against r_ij, so this damps the
                    // relative radial motion.
                    force += nu * p.mass * q.mass * radial * n.gradient;
                }
                force
            })
            .collect();

        for (p, f) in particles.iter_mut().zip(forces) {
            p.force += f;
        }
    }
}

pub struct DfsphViscosity {
    fluid_viscosity_coefficient: Real,
}

impl DfsphViscosity {
    pub fn new(fluid_viscosity_coefficient: Real) -> Self {
        Self {
            fluid_viscosity_coefficient,
        }
    }
}

impl EffectForce for DfsphViscosity {
    fn kind(&self) -> EffectKind {
        EffectKind::ViscosityDfsph
    }

    fn reconfigure(&mut self, config: &EffectConfig) -> bool {
        if let EffectConfig::ViscosityDfsph {
            fluid_viscosity_coefficient,
        } = *config
        {
            self.fluid_viscosity_coefficient = fluid_viscosity_coefficient;
            true
        } else {
            false
        }
    }

    fn compute_forces(
        &mut self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        _params: &SimParams,
        dt: Real,
    ) {
        let nu = self.fluid_viscosity_coefficient;
        if nu == 0.0 || dt <= 0.0 {
            return;
        }

        // Solve (I - dt*nu*L) v_new = v implicitly: each Jacobi sweep moves
        // v_i toward the kernel-weighted neighbor average, a convex
        // combination that cannot overshoot.
        let snapshot: &[Particle] = particles;
        let initial: Vec<Vector> = snapshot.iter().map(|p| p.velocity).collect();
        let mut current = initial.clone();

        for _ in 0..DIFFUSION_SWEEPS {
            let next: Vec<Vector> = snapshot
                .par_iter()
                .enumerate()
                .map(|(i, p)| {
                    if p.is_boundary {
                        return initial[i];
                    }
                    let mut weighted = zero_vector();
                    let mut weight_sum = 0.0;
                    for n in &neighbors[i] {
                        let q = &snapshot[n.index];
                        if q.density <= 0.0 {
                            continue;
                        }
                        let a = dt * nu * (q.mass / q.density) * n.kernel;
                        weighted += a * current[n.index];
                        weight_sum += a;
                    }
                    (initial[i] + weighted) / (1.0 + weight_sum)
                })
                .collect();
            current = next;
        }

        for (i, p) in particles.iter_mut().enumerate() {
            if !p.is_boundary {
                p.force += p.mass * (current[i] - initial[i]) / dt;
            }
        }
    }
}

pub struct XsphViscosity {
    fluid_viscosity_coefficient: Real,
    boundary_viscosity_coefficient: Real,
}

impl XsphViscosity {
    pub fn new(fluid_viscosity_coefficient: Real, boundary_viscosity_coefficient: Real) -> Self {
        Self {
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        }
    }
}

impl EffectForce for XsphViscosity {
    fn kind(&self) -> EffectKind {
        EffectKind::ViscosityXsph
    }

    fn reconfigure(&mut self, config: &EffectConfig) -> bool {
        if let EffectConfig::ViscosityXsph {
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        } = *config
        {
            self.fluid_viscosity_coefficient = fluid_viscosity_coefficient;
            self.boundary_viscosity_coefficient = boundary_viscosity_coefficient;
            true
        } else {
            false
        }
    }

    fn compute_forces(
        &mut self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        _params: &SimParams,
        dt: Real,
    ) {
        if (self.fluid_viscosity_coefficient == 0.0 && self.boundary_viscosity_coefficient == 0.0)
            || dt <= 0.0
        {
            return;
        }

        let snapshot: &[Particle] = particles;
        let forces: Vec<Vector> = snapshot
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                if p.is_boundary {
                    return zero_vector();
                }
                let mut smoothing = zero_vector();
                for n in &neighbors[i] {
                    let q = &snapshot[n.index];
                    if q.density <= 0.0 {
                        continue;
                    }
                    let c = if q.is_boundary {
                        self.boundary_viscosity_coefficient
                    } else {
                        self.fluid_viscosity_coefficient
                    };
                    smoothing += c * (q.mass / q.density) * (q.velocity - p.velocity) * n.kernel;
                }
                // Expressed as a force so the stage composes with the
                // accumulator: integrating f/m * dt reproduces the velocity
                // smoothing.
                p.mass * smoothing / dt
            })
            .collect();

        for (p, f) in particles.iter_mut().zip(forces) {
            p.force += f;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::spatial_hash::SpatialHash;

    const H: Real = 0.2;

    fn pair(velocity_a: Vector, velocity_b: Vector) -> (Vec<Particle>, SpatialHash, SimParams) {
        let params = SimParams {
            smoothing_radius: H,
            ..SimParams::default()
        };
        let mut particles = vec![
            Particle::new(Vector::new(0.0, 0.0)).with_velocity(velocity_a),
            Particle::new(Vector::new(0.1, 0.0)).with_velocity(velocity_b),
        ];
        for p in &mut particles {
            p.density = params.rest_density;
        }
        let mut hash = SpatialHash::new();
        hash.rebuild(&particles, H);
        hash.build_neighbor_lists(&particles, H);
        (particles, hash, params)
    }

    #[test]
    fn artificial_zero_force_without_relative_velocity() {
        // At rest, and again in uniform translation.
        for v in [Vector::ZERO, Vector::new(3.0, -1.0)] {
            let (mut particles, hash, params) = pair(v, v);
            let mut effect = ArtificialViscosity::new(123.0, 55.0);
            effect.compute_forces(&mut particles, hash.neighbor_lists(), &params, 0.01);
            assert_eq!(particles[0].force, Vector::ZERO);
            assert_eq!(particles[1].force, Vector::ZERO);
        }
    }

    #[test]
    fn artificial_damps_approach_symmetrically() {
        let (mut particles, hash, params) = pair(Vector::new(1.0, 0.0), Vector::new(-1.0, 0.0));
        let mut effect = ArtificialViscosity::new(1.0, 0.0);
        effect.compute_forces(&mut particles, hash.neighbor_lists(), &params, 0.01);

        // Equal and opposite, pushing against the approach.
        assert!((particles[0].force + particles[1].force).length() < 1e-5);
        assert!(particles[0].force.x < 0.0);
        assert!(particles[1].force.x > 0.0);
    }

    #[test]
    fn artificial_uses_boundary_coefficient_for_boundary_neighbors() {
        let (mut particles, hash, params) = pair(Vector::new(1.0, 0.0), Vector::ZERO);
        particles[1].is_boundary = true;

        let mut effect = ArtificialViscosity::new(7.0, 0.0);
        effect.compute_forces(&mut particles, hash.neighbor_lists(), &params, 0.01);
        // Fluid coefficient does not apply against a boundary neighbor.
        assert_eq!(particles[0].force, Vector::ZERO);

        let mut effect = ArtificialViscosity::new(0.0, 7.0);
        effect.compute_forces(&mut particles, hash.neighbor_lists(), &params, 0.01);
        assert!(particles[0].force.length() > 0.0);
        // The boundary particle itself accumulates nothing.
        assert_eq!(particles[1].force, Vector::ZERO);
    }

    #[test]
    fn dfsph_diffusion_contracts_velocities() {
        let dt = 0.01;
        let (mut particles, hash, params) = pair(Vector::new(1.0, 0.0), Vector::new(-1.0, 0.0));
        let mut effect = DfsphViscosity::new(50.0);
        effect.compute_forces(&mut particles, hash.neighbor_lists(), &params, dt);

        // Applying f/m*dt must shrink the relative velocity without
        // overshooting through zero.
        let v0 = particles[0].velocity + particles[0].acceleration() * dt;
        let v1 = particles[1].velocity + particles[1].acceleration() * dt;
        let relative = (v0 - v1).x;
        assert!(relative < 2.0);
        assert!(relative >= 0.0, "overshot: {relative}");
    }

    #[test]
    fn dfsph_zero_force_at_rest() {
        let (mut particles, hash, params) = pair(Vector::ZERO, Vector::ZERO);
        let mut effect = DfsphViscosity::new(1000.0);
        effect.compute_forces(&mut particles, hash.neighbor_lists(), &params, 0.01);
        assert_eq!(particles[0].force, Vector::ZERO);
        assert_eq!(particles[1].force, Vector::ZERO);
    }

    #[test]
    fn xsph_smooths_and_conserves_momentum() {
        let dt = 0.01;
        let (mut particles, hash, params) = pair(Vector::new(1.0, 0.0), Vector::new(-1.0, 0.0));
        let mut effect = XsphViscosity::new(0.5, 0.0);
        effect.compute_forces(&mut particles, hash.neighbor_lists(), &params, dt);

        let impulse =
            particles[0].force * dt / particles[0].mass + particles[1].force * dt / particles[1].mass;
        assert!(impulse.length() < 1e-5, "momentum drift: {impulse}");
        // Velocities move toward each other.
        assert!(particles[0].force.x < 0.0);
        assert!(particles[1].force.x > 0.0);
    }
}

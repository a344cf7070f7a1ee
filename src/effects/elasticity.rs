//! Elastic force model
//!
//! Linear elasticity over a per-particle strain tensor. Strain is advanced
//! incrementally each step from the kernel-weighted velocity gradient; with
//! `nonlinear_strain` set, a Green-Lagrange correction replaces the pure
//! infinitesimal-strain rate. Stress follows the Lame form
//! sigma = lambda*tr(eps)*I + 2*mu*eps.
//!
//! Precondition: poisson_ratio < 0.5 (lambda diverges at 0.5). Enforced at
//! the configuration boundary, not here.

use rayon::prelude::*;

use crate::config::SimParams;
use crate::core::particle::Particle;
use crate::core::spatial_hash::Neighbor;
use crate::effects::config::{EffectConfig, EffectKind};
use crate::effects::EffectForce;
use crate::math::{
    Matrix, Real, Vector, identity_matrix, matrix_trace, outer_product, symmetric_part,
    zero_matrix, zero_vector,
};

/// Lame parameters (lambda, mu) from Young's modulus and Poisson ratio.
#[inline]
pub fn lame_lambda_mu(young_modulus: Real, poisson_ratio: Real) -> (Real, Real) {
    let lambda = young_modulus * poisson_ratio
        / ((1.0 + poisson_ratio) * (1.0 - 2.0 * poisson_ratio));
    let mu = young_modulus / (2.0 * (1.0 + poisson_ratio));
    (lambda, mu)
}

pub struct Elasticity {
    young_modulus: Real,
    poisson_ratio: Real,
    nonlinear_strain: bool,
    lambda: Real,
    mu: Real,
}

impl Elasticity {
    pub fn new(young_modulus: Real, poisson_ratio: Real, nonlinear_strain: bool) -> Self {
        let (lambda, mu) = lame_lambda_mu(young_modulus, poisson_ratio);
        Self {
            young_modulus,
            poisson_ratio,
            nonlinear_strain,
            lambda,
            mu,
        }
    }

    #[inline]
    fn stress(&self, strain: &Matrix) -> Matrix {
        identity_matrix() * (self.lambda * matrix_trace(strain)) + *strain * (2.0 * self.mu)
    }
}

impl EffectForce for Elasticity {
    fn kind(&self) -> EffectKind {
        EffectKind::Elasticity
    }

    fn reconfigure(&mut self, config: &EffectConfig) -> bool {
        if let EffectConfig::Elasticity {
            young_modulus,
            poisson_ratio,
            nonlinear_strain,
        } = *config
        {
            self.young_modulus = young_modulus;
            self.poisson_ratio = poisson_ratio;
            self.nonlinear_strain = nonlinear_strain;
            (self.lambda, self.mu) = lame_lambda_mu(young_modulus, poisson_ratio);
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
        if self.young_modulus == 0.0 {
            return;
        }

        // Strain rate from the SPH velocity gradient.
        let snapshot: &[Particle] = particles;
        let rates: Vec<Matrix> = snapshot
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let mut grad_v = zero_matrix();
                for n in &neighbors[i] {
                    let q = &snapshot[n.index];
                    if q.density <= 0.0 {
                        continue;
                    }
                    grad_v += outer_product((q.velocity - p.velocity) * (q.mass / q.density), n.gradient);
                }
                let mut rate = symmetric_part(&grad_v);
                if self.nonlinear_strain {
                    // Green-Lagrange rate: add the quadratic term.
                    rate += grad_v.transpose() * grad_v * 0.5;
                }
                rate
            })
            .collect();

        for (p, rate) in particles.iter_mut().zip(&rates) {
            p.strain += *rate * dt;
        }

        // Pairwise stress divergence against the kernel gradient.
        let snapshot: &[Particle] = particles;
        let stresses: Vec<Matrix> = snapshot
            .par_iter()
            .map(|p| {
                if p.density > 0.0 {
                    self.stress(&p.strain) * (1.0 / (p.density * p.density))
                } else {
                    zero_matrix()
                }
            })
            .collect();

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
                    force += (stresses[i] + stresses[n.index]) * n.gradient * (p.mass * q.mass);
                }
                force
            })
            .collect();

        for (p, f) in particles.iter_mut().zip(forces) {
            p.force += f;
        }
    }
}

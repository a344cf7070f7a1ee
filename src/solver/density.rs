//! Density and pressure from the kernel sum
//!
//! density_i = m_i * W(0) + sum_j m_j * W_ij, then pressure from the
//! equation of state. Density underflow near free surfaces is expected and
//! handled by the pressure clamp, never reported as an error.

use rayon::prelude::*;

use crate::config::SimParams;
use crate::core::particle::Particle;
use crate::core::spatial_hash::Neighbor;
use crate::math::Real;
use crate::core::kernel;

pub fn compute_density_and_pressure(
    particles: &mut [Particle],
    neighbors: &[Vec<Neighbor>],
    params: &SimParams,
) {
    let w_self = kernel::value(0.0, params.smoothing_radius);

    let snapshot: &[Particle] = particles;
    let results: Vec<(Real, Real)> = snapshot
        .par_iter()
        .enumerate()
        .map(|(i, p)| {
            let mut density = p.mass * w_self;
            for n in &neighbors[i] {
                density += snapshot[n.index].mass * n.kernel;
            }

            let mut pressure =
                params.eos_stiffness * (density / params.rest_density - 1.0);
            if !params.allow_negative_pressure {
                pressure = pressure.max(0.0);
            }
            (density, pressure)
        })
        .collect();

    for (p, (density, pressure)) in particles.iter_mut().zip(results) {
        p.density = density;
        p.pressure = pressure;
    }
}

use bevy::prelude::*;

use crate::config::constants::{
    DFSPH_MAX_ITERATIONS, DFSPH_TOLERANCE, EOS_STIFFNESS, GRAVITY, REST_DENSITY, SMOOTHING_RADIUS,
};
use crate::math::{Real, Vector};

/// Global parameters for one fluid instance.
///
/// Read-only during a step; mutate only between steps.
#[derive(Resource, Clone, Debug)]
pub struct SimParams {
    /// Smoothing kernel radius (h). Also the spatial-hash cell size.
    pub smoothing_radius: Real,

    /// Rest density of the fluid.
    pub rest_density: Real,

    /// Stiffness of the equation of state relating density to pressure.
    pub eos_stiffness: Real,

    /// Keep negative EOS pressures instead of clamping them to zero.
    /// Off by default; negative pressure near free surfaces causes clumping.
    pub allow_negative_pressure: bool,

    /// Gravity acceleration applied to every non-boundary particle.
    pub gravity: Vector,

    /// Domain bounds (min corner).
    pub bounds_min: Vector,

    /// Domain bounds (max corner).
    pub bounds_max: Vector,

    /// Coefficient applied to the reflected normal velocity at the bounds.
    /// 0.0 zeroes the normal component, 1.0 reflects it fully.
    pub boundary_restitution: Real,

    /// Iteration cap for each DFSPH stage.
    pub max_pressure_iterations: u32,

    /// Relative density error below which the constant-density solve stops.
    pub density_tolerance: Real,

    /// Relative divergence error below which the divergence-free solve stops.
    pub divergence_tolerance: Real,

    /// Seconds a particle lives before being recycled. Non-positive disables
    /// expiry.
    pub particle_lifetime: Real,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            smoothing_radius: SMOOTHING_RADIUS,
            rest_density: REST_DENSITY,
            eos_stiffness: EOS_STIFFNESS,
            allow_negative_pressure: false,
            gravity: GRAVITY,
            bounds_min: Vector::new(-5.0, 0.0),
            bounds_max: Vector::new(5.0, 10.0),
            boundary_restitution: 0.0,
            max_pressure_iterations: DFSPH_MAX_ITERATIONS,
            density_tolerance: DFSPH_TOLERANCE,
            divergence_tolerance: DFSPH_TOLERANCE,
            particle_lifetime: 0.0,
        }
    }
}

impl SimParams {
    /// Cell size for the spatial hash. A cell the size of the kernel support
    /// keeps the neighbor scan at a 3x3 block.
    pub fn cell_size(&self) -> Real {
        self.smoothing_radius
    }

    pub fn with_bounds(mut self, min: Vector, max: Vector) -> Self {
        self.bounds_min = min;
        self.bounds_max = max;
        self
    }

    pub fn with_gravity(mut self, gravity: Vector) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_lifetime(mut self, lifetime: Real) -> Self {
        self.particle_lifetime = lifetime;
        self
    }

    /// Mass giving a particle of the given spacing the rest density.
    pub fn particle_mass(&self, spacing: Real) -> Real {
        self.rest_density * spacing * spacing
    }
}

//! Fluid particles
//!
//! Particles carry position, velocity, mass and the per-step derived
//! quantities (density, pressure, accumulated force). The strain tensor
//! persists across steps and is advanced by the elasticity effect.

use crate::math::{Matrix, Real, Vector, matrix_is_finite, zero_matrix, zero_vector};

#[derive(Clone, Debug)]
pub struct Particle {
    pub position: Vector,
    pub velocity: Vector,
    pub mass: Real,

    /// Derived each step from the kernel sum over neighbors.
    pub density: Real,
    /// Derived each step from the equation of state.
    pub pressure: Real,
    /// Accumulated force, reset at the start of every step.
    pub force: Vector,
    /// Strain tensor advanced incrementally by the elasticity effect.
    pub strain: Matrix,

    /// Boundary particles are sampled from static geometry: they receive no
    /// integration and use the boundary viscosity coefficient.
    pub is_boundary: bool,

    /// Simulation time at which the particle was emitted, for lifetime
    /// expiry.
    pub spawned_at: Real,

    // Health tracking
    pub failed: bool,
}

impl Particle {
    pub fn zeroed() -> Self {
        Self {
            position: zero_vector(),
            velocity: zero_vector(),
            mass: 1.0,
            density: 0.0,
            pressure: 0.0,
            force: zero_vector(),
            strain: zero_matrix(),
            is_boundary: false,
            spawned_at: 0.0,
            failed: false,
        }
    }

    pub fn new(position: Vector) -> Self {
        Self {
            position,
            ..Self::zeroed()
        }
    }

    pub fn with_velocity(mut self, velocity: Vector) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_mass(mut self, mass: Real) -> Self {
        self.mass = mass;
        self
    }

    pub fn boundary(mut self) -> Self {
        self.is_boundary = true;
        self
    }

    #[inline(always)]
    pub fn acceleration(&self) -> Vector {
        if self.mass > 0.0 {
            self.force / self.mass
        } else {
            zero_vector()
        }
    }

    /// Mark the particle failed when any state became non-finite.
    ///
    /// Failed particles are recovered by the post-step scan (velocity and
    /// force discarded), never by aborting the step.
    #[inline(always)]
    pub fn update_health(&mut self) {
        if !self.position.is_finite()
            || !self.velocity.is_finite()
            || !self.force.is_finite()
            || !self.density.is_finite()
            || !self.pressure.is_finite()
            || !matrix_is_finite(&self.strain)
        {
            self.failed = true;
        }

        if !self.mass.is_finite() || self.mass <= 0.0 {
            self.failed = true;
        }
    }
}

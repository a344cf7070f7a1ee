// Physical constants for SPH simulation
use bevy::prelude::*;

// Global physics
pub const GRAVITY: Vec2 = Vec2::new(0.0, -9.81);

// Fluid material constants
pub const REST_DENSITY: f32 = 1000.0;
pub const SMOOTHING_RADIUS: f32 = 0.1;

// Equation of state parameters
pub const EOS_STIFFNESS: f32 = 200.0;

// DFSPH pressure solve limits
pub const DFSPH_MAX_ITERATIONS: u32 = 100;
pub const DFSPH_TOLERANCE: f32 = 1e-3;

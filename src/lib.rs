use bevy::prelude::*;

pub mod config;
pub mod core;
pub mod effects;
pub mod math;
pub mod solver;

// Public re-exports for clean API
pub use crate::config::{GRAVITY, SimParams};
pub use crate::core::{Particle, SimulationState};
pub use crate::effects::{ConfigError, EffectConfig, EffectKind};
pub use crate::solver::StepDiagnostics;

/// Steps a [`SimulationState`] resource once per frame. The simulation core
/// itself never touches ECS state; this plugin is the hosting seam for bevy
/// applications. Hosts that manage their own stepping can call
/// [`SimulationState::step`] directly instead.
pub struct SphPlugin {
    pub params: SimParams,
}

impl Default for SphPlugin {
    fn default() -> Self {
        Self {
            params: SimParams::default(),
        }
    }
}

impl Plugin for SphPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(SimulationState::new(self.params.clone()))
            .add_systems(Update, step_simulation);
    }
}

fn step_simulation(time: Res<Time>, mut state: ResMut<SimulationState>) {
    state.step(time.delta_secs());
}

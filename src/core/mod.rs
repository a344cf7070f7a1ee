pub mod kernel;
pub mod particle;
pub mod sim_state;
pub mod spatial_hash;

pub use particle::Particle;
pub use sim_state::SimulationState;
pub use spatial_hash::{Neighbor, SpatialHash};

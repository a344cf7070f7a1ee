//! Force effects
//!
//! Non-pressure force models layered on top of the pressure solve. Each
//! effect is configured by a tagged [`EffectConfig`] variant and dispatched
//! through the [`EffectForce`] capability trait:
//!
//! * `viscosity` - artificial, DFSPH (implicit) and XSPH variants
//! * `elasticity` - linear/nonlinear strain-stress forces
//! * `schema` - static property table for a host binding layer

pub mod config;
pub mod elasticity;
pub mod schema;
pub mod viscosity;

pub use config::{ConfigError, EffectConfig, EffectKind};
pub use elasticity::Elasticity;
pub use schema::{PROPERTY_SCHEMA, PropertyDef, PropertyValue, properties_for};
pub use viscosity::{ArtificialViscosity, DfsphViscosity, XsphViscosity};

use crate::config::SimParams;
use crate::core::particle::Particle;
use crate::core::spatial_hash::Neighbor;
use crate::math::Real;

/// Capability interface of a force effect.
///
/// `compute_forces` runs once per step, after the pressure projection, and
/// accumulates into each particle's force. An effect whose coefficients are
/// zero contributes zero force through its own internal check; the stage
/// itself always runs.
pub trait EffectForce: Send + Sync {
    fn kind(&self) -> EffectKind;

    /// Adopt new parameters. Returns false when the config targets a
    /// different effect kind (the caller then falls back to the registry).
    /// The config is validated before it gets here.
    fn reconfigure(&mut self, config: &EffectConfig) -> bool;

    fn compute_forces(
        &mut self,
        particles: &mut [Particle],
        neighbors: &[Vec<Neighbor>],
        params: &SimParams,
        dt: Real,
    );
}

/// Registry constructing the effect object for a configuration. This is the
/// only factory in the crate; there is no global mutable state behind it.
pub fn create_effect(config: &EffectConfig) -> Box<dyn EffectForce> {
    match *config {
        EffectConfig::Elasticity {
            young_modulus,
            poisson_ratio,
            nonlinear_strain,
        } => Box::new(Elasticity::new(young_modulus, poisson_ratio, nonlinear_strain)),
        EffectConfig::ViscosityArtificial {
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        } => Box::new(ArtificialViscosity::new(
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        )),
        EffectConfig::ViscosityDfsph {
            fluid_viscosity_coefficient,
        } => Box::new(DfsphViscosity::new(fluid_viscosity_coefficient)),
        EffectConfig::ViscosityXsph {
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        } => Box::new(XsphViscosity::new(
            fluid_viscosity_coefficient,
            boundary_viscosity_coefficient,
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_builds_matching_kind() {
        for kind in [
            EffectKind::Elasticity,
            EffectKind::ViscosityArtificial,
            EffectKind::ViscosityDfsph,
            EffectKind::ViscosityXsph,
        ] {
            let effect = create_effect(&EffectConfig::default_for(kind));
            assert_eq!(effect.kind(), kind);
        }
    }

    #[test]
    fn reconfigure_rejects_kind_mismatch() {
        let mut effect = create_effect(&EffectConfig::default_for(EffectKind::ViscosityDfsph));
        let other = EffectConfig::default_for(EffectKind::Elasticity);
        assert!(!effect.reconfigure(&other));
        assert_eq!(effect.kind(), EffectKind::ViscosityDfsph);
    }
}

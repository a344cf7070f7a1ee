//! Aggregate simulation state
//!
//! One [`SimulationState`] per fluid instance: the particle array, the
//! configured effect set, global parameters and solver scratch space.
//! Created on fluid instantiation, mutated every step, dropped on removal.
//! Independent instances share nothing and may step in parallel.

use bevy::prelude::*;

use crate::config::SimParams;
use crate::core::particle::Particle;
use crate::core::spatial_hash::SpatialHash;
use crate::effects::{ConfigError, EffectConfig, EffectForce, EffectKind, create_effect};
use crate::math::{Real, Vector};
use crate::solver::{DfsphProjector, StepDiagnostics, integrate};

#[derive(Resource)]
pub struct SimulationState {
    pub(crate) particles: Vec<Particle>,
    pub(crate) spatial: SpatialHash,
    pub(crate) effects: Vec<Box<dyn EffectForce>>,
    pub(crate) params: SimParams,
    pub(crate) projector: DfsphProjector,
    pub(crate) diagnostics: StepDiagnostics,
    pub(crate) time: Real,
}

impl Default for SimulationState {
    fn default() -> Self {
        Self::new(SimParams::default())
    }
}

impl SimulationState {
    pub fn new(params: SimParams) -> Self {
        Self {
            particles: Vec::new(),
            spatial: SpatialHash::new(),
            effects: Vec::new(),
            params,
            projector: DfsphProjector::new(),
            diagnostics: StepDiagnostics::default(),
            time: 0.0,
        }
    }

    /// Advance one step. Either every stage runs or none; on completion the
    /// post-step scan has recovered any non-finite particle state, and
    /// particles with lost positions or an expired lifetime are dropped.
    pub fn step(&mut self, dt: Real) {
        integrate::step(self, dt);
        if dt > 0.0 {
            self.time += dt;
        }
        self.recycle_particles();
    }

    /// Apply an effect configuration before the next step. An effect of the
    /// same kind is updated in place (the elasticity strain state carried by
    /// the particles is untouched); a new kind is built through the
    /// registry. Invalid configurations are rejected here and never reach
    /// the force computations.
    pub fn apply_config(&mut self, config: EffectConfig) -> Result<(), ConfigError> {
        config.validate()?;
        for effect in &mut self.effects {
            if effect.reconfigure(&config) {
                return Ok(());
            }
        }
        self.effects.push(create_effect(&config));
        Ok(())
    }

    pub fn clear_effects(&mut self) {
        self.effects.clear();
    }

    pub fn effect_kinds(&self) -> Vec<EffectKind> {
        self.effects.iter().map(|e| e.kind()).collect()
    }

    /// Index of the new particle. The spawn time is stamped for lifetime
    /// expiry.
    pub fn add_particle(&mut self, mut particle: Particle) -> usize {
        particle.spawned_at = self.time;
        self.particles.push(particle);
        self.particles.len() - 1
    }

    pub fn add_particles(&mut self, particles: impl IntoIterator<Item = Particle>) {
        for particle in particles {
            self.add_particle(particle);
        }
    }

    /// Remove the particles at `indices`. Out-of-range indices are ignored.
    pub fn remove_particles(&mut self, indices: &[usize]) {
        if indices.is_empty() {
            return;
        }
        let mut keep = vec![true; self.particles.len()];
        for &index in indices {
            if let Some(flag) = keep.get_mut(index) {
                *flag = false;
            }
        }
        self.retain_by_mask(&keep);
    }

    /// Drop particles whose position was lost to the sanity scan or whose
    /// lifetime expired.
    fn recycle_particles(&mut self) {
        let lifetime = self.params.particle_lifetime;
        let now = self.time;
        let keep: Vec<bool> = self
            .particles
            .iter()
            .map(|p| {
                !p.failed
                    && !(lifetime > 0.0 && !p.is_boundary && now - p.spawned_at >= lifetime)
            })
            .collect();
        self.retain_by_mask(&keep);
    }

    fn retain_by_mask(&mut self, keep: &[bool]) {
        let before = self.particles.len();
        let mut index = 0;
        self.particles.retain(|_| {
            let kept = keep[index];
            index += 1;
            kept
        });
        self.diagnostics.removed_particles += (before - self.particles.len()) as u64;
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut [Particle] {
        &mut self.particles
    }

    pub fn positions(&self) -> Vec<Vector> {
        self.particles.iter().map(|p| p.position).collect()
    }

    pub fn velocities(&self) -> Vec<Vector> {
        self.particles.iter().map(|p| p.velocity).collect()
    }

    /// Accelerations implied by the forces accumulated in the last step.
    pub fn accelerations(&self) -> Vec<Vector> {
        self.particles.iter().map(|p| p.acceleration()).collect()
    }

    pub fn params(&self) -> &SimParams {
        &self.params
    }

    pub fn params_mut(&mut self) -> &mut SimParams {
        &mut self.params
    }

    pub fn set_rest_density(&mut self, rest_density: Real) {
        self.params.rest_density = rest_density;
    }

    pub fn diagnostics(&self) -> &StepDiagnostics {
        &self.diagnostics
    }

    pub fn time(&self) -> Real {
        self.time
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::ConfigError;

    fn open_params() -> SimParams {
        SimParams {
            gravity: Vector::new(0.0, -9.8),
            bounds_min: Vector::new(-100.0, -100.0),
            bounds_max: Vector::new(100.0, 100.0),
            ..SimParams::default()
        }
    }

    #[test]
    fn single_particle_free_fall_step() {
        let mut state = SimulationState::new(open_params());
        state.add_particle(Particle::new(Vector::new(0.0, 0.0)).with_mass(1.0));

        let dt = 0.01;
        state.step(dt);

        let p = &state.particles()[0];
        assert!((p.velocity - Vector::new(0.0, -0.098)).length() < 1e-6);
        assert!((p.position - Vector::new(0.0, -0.098 * dt)).length() < 1e-7);
        assert!((state.accelerations()[0] - Vector::new(0.0, -9.8)).length() < 1e-5);
    }

    #[test]
    fn apply_config_rejects_invalid_and_keeps_effects_unchanged() {
        let mut state = SimulationState::default();
        let result = state.apply_config(EffectConfig::Elasticity {
            young_modulus: 100.0,
            poisson_ratio: 0.7,
            nonlinear_strain: false,
        });
        assert!(matches!(
            result,
            Err(ConfigError::PoissonRatioOutOfRange { .. })
        ));
        assert!(state.effect_kinds().is_empty());
    }

    #[test]
    fn apply_config_updates_existing_effect_in_place() {
        let mut state = SimulationState::default();
        state
            .apply_config(EffectConfig::default_for(EffectKind::ViscosityArtificial))
            .unwrap();
        state
            .apply_config(EffectConfig::ViscosityArtificial {
                fluid_viscosity_coefficient: 2.0,
                boundary_viscosity_coefficient: 0.5,
            })
            .unwrap();

        assert_eq!(
            state.effect_kinds(),
            vec![EffectKind::ViscosityArtificial]
        );
    }

    #[test]
    fn distinct_effect_kinds_coexist() {
        let mut state = SimulationState::default();
        state
            .apply_config(EffectConfig::default_for(EffectKind::ViscosityArtificial))
            .unwrap();
        state
            .apply_config(EffectConfig::default_for(EffectKind::Elasticity))
            .unwrap();
        assert_eq!(state.effect_kinds().len(), 2);
    }

    #[test]
    fn remove_particles_keeps_remaining_order() {
        let mut state = SimulationState::default();
        for x in 0..5 {
            state.add_particle(Particle::new(Vector::new(x as Real, 0.0)));
        }
        state.remove_particles(&[1, 3, 99]);

        let xs: Vec<Real> = state.particles().iter().map(|p| p.position.x).collect();
        assert_eq!(xs, vec![0.0, 2.0, 4.0]);
        assert_eq!(state.diagnostics().removed_particles, 2);
    }

    #[test]
    fn expired_particles_are_recycled() {
        let mut state = SimulationState::new(SimParams {
            particle_lifetime: 0.045,
            ..open_params()
        });
        state.add_particle(Particle::new(Vector::ZERO));

        for _ in 0..4 {
            state.step(0.01);
        }
        assert_eq!(state.particle_count(), 1);

        state.step(0.01);
        assert_eq!(state.particle_count(), 0);
        assert_eq!(state.diagnostics().removed_particles, 1);
    }

    #[test]
    fn set_rest_density_takes_effect() {
        let mut state = SimulationState::default();
        state.set_rest_density(500.0);
        assert_eq!(state.params().rest_density, 500.0);
    }

    #[test]
    fn boundary_particles_receive_no_integration() {
        let mut state = SimulationState::new(open_params());
        state.add_particle(Particle::new(Vector::new(0.0, 1.0)).boundary());
        for _ in 0..10 {
            state.step(0.01);
        }
        assert_eq!(state.particles()[0].position, Vector::new(0.0, 1.0));
        assert_eq!(state.particles()[0].velocity, Vector::ZERO);
    }

    #[test]
    fn zero_dt_step_is_a_no_op() {
        let mut state = SimulationState::new(open_params());
        state.add_particle(Particle::new(Vector::ZERO).with_velocity(Vector::new(1.0, 0.0)));
        state.step(0.0);
        assert_eq!(state.particles()[0].position, Vector::ZERO);
        assert_eq!(state.time(), 0.0);
    }
}

// Headless dam-break: a block of fluid collapses inside a box while the
// solver diagnostics are sampled to stdout.
use bevy::prelude::*;
use rand::Rng;
use sph2d::{EffectConfig, EffectKind, Particle, SimParams, SimulationState};

const COLUMNS: u32 = 30;
const ROWS: u32 = 60;
const STEPS: u32 = 600;
const SAMPLE_PERIOD: u32 = 60;

fn main() {
    let params = SimParams::default()
        .with_bounds(Vec2::new(0.0, 0.0), Vec2::new(4.0, 3.0))
        .with_gravity(Vec2::new(0.0, -9.81));
    let spacing = params.smoothing_radius * 0.5;
    let mass = params.particle_mass(spacing);

    let mut state = SimulationState::new(params);
    state
        .apply_config(EffectConfig::ViscosityArtificial {
            fluid_viscosity_coefficient: 0.05,
            boundary_viscosity_coefficient: 0.0,
        })
        .expect("valid viscosity config");
    state
        .apply_config(EffectConfig::default_for(EffectKind::ViscosityXsph))
        .expect("valid xsph config");

    let mut rand = rand::rng();
    for x in 0..COLUMNS {
        for y in 0..ROWS {
            let jitter = Vec2::new(
                rand.random_range(-0.01..=0.01),
                rand.random_range(-0.01..=0.01),
            ) * spacing;
            let position =
                Vec2::new(0.1 + x as f32 * spacing, 0.1 + y as f32 * spacing) + jitter;
            state.add_particle(Particle::new(position).with_mass(mass));
        }
    }

    println!(
        "dam break: {} particles, h = {}",
        state.particle_count(),
        state.params().smoothing_radius
    );

    let dt = 1.0 / 240.0;
    for step in 0..STEPS {
        state.step(dt);

        if step % SAMPLE_PERIOD == 0 {
            let particles = state.particles();
            let max_speed = particles
                .iter()
                .map(|p| p.velocity.length())
                .fold(0.0f32, f32::max);
            let avg_density =
                particles.iter().map(|p| p.density).sum::<f32>() / particles.len() as f32;
            let d = state.diagnostics();

            println!(
                "[step {:04}] speed_max={:.2} density_avg={:.1} \
                 pressure_iters={} divergence_iters={} failed={}",
                step,
                max_speed,
                avg_density,
                d.density_iterations,
                d.divergence_iterations,
                d.failed_particles,
            );
        }
    }

    let d = state.diagnostics();
    println!(
        "done: {} steps, {} non-convergence events, {} particles removed",
        d.steps, d.non_convergence_events, d.removed_particles
    );
}

//! tumble - headless physics demo
//!
//! Drops spheres and boxes onto a floor, keeps their visual proxies in sync,
//! and plays impact sounds through a logging audio sink.

use tumble::config::AppConfig;
use tumble::systems::{FrameClock, HeadlessRenderer, SimulationCommand, SimulationLoop};
use tumble_core::{LogAudioSink, SceneGraph, SpawnSpec};
use tumble_math::Vec3;

fn main() {
    // Load configuration before logging so the configured level applies
    let config = AppConfig::load().unwrap_or_else(|e| panic!("Invalid configuration: {}", e));

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(config.debug.log_level.as_str()))
        .init();
    log::info!("Starting tumble");

    let mut sim = SimulationLoop::from_config(&config)
        .unwrap_or_else(|e| panic!("Invalid simulation setup: {}", e));
    let mut scene = SceneGraph::new();
    let mut audio = LogAudioSink::new();
    let mut renderer = HeadlessRenderer::new();

    // Initial pool: the starter sphere at the center, then random objects
    if config.spawn.starter_radius > 0.0 {
        let ball = sim
            .world()
            .policy()
            .tag(&config.spawn.ball_material)
            .unwrap_or_else(|| panic!("Unknown ball material '{}'", config.spawn.ball_material));
        let spec = SpawnSpec::sphere(
            config.spawn.starter_radius,
            Vec3::new(0.0, config.spawn.spawn_height, 0.0),
            ball,
        )
        .with_mass(config.spawn.mass);
        if let Err(e) = sim.spawn(&mut scene, spec) {
            log::warn!("Starter sphere rejected: {}", e);
        }
    }
    for _ in 0..config.spawn.initial_spheres {
        let spec = sim.spawner_mut().random_sphere();
        if let Err(e) = sim.spawn(&mut scene, spec) {
            log::warn!("Initial sphere rejected: {}", e);
        }
    }
    for _ in 0..config.spawn.initial_boxes {
        let spec = sim.spawner_mut().random_box();
        if let Err(e) = sim.spawn(&mut scene, spec) {
            log::warn!("Initial box rejected: {}", e);
        }
    }

    let commands = sim.command_sender();
    let mut clock = FrameClock::new(config.run.target_fps);
    let mut frame: u64 = 0;

    loop {
        if config.run.frames > 0 && frame >= config.run.frames {
            break;
        }
        frame += 1;

        if config.run.spawn_every > 0 && frame % config.run.spawn_every == 0 {
            // Sending only fails once the loop is gone
            let _ = commands.send(SimulationCommand::Grow(1));
        }

        let report = sim.tick(clock.elapsed(), &mut scene, &mut audio, &mut renderer);
        if report.culled > 0 {
            log::info!("Frame {}: culled {}, {} live", report.frame, report.culled, report.live);
        }

        clock.wait_for_next_frame();
    }

    log::info!(
        "Finished after {} frames: {} live objects, {} asleep, {} sounds, {:.2}s simulated",
        sim.frame_count(),
        sim.registry().len(),
        sim.world().sleeping_count(),
        audio.plays(),
        sim.world().simulated_time()
    );
}

//! End-to-end tests for the frame loop
//!
//! Every test drives [`SimulationLoop`] with synthetic frame deltas through the
//! headless renderer, so results are deterministic.

use tumble::config::AppConfig;
use tumble::systems::{HeadlessRenderer, SimulationCommand, SimulationLoop};
use tumble_core::{AudioError, AudioSink, SceneGraph, SpawnSpec};
use tumble_math::Vec3;

const FRAME: f64 = 1.0 / 60.0;

#[derive(Default)]
struct RecordingSink {
    plays: Vec<(String, f32)>,
}

impl AudioSink for RecordingSink {
    fn play(&mut self, bank: &str, volume: f32) -> Result<(), AudioError> {
        self.plays.push((bank.to_string(), volume));
        Ok(())
    }
}

struct Run {
    sim: SimulationLoop,
    scene: SceneGraph,
    audio: RecordingSink,
    renderer: HeadlessRenderer,
}

impl Run {
    fn new() -> Self {
        Self::with_config(AppConfig::default())
    }

    fn with_config(config: AppConfig) -> Self {
        Self {
            sim: SimulationLoop::from_config(&config).expect("default config is valid"),
            scene: SceneGraph::new(),
            audio: RecordingSink::default(),
            renderer: HeadlessRenderer::new(),
        }
    }

    fn ball(&self, radius: f32, position: Vec3) -> SpawnSpec {
        let ball = self.sim.world().policy().tag("ball").unwrap();
        SpawnSpec::sphere(radius, position, ball)
    }

    fn frames(&mut self, n: usize) {
        for _ in 0..n {
            self.sim
                .advance(FRAME, &mut self.scene, &mut self.audio, &mut self.renderer);
            self.assert_consistent();
        }
    }

    /// Registry, world, scene and listeners agree on what exists
    fn assert_consistent(&self) {
        let registry = self.sim.registry();
        let world = self.sim.world();
        assert_eq!(registry.len(), self.scene.len());
        assert_eq!(registry.len(), world.body_count());
        assert_eq!(registry.len(), world.listener_count());
    }
}

#[test]
fn test_sphere_settles_at_radius() {
    let mut run = Run::new();
    let spec = run.ball(0.5, Vec3::new(0.0, 3.0, 0.0));
    let id = run.sim.spawn(&mut run.scene, spec).unwrap();

    run.frames(600);

    let proxy_key = run.sim.registry().get(id).expect("sphere is inside the arena").proxy;
    let proxy = run.scene.get(proxy_key).unwrap();
    assert!((proxy.position.y - 0.5).abs() < 0.02, "resting y = {}", proxy.position.y);

    let resting = proxy.position;
    run.frames(60);
    let proxy = run.scene.get(proxy_key).unwrap();
    assert_eq!(proxy.position, resting);
}

#[test]
fn test_bounce_sounds_within_bounds() {
    let mut run = Run::new();
    let spec = run.ball(0.5, Vec3::new(0.0, 3.0, 0.0));
    run.sim.spawn(&mut run.scene, spec).unwrap();

    run.frames(300);

    assert!(!run.audio.plays.is_empty(), "a dropped ball should make noise");
    for (bank, volume) in &run.audio.plays {
        assert_eq!(bank, "bounce");
        assert!(*volume > 0.0 && *volume <= 1.0);
    }
    // The first impact is the loudest
    let first = run.audio.plays[0].1;
    assert!(run.audio.plays.iter().all(|(_, v)| *v <= first + 1e-6));
}

#[test]
fn test_centered_body_is_never_culled() {
    let mut run = Run::new();
    let spec = run.ball(0.3, Vec3::new(0.0, 3.0, 0.0));
    let id = run.sim.spawn(&mut run.scene, spec).unwrap();

    for _ in 0..240 {
        run.frames(1);
        assert!(run.sim.registry().contains(id));
    }
}

#[test]
fn test_escaping_body_is_culled_with_despawn_cue() {
    let mut run = Run::new();
    let spec = run
        .ball(0.25, Vec3::new(4.5, 0.25, 0.0))
        .with_velocity(Vec3::new(4.0, 0.0, 0.0));
    let id = run.sim.spawn(&mut run.scene, spec).unwrap();
    let entry = run.sim.registry().get(id).unwrap().clone();

    let mut culled_frame = None;
    for frame in 0..60 {
        run.frames(1);
        if !run.sim.registry().contains(id) {
            culled_frame = Some(frame);
            break;
        }
        let x = run.sim.world().get_body(entry.body).unwrap().position.x;
        assert!(x <= 5.0, "body at x = {x} survived a frame");
    }

    assert!(culled_frame.is_some());
    assert!(!run.scene.contains(entry.proxy));
    assert!(run.sim.world().get_body(entry.body).is_none());
    let bubbles: Vec<_> = run.audio.plays.iter().filter(|(b, _)| b == "bubble").collect();
    assert_eq!(bubbles.len(), 1);
    assert_eq!(bubbles[0].1, 0.6);
}

#[test]
fn test_reset_is_idempotent() {
    let mut run = Run::new();
    let sender = run.sim.command_sender();
    sender.send(SimulationCommand::Grow(8)).unwrap();
    run.frames(30);
    assert!(!run.sim.registry().is_empty());

    sender.send(SimulationCommand::RemoveAll).unwrap();
    run.frames(1);
    let after_first = (run.sim.registry().len(), run.scene.len(), run.sim.world().body_count());

    sender.send(SimulationCommand::RemoveAll).unwrap();
    run.frames(1);
    let after_second = (run.sim.registry().len(), run.scene.len(), run.sim.world().body_count());

    assert_eq!(after_first, (0, 0, 0));
    assert_eq!(after_first, after_second);
}

#[test]
fn test_same_inputs_same_transforms() {
    let simulate = || {
        let mut config = AppConfig::default();
        config.spawn.seed = 1234;
        let mut run = Run::with_config(config);
        let sender = run.sim.command_sender();
        for round in 0..5 {
            sender.send(SimulationCommand::Grow(3)).unwrap();
            if round == 3 {
                sender.send(SimulationCommand::Shrink(2)).unwrap();
            }
            run.frames(40);
        }
        run.scene
            .iter()
            .map(|(_, proxy)| (proxy.position, proxy.orientation))
            .collect::<Vec<_>>()
    };

    let a = simulate();
    let b = simulate();
    assert!(!a.is_empty());
    assert_eq!(a, b);
}

#[test]
fn test_renderer_sees_every_frame() {
    let mut run = Run::new();
    let spec = run.ball(0.5, Vec3::new(0.0, 3.0, 0.0));
    run.sim.spawn(&mut run.scene, spec).unwrap();

    run.frames(10);

    assert_eq!(run.renderer.frames(), 10);
    assert_eq!(run.renderer.instance_bytes().len(), 48);
    assert_eq!(run.scene.dirty_count(), 0);
}
